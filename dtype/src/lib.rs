//! Element types for tensors flowing through tessera graphs.
//!
//! A [`DType`] describes the scalar element stored in a tensor. Besides the
//! concrete numeric types it carries two placeholder types, [`DType::Dynamic`]
//! and [`DType::Undefined`], which upstream graph builders use before types are
//! resolved. Neither has a byte representation, so anything that moves data
//! (transports, interpreters) must reject them.

pub mod ext;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


pub use ext::HasDType;

/// Tensor element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray, strum::Display, strum::EnumString, strum::AsRefStr)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    #[strum(to_string = "boolean")]
    Bool,

    #[strum(to_string = "i8")]
    Int8,
    #[strum(to_string = "i16")]
    Int16,
    #[strum(to_string = "i32")]
    Int32,
    #[strum(to_string = "i64")]
    Int64,

    #[strum(to_string = "u8")]
    UInt8,
    #[strum(to_string = "u16")]
    UInt16,
    #[strum(to_string = "u32")]
    UInt32,
    #[strum(to_string = "u64")]
    UInt64,

    #[strum(to_string = "f16")]
    Float16,
    #[strum(to_string = "bf16")]
    BFloat16,
    #[strum(to_string = "f32")]
    Float32,
    #[strum(to_string = "f64")]
    Float64,

    /// Element type not known until runtime.
    #[strum(to_string = "dynamic")]
    Dynamic,
    /// Element type never assigned.
    #[strum(to_string = "undefined")]
    Undefined,
}

impl DType {
    /// Size of one element in bytes. Placeholder types have no storage.
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
            Self::UInt64 => 8,
            Self::Float16 => 2,
            Self::BFloat16 => 2,
            Self::Float32 => 4,
            Self::Float64 => 8,
            Self::Dynamic | Self::Undefined => 0,
        }
    }

    pub const fn bitwidth(&self) -> usize {
        match self {
            Self::Bool => 1,
            other => other.bytes() * 8,
        }
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Whether the type has a concrete in-memory representation.
    pub const fn is_static(&self) -> bool {
        !matches!(self, Self::Dynamic | Self::Undefined)
    }
}
