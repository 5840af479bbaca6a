//! Mapping from tessera element types to the wire types a transport understands.
//!
//! Both tables are exhaustive over [`DType`] so that adding an element type is
//! a compile error here until its wire representation is decided.

use snafu::OptionExt;
use tessera_dtype::DType;

use crate::Reduction;
use crate::error::{Result, UnsupportedElementTypeSnafu};

/// Element type as seen by a message-passing transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum NativeType {
    Byte,
    Short,
    Int,
    Long,
    UnsignedChar,
    UnsignedShort,
    Unsigned,
    UnsignedLong,
    Float,
    Double,
}

impl NativeType {
    pub const fn size(&self) -> usize {
        match self {
            Self::Byte | Self::UnsignedChar => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::Unsigned | Self::Float => 4,
            Self::Long | Self::UnsignedLong | Self::Double => 8,
        }
    }
}

/// Reduction operator as seen by a message-passing transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum NativeOp {
    Sum,
    Prod,
    Min,
    Max,
}

pub const fn native_op(reduction: Reduction) -> NativeOp {
    match reduction {
        Reduction::Sum => NativeOp::Sum,
        Reduction::Prod => NativeOp::Prod,
        Reduction::Min => NativeOp::Min,
        Reduction::Max => NativeOp::Max,
    }
}

/// Wire type for reductions and broadcasts. Only `f32` and `f64` are supported.
pub fn collective_type(operation: &'static str, dtype: DType) -> Result<NativeType> {
    let native = match dtype {
        DType::Float32 => Some(NativeType::Float),
        DType::Float64 => Some(NativeType::Double),
        DType::Bool
        | DType::Int8
        | DType::Int16
        | DType::Int32
        | DType::Int64
        | DType::UInt8
        | DType::UInt16
        | DType::UInt32
        | DType::UInt64
        | DType::Float16
        | DType::BFloat16
        | DType::Dynamic
        | DType::Undefined => None,
    };
    native.context(UnsupportedElementTypeSnafu { operation, dtype })
}

/// Wire type for point-to-point transfers.
///
/// Half precision types travel as 16-bit integers: the payload is moved bit
/// for bit and never interpreted by the transport.
pub fn point_to_point_type(operation: &'static str, dtype: DType) -> Result<NativeType> {
    let native = match dtype {
        DType::Bool | DType::Int8 => Some(NativeType::Byte),
        DType::Int16 => Some(NativeType::Short),
        DType::Int32 => Some(NativeType::Int),
        DType::Int64 => Some(NativeType::Long),
        DType::UInt8 => Some(NativeType::UnsignedChar),
        DType::UInt16 => Some(NativeType::UnsignedShort),
        DType::UInt32 => Some(NativeType::Unsigned),
        DType::UInt64 => Some(NativeType::UnsignedLong),
        DType::Float16 | DType::BFloat16 => Some(NativeType::Short),
        DType::Float32 => Some(NativeType::Float),
        DType::Float64 => Some(NativeType::Double),
        DType::Dynamic | DType::Undefined => None,
    };
    native.context(UnsupportedElementTypeSnafu { operation, dtype })
}

trait Element: Copy {
    const WIDTH: usize;

    fn read(bytes: &[u8]) -> Self;
    fn write(self, bytes: &mut [u8]);
    fn sum(self, rhs: Self) -> Self;
    fn prod(self, rhs: Self) -> Self;
    fn min(self, rhs: Self) -> Self;
    fn max(self, rhs: Self) -> Self;
}

macro_rules! int_element {
    ($($ty:ty),*) => {$(
        impl Element for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }

            fn write(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }

            fn sum(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
            fn prod(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            fn min(self, rhs: Self) -> Self { Ord::min(self, rhs) }
            fn max(self, rhs: Self) -> Self { Ord::max(self, rhs) }
        }
    )*};
}

macro_rules! float_element {
    ($($ty:ty),*) => {$(
        impl Element for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }

            fn write(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }

            fn sum(self, rhs: Self) -> Self { self + rhs }
            fn prod(self, rhs: Self) -> Self { self * rhs }
            fn min(self, rhs: Self) -> Self { <$ty>::min(self, rhs) }
            fn max(self, rhs: Self) -> Self { <$ty>::max(self, rhs) }
        }
    )*};
}

int_element!(i8, i16, i32, i64, u8, u16, u32, u64);
float_element!(f32, f64);

fn combine_as<E: Element>(op: NativeOp, acc: &mut [u8], incoming: &[u8]) {
    for (lhs, rhs) in acc.chunks_exact_mut(E::WIDTH).zip(incoming.chunks_exact(E::WIDTH)) {
        let (a, b) = (E::read(lhs), E::read(rhs));
        let value = match op {
            NativeOp::Sum => a.sum(b),
            NativeOp::Prod => a.prod(b),
            NativeOp::Min => a.min(b),
            NativeOp::Max => a.max(b),
        };
        value.write(lhs);
    }
}

/// Folds `incoming` into `acc` element by element.
///
/// Both slices hold whole elements of `ty`; trailing bytes are ignored.
pub fn combine(ty: NativeType, op: NativeOp, acc: &mut [u8], incoming: &[u8]) {
    match ty {
        NativeType::Byte => combine_as::<i8>(op, acc, incoming),
        NativeType::Short => combine_as::<i16>(op, acc, incoming),
        NativeType::Int => combine_as::<i32>(op, acc, incoming),
        NativeType::Long => combine_as::<i64>(op, acc, incoming),
        NativeType::UnsignedChar => combine_as::<u8>(op, acc, incoming),
        NativeType::UnsignedShort => combine_as::<u16>(op, acc, incoming),
        NativeType::Unsigned => combine_as::<u32>(op, acc, incoming),
        NativeType::UnsignedLong => combine_as::<u64>(op, acc, incoming),
        NativeType::Float => combine_as::<f32>(op, acc, incoming),
        NativeType::Double => combine_as::<f64>(op, acc, incoming),
    }
}
