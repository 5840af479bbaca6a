//! Native Rust scalars with a tensor element type.

use super::*;

/// Rust scalar whose values a `T::DTYPE` tensor element holds exactly.
pub trait HasDType: Copy + 'static {
    const DTYPE: DType;
}

macro_rules! has_dtype {
    ($($dtype:ident: $($ty:ty),+;)*) => {
        $($(impl HasDType for $ty {
            const DTYPE: DType = DType::$dtype;
        })+)*
    };
}

has_dtype! {
    Bool: bool;
    Int8: i8; Int16: i16; Int32: i32; Int64: i64;
    UInt8: u8; UInt16: u16; UInt32: u32; UInt64: u64;
    Float32: f32; Float64: f64;
}

#[cfg(feature = "half")]
has_dtype! {
    Float16: half::f16;
    BFloat16: half::bf16;
}

/// Element type of a slice of native scalars.
pub const fn dtype_of<T: HasDType>(_: &[T]) -> DType {
    T::DTYPE
}
