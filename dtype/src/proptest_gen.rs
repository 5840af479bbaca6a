use crate::*;
use proptest::prelude::*;

#[rustfmt::skip]
impl DType {
    pub fn int_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(Self::Int8), Just(Self::Int16), Just(Self::Int32), Just(Self::Int64),
            Just(Self::UInt8), Just(Self::UInt16), Just(Self::UInt32), Just(Self::UInt64)
        ]
    }

    pub fn float_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(Self::Float16), Just(Self::BFloat16), Just(Self::Float32), Just(Self::Float64)
        ]
    }

    /// Every type with a byte representation.
    pub fn static_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(Self::Bool),
            Self::int_generator(),
            Self::float_generator(),
        ]
    }
}
