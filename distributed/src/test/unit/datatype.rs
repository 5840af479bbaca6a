//! Element type and reduction mapping tests.

use strum::IntoEnumIterator;
use tessera_dtype::DType;
use test_case::test_case;

use crate::Reduction;
use crate::datatype::{NativeOp, NativeType, collective_type, combine, native_op, point_to_point_type};
use crate::error::Error;

#[test_case(DType::Float32, NativeType::Float; "f32")]
#[test_case(DType::Float64, NativeType::Double; "f64")]
fn test_collective_type_supported(dtype: DType, expected: NativeType) {
    assert_eq!(collective_type("all_reduce", dtype).unwrap(), expected);
}

#[test_case(DType::Int32; "i32")]
#[test_case(DType::Float16; "f16")]
#[test_case(DType::BFloat16; "bf16")]
#[test_case(DType::Bool; "bool")]
#[test_case(DType::Dynamic; "dynamic")]
fn test_collective_type_unsupported(dtype: DType) {
    let err = collective_type("broadcast", dtype).unwrap_err();
    assert!(matches!(err, Error::UnsupportedElementType { operation: "broadcast", dtype: d } if d == dtype));
}

#[test_case(DType::Bool, NativeType::Byte; "bool")]
#[test_case(DType::Int8, NativeType::Byte; "i8")]
#[test_case(DType::Int16, NativeType::Short; "i16")]
#[test_case(DType::Int32, NativeType::Int; "i32")]
#[test_case(DType::Int64, NativeType::Long; "i64")]
#[test_case(DType::UInt8, NativeType::UnsignedChar; "u8")]
#[test_case(DType::UInt16, NativeType::UnsignedShort; "u16")]
#[test_case(DType::UInt32, NativeType::Unsigned; "u32")]
#[test_case(DType::UInt64, NativeType::UnsignedLong; "u64")]
#[test_case(DType::Float16, NativeType::Short; "f16")]
#[test_case(DType::BFloat16, NativeType::Short; "bf16")]
#[test_case(DType::Float32, NativeType::Float; "f32")]
#[test_case(DType::Float64, NativeType::Double; "f64")]
fn test_point_to_point_type(dtype: DType, expected: NativeType) {
    let native = point_to_point_type("send", dtype).unwrap();
    assert_eq!(native, expected);
    assert_eq!(native.size(), dtype.bytes());
}

#[test_case(DType::Dynamic; "dynamic")]
#[test_case(DType::Undefined; "undefined")]
fn test_point_to_point_rejects_placeholders(dtype: DType) {
    assert!(matches!(point_to_point_type("recv", dtype), Err(Error::UnsupportedElementType { .. })));
}

#[test]
fn test_every_reduction_has_native_op() {
    let ops: Vec<NativeOp> = Reduction::iter().map(native_op).collect();
    assert_eq!(ops, vec![NativeOp::Sum, NativeOp::Prod, NativeOp::Min, NativeOp::Max]);
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn f32_values(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect()
}

#[test_case(NativeOp::Sum, [4.0, -1.0, 5.0]; "sum")]
#[test_case(NativeOp::Prod, [3.0, -2.0, 6.0]; "prod")]
#[test_case(NativeOp::Min, [1.0, -2.0, 2.0]; "min")]
#[test_case(NativeOp::Max, [3.0, 1.0, 3.0]; "max")]
fn test_combine_f32(op: NativeOp, expected: [f32; 3]) {
    let mut acc = f32_bytes(&[1.0, -2.0, 3.0]);
    combine(NativeType::Float, op, &mut acc, &f32_bytes(&[3.0, 1.0, 2.0]));
    assert_eq!(f32_values(&acc), expected);
}

#[test]
fn test_combine_integers_wrap() {
    let mut acc = vec![250u8];
    combine(NativeType::UnsignedChar, NativeOp::Sum, &mut acc, &[10u8]);
    assert_eq!(acc, vec![4u8]);
}
