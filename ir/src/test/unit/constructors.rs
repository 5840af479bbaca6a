//! Validated constructor tests.

use std::sync::Arc;

use tessera_dtype::DType;

use crate::error::Error;
use crate::{Literal, Op, OpKind, Output, Reduction};

fn param(index: usize, dtype: DType, shape: &[usize]) -> Output {
    Output::parameter(index, dtype, shape.iter().copied())
}

#[test]
fn test_binary_broadcasts() {
    let a = param(0, DType::Float32, &[2, 3]);
    let b = param(1, DType::Float32, &[3]);
    let sum = a.try_add(&b).unwrap();
    assert_eq!(sum.shape(), &[2, 3]);
    assert_eq!(sum.kind(), OpKind::Add);
}

#[test]
fn test_binary_dtype_mismatch() {
    let a = param(0, DType::Float32, &[2]);
    let b = param(1, DType::Float64, &[2]);
    assert!(matches!(a.try_mul(&b), Err(Error::DTypeMismatch { op: OpKind::Mul, .. })));
}

#[test]
fn test_binary_shape_mismatch() {
    let a = param(0, DType::Float32, &[2, 3]);
    let b = param(1, DType::Float32, &[2]);
    assert!(matches!(a.try_sub(&b), Err(Error::BroadcastShapeMismatch { .. })));
}

#[test]
fn test_transcendental_requires_float() {
    let a = param(0, DType::Int32, &[4]);
    assert!(matches!(a.try_exp(), Err(Error::InvalidDTypeForUnaryOp { .. })));
    assert!(a.try_neg().is_ok());
}

#[test]
fn test_dot_shapes() {
    let a = param(0, DType::Float32, &[2, 5]);
    let b = param(1, DType::Float32, &[5, 7]);
    assert_eq!(a.try_dot(&b).unwrap().shape(), &[2, 7]);
    assert!(matches!(b.try_dot(&a), Err(Error::DotShapeMismatch { .. })));
}

#[test]
fn test_transpose() {
    let a = param(0, DType::Float32, &[2, 5, 3]);
    assert_eq!(a.try_t().unwrap().shape(), &[3, 5, 2]);
    assert_eq!(a.try_transpose(&[0, 2, 1]).unwrap().shape(), &[2, 3, 5]);
    assert!(matches!(a.try_transpose(&[0, 1]), Err(Error::InvalidPermutation { rank: 3, .. })));
}

#[test]
fn test_slice() {
    let a = param(0, DType::Float32, &[2, 12]);
    let s = a.try_slice(&[0, 3], &[2, 6]).unwrap();
    assert_eq!(s.shape(), &[2, 3]);
    assert!(matches!(a.try_slice(&[0, 10], &[2, 13]), Err(Error::SliceOutOfBounds { dim: 1, .. })));
    assert!(matches!(a.try_slice(&[0], &[2]), Err(Error::SliceRankMismatch { expected: 2, actual: 1 })));
}

#[test]
fn test_reshape_and_concat() {
    let a = param(0, DType::Float32, &[2, 6]);
    assert_eq!(a.try_reshape([3, 4]).unwrap().shape(), &[3, 4]);
    assert!(matches!(a.try_reshape([5]), Err(Error::ReshapeSizeMismatch { input_size: 12, output_size: 5 })));

    let b = param(1, DType::Float32, &[2, 2]);
    assert_eq!(Output::try_concat(&[a.clone(), b], 1).unwrap().shape(), &[2, 8]);
    assert!(matches!(Output::try_concat(&[], 0), Err(Error::ConcatEmpty)));
    let c = param(2, DType::Float32, &[3, 6]);
    assert!(matches!(Output::try_concat(&[a, c], 1), Err(Error::ConcatMismatch { axis: 1, .. })));
}

#[test]
fn test_constants() {
    let dense = Output::constant(DType::Float32, [2, 2], Literal::Dense(Arc::from(vec![1.0, 2.0, 3.0, 4.0]))).unwrap();
    assert!(matches!(dense.node().op(), Op::Constant(Literal::Dense(_))));
    let short = Output::constant(DType::Float32, [2, 2], Literal::Dense(Arc::from(vec![1.0])));
    assert!(matches!(short, Err(Error::LiteralSizeMismatch { expected: 4, actual: 1 })));
    assert_eq!(Output::scalar(DType::Float64, 1.0).rank(), 0);
}

#[test]
fn test_clamp_range() {
    let a = param(0, DType::Float32, &[3]);
    assert!(a.try_clamp(-1.0, 1.0).is_ok());
    assert!(matches!(a.try_clamp(1.0, -1.0), Err(Error::InvalidClampRange { .. })));
}

#[test]
fn test_collectives_restrict_dtype() {
    let f = param(0, DType::Float64, &[4]);
    assert_eq!(f.try_all_reduce(Reduction::Sum).unwrap().kind(), OpKind::AllReduce);
    assert_eq!(f.try_broadcast_distributed(0).unwrap().kind(), OpKind::BroadcastDistributed);

    let i = param(1, DType::Int32, &[4]);
    assert!(matches!(i.try_all_reduce(Reduction::Max), Err(Error::InvalidDTypeForOp { op: OpKind::AllReduce, .. })));
    assert!(i.try_send(1).is_ok());
    assert!(i.try_recv(1).is_ok());

    let dynamic = param(2, DType::Dynamic, &[4]);
    assert!(matches!(dynamic.try_send(0), Err(Error::InvalidDTypeForOp { op: OpKind::Send, .. })));
}

#[test]
fn test_mvn_axes() {
    let a = param(0, DType::Float32, &[2, 3]);
    assert_eq!(a.try_mvn(&[1], true, 1e-9).unwrap().kind(), OpKind::Mvn);
    assert!(matches!(a.try_mvn(&[2], true, 1e-9), Err(Error::AxisOutOfRange { axis: 2, rank: 2 })));
}

#[test]
fn test_output_identity() {
    let a = param(0, DType::Float32, &[3]);
    let b = a.node().output(0);
    assert_eq!(a, b);
    assert_ne!(a, param(0, DType::Float32, &[3]));
}
