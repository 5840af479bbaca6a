use snafu::Snafu;
use tessera_dtype::DType;

use crate::op::OpKind;
use crate::shape::Shape;
use crate::types::{TensorType, UnaryOp};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Operands of an elementwise operation disagree on element type.
    #[snafu(display("dtype mismatch: cannot perform {op} on {lhs} and {rhs}"))]
    DTypeMismatch { op: OpKind, lhs: DType, rhs: DType },

    #[snafu(display("invalid dtype for operation: operation {operation}; dtype {dtype}"))]
    InvalidDTypeForUnaryOp { operation: UnaryOp, dtype: DType },

    #[snafu(display("{op} does not support element type {dtype}"))]
    InvalidDTypeForOp { op: OpKind, dtype: DType },

    #[snafu(display("cannot broadcast shapes {lhs:?} and {rhs:?}"))]
    BroadcastShapeMismatch { lhs: Shape, rhs: Shape },

    #[snafu(display("dot expects [m, k] x [k, n] operands, got {lhs:?} and {rhs:?}"))]
    DotShapeMismatch { lhs: Shape, rhs: Shape },

    #[snafu(display("invalid permutation {permutation:?}: expected permutation of 0..{rank}"))]
    InvalidPermutation { permutation: Vec<usize>, rank: usize },

    #[snafu(display("reshape size mismatch: input size {input_size} != output size {output_size}"))]
    ReshapeSizeMismatch { input_size: usize, output_size: usize },

    #[snafu(display("slice expects {expected} bounds per side, got {actual}"))]
    SliceRankMismatch { expected: usize, actual: usize },

    #[snafu(display("slice bounds violation: dimension {dim} has range [{begin}, {end}) but size is {size}"))]
    SliceOutOfBounds { dim: usize, begin: usize, end: usize, size: usize },

    #[snafu(display("concat requires at least one operand"))]
    ConcatEmpty,

    #[snafu(display("concat along axis {axis}: incompatible operand types {lhs} and {rhs}"))]
    ConcatMismatch { axis: usize, lhs: TensorType, rhs: TensorType },

    #[snafu(display("axis {axis} is out of range for rank {rank}"))]
    AxisOutOfRange { axis: usize, rank: usize },

    #[snafu(display("invalid clamp range [{min}, {max}]"))]
    InvalidClampRange { min: f64, max: f64 },

    #[snafu(display("literal holds {actual} values but the shape requires {expected}"))]
    LiteralSizeMismatch { expected: usize, actual: usize },

    #[snafu(display("expected {expected} activation functions, got {actual}"))]
    ActivationCount { expected: usize, actual: usize },

    #[snafu(display("unknown activation function '{name}'"))]
    UnknownActivation { name: String },

    #[snafu(display("clip must be non-negative, got {clip}"))]
    NegativeClip { clip: f32 },

    #[snafu(display("{op}: hidden size must be positive"))]
    InvalidHiddenSize { op: OpKind },

    #[snafu(display("{op}: input {input} must have rank {expected}, got {actual}"))]
    InputRankMismatch { op: OpKind, input: &'static str, expected: usize, actual: usize },

    #[snafu(display("{op}: input {input} must have shape {expected:?}, got {actual:?}"))]
    InputShapeMismatch { op: OpKind, input: &'static str, expected: Shape, actual: Shape },

    #[snafu(display("{op}: input {input} must have element type {expected}, got {actual}"))]
    InputDTypeMismatch { op: OpKind, input: &'static str, expected: DType, actual: DType },

    #[snafu(display("{op} expects {expected} inputs, got {actual}"))]
    InputCountMismatch { op: OpKind, expected: usize, actual: usize },

    #[snafu(display("graph parameter at position {position} is {op}, expected Parameter {position}"))]
    InvalidParameter { position: usize, op: OpKind },

    #[snafu(display("{op} is not a fused operator"))]
    NotFused { op: OpKind },

    /// Internal invariant: a decomposition changed the type of an output.
    #[snafu(display("{op} decomposition output {index} has type {actual}, expected {expected}"))]
    DecompositionTypeMismatch { op: OpKind, index: usize, expected: TensorType, actual: TensorType },
}
