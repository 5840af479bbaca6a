//! Error types for graph execution.

use snafu::Snafu;
use tessera_dtype::DType;
use tessera_ir::{OpKind, TensorType};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("host tensors need a static element type, got {dtype}"))]
    UnsupportedDType { dtype: DType },

    #[snafu(display("tensor of type {ty} needs {expected} elements, got {actual}"))]
    DataLength { ty: TensorType, expected: usize, actual: usize },

    #[snafu(display("{dtype} tensor of {expected} bytes built from {actual} bytes"))]
    ByteLength { dtype: DType, expected: usize, actual: usize },

    #[snafu(display("graph takes {expected} inputs, got {actual}"))]
    InputCount { expected: usize, actual: usize },

    #[snafu(display("input {index} must be {expected}, got {actual}"))]
    InputMismatch { index: usize, expected: TensorType, actual: TensorType },

    /// A parameter node reachable from the results is not among the graph's
    /// declared parameters.
    #[snafu(display("parameter {index} is not bound to an input"))]
    UnboundParameter { index: usize },

    /// Traversal-order bug: an operand was read before it was computed.
    #[snafu(display("output {index} of node {node} has not been evaluated"))]
    MissingValue { node: u64, index: usize },

    #[snafu(display("{op} is a fused operator; decompose the graph before running it"))]
    RequiresDecomposition { op: OpKind },

    #[snafu(display("{op} requires a distributed context, but none was provided"))]
    MissingDistributedContext { op: OpKind },

    #[snafu(display("Distributed error: {source}"))]
    Distributed { source: tessera_distributed::Error },
}
