//! Error types for lowering.

use snafu::Snafu;
use tessera_dtype::DType;
use tessera_ir::OpKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// No converter is registered for the operator.
    #[snafu(display("Unsupported operation: {op}"))]
    UnsupportedOp { op: String },

    /// An operand was used before its producer was lowered. Indicates a
    /// traversal-order bug, not a user error.
    #[snafu(display("{op} (node {node}) uses output {index} of node {producer}, which has not been lowered"))]
    UnloweredOperand { op: OpKind, node: u64, producer: u64, index: usize },

    /// A converter returned without mapping every output of its node.
    #[snafu(display("converter for {op} left output {index} of node {node} unmapped"))]
    IncompleteConversion { op: OpKind, node: u64, index: usize },

    /// A converter mapped more values than its node has outputs.
    #[snafu(display("converter for {op} mapped {actual} values, but node {node} has {expected} outputs"))]
    ExcessResults { op: OpKind, node: u64, expected: usize, actual: usize },

    #[snafu(display("{op} requires a distributed context, but none was provided"))]
    MissingDistributedContext { op: OpKind },

    #[snafu(display("element type {dtype} has no target representation"))]
    UnsupportedType { dtype: DType },

    /// Function arguments must be declared in index order.
    #[snafu(display("argument {index} declared out of order, expected argument {expected}"))]
    ArgumentOrder { index: usize, expected: usize },

    #[snafu(display("IR error: {source}"))]
    Ir { source: tessera_ir::Error },
}
