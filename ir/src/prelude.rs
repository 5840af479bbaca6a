//! Common imports for building and transforming graphs.

pub use crate::activation::{ActivationFunction, ActivationKind};
pub use crate::decompositions::{Subgraph, decompose, decompose_graph};
pub use crate::error::{Error, Result};
pub use crate::fused::{FusedOp, LstmCell, LstmCellConfig, LstmCellInputs};
pub use crate::graph::Graph;
pub use crate::node::{Node, Output};
pub use crate::op::{Op, OpKind};
pub use crate::types::{BinaryOp, Literal, TensorType, UnaryOp};
pub use crate::Reduction;
pub use tessera_dtype::DType;
