//! Intermediate representation for tessera graphs.
//!
//! # Module Organization
//!
//! - [`node`] - Graph nodes, output references and validated constructors
//! - [`op`] - Operation enum and the flat [`OpKind`] identity tag
//! - [`fused`] - Composite operators (LSTM cell) awaiting decomposition
//! - [`decompositions`] - Rewrites of fused operators into primitives
//! - [`activation`] - Named nonlinearities used by recurrent cells
//! - [`graph`] - Parameter/result container with traversal helpers
//! - [`shape`] - Static shapes and broadcasting

pub mod activation;
pub mod decompositions;
pub mod error;
pub mod fused;
pub mod graph;
pub mod node;
pub mod op;
pub mod prelude;
pub mod shape;
pub mod types;


pub use error::{Error, Result};
pub use graph::Graph;
pub use node::{Node, Output};
pub use op::{Op, OpKind};
pub use tessera_distributed::Reduction;
pub use types::{BinaryOp, Literal, TensorType, UnaryOp};
