//! Host execution of tessera graphs.
//!
//! [`Interpreter`] evaluates primitive graphs over [`HostTensor`]s. It is the
//! numeric reference for decompositions: a fused graph and its decomposition
//! are compared by running the decomposed form against a closed-form
//! implementation.

pub mod error;
pub mod interpreter;
pub mod kernels;
pub mod tensor;

#[cfg(test)]
pub mod test;

pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use tensor::{Element, HostTensor};
