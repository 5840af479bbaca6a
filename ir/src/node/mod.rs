//! Graph nodes and the output references that connect them.

mod constructors;
mod core;

pub use self::core::{Node, Output, toposort};
