//! Lowering of primitive tessera graphs into a target dialect.
//!
//! # Architecture
//!
//! - [`builder`] - The [`DialectBuilder`] contract with the target IR
//! - [`table`] - [`ConverterTable`]: operator identity → converter
//! - [`converters`] - Converters for the primitive operator set
//! - [`ctx`] - Per-pass [`ValueMap`] and converter context
//! - [`text`] - MLIR generic-form text builder
//!
//! # Usage
//!
//! ```ignore
//! let module = tessera_codegen::compile(&graph, &LoweringOptions::default(), None)?;
//! println!("{}", module.render()?);
//! ```

pub mod builder;
pub mod converters;
pub mod ctx;
pub mod error;
pub mod lower;
pub mod table;
pub mod text;


pub use builder::{Attribute, DialectBuilder};
pub use ctx::{LoweringContext, ValueMap};
pub use error::*;
pub use lower::{LoweringOptions, compile, lower_graph, lower_node, unsupported_ops};
pub use table::{Converter, ConverterTable};
pub use text::{TextModule, TextValue};
