//! Collective communication for distributed tessera programs.
//!
//! [`DistributedInterface`] is what graph consumers (the interpreter, the
//! lowering pass) see. [`CollectiveBackend`] implements it over any
//! [`Transport`], mapping tessera element types to wire types and enforcing
//! the communicator lifecycle. [`LocalTransport`] runs every rank as a thread
//! in the current process.

pub mod backend;
pub mod config;
pub mod datatype;
pub mod error;
pub mod local;
pub mod reduction;
pub mod transport;

#[cfg(test)]
pub mod test;

pub use backend::{CollectiveBackend, DistributedInterface, format_log_line};
pub use config::{DistributedConfig, TransportKind};
pub use error::{Error, Result};
pub use local::{LocalTransport, LocalWorld};
pub use reduction::Reduction;
pub use transport::{Tag, Transport};
