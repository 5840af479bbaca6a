use snafu::Snafu;
use tessera_dtype::DType;

use crate::transport::Tag;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by collective backends and transports.
///
/// The lifecycle variants (`AlreadyInitialized`, `NotInitialized`,
/// `AlreadyFinalized`) and `UnsupportedElementType` are contract violations by
/// the caller. They are reported instead of panicking so that tests can build
/// contexts side by side, but callers should treat them as fatal.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// An owning context was requested while the communicator is live.
    #[snafu(display("{transport}: expected to initialize the communicator, but it is already initialized"))]
    AlreadyInitialized { transport: String },

    /// A borrowing context (or an operation) found no live communicator.
    #[snafu(display("{transport}: expected an initialized communicator, but it has not been initialized"))]
    NotInitialized { transport: String },

    /// The communicator was finalized and cannot be initialized again.
    #[snafu(display("{transport}: communicator has already been finalized"))]
    AlreadyFinalized { transport: String },

    #[snafu(display("{operation} does not support element type {dtype}"))]
    UnsupportedElementType { operation: &'static str, dtype: DType },

    #[snafu(display("{operation}: rank {rank} is out of range for world size {size}"))]
    InvalidRank { operation: &'static str, rank: usize, size: usize },

    #[snafu(display("{operation}: buffer holds {actual} bytes but {expected} are required"))]
    BufferTooSmall { operation: &'static str, expected: usize, actual: usize },

    #[snafu(display("{operation}: {count} elements of {width} bytes overflow the address space"))]
    SizeOverflow { operation: &'static str, count: usize, width: usize },

    /// Ranks entered different collectives, or disagree on the element count.
    #[snafu(display(
        "{operation}: rank {rank} expected {expected:?} message of {expected_len} bytes from rank {peer}, \
         got {actual:?} of {actual_len} bytes"
    ))]
    MessageMismatch {
        operation: &'static str,
        rank: usize,
        peer: usize,
        expected: Tag,
        expected_len: usize,
        actual: Tag,
        actual_len: usize,
    },

    /// Failure reported by the underlying transport, passed through as is.
    #[snafu(display("transport failure: {reason}"))]
    Transport { reason: String },

    #[snafu(display("invalid configuration: {key}={value}"))]
    InvalidConfig { key: &'static str, value: String },
}
