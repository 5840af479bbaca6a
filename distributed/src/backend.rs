use bon::bon;
use snafu::ensure;
use tessera_dtype::DType;
use tracing::{error, info};

use crate::Reduction;
use crate::datatype::{collective_type, native_op, point_to_point_type};
use crate::error::*;
use crate::transport::Transport;

/// Collective capabilities a distributed program relies on.
///
/// Every rank must call the collectives in the same order with the same
/// element count; `send` and `recv` must be paired.
pub trait DistributedInterface: Send + Sync {
    fn name(&self) -> &str;

    fn size(&self) -> usize;

    fn rank(&self) -> usize;

    /// Emits a rank-tagged diagnostic line. Never fails.
    fn log_print(&self, timestamp: &str, buf: &[u8]);

    fn all_reduce(
        &self,
        input: &[u8],
        output: &mut [u8],
        dtype: DType,
        reduction: Reduction,
        count: usize,
    ) -> Result<()>;

    fn broadcast(&self, buf: &mut [u8], dtype: DType, count: usize, root: usize) -> Result<()>;

    fn send(&self, buf: &[u8], dtype: DType, count: usize, dest: usize) -> Result<()>;

    fn recv(&self, buf: &mut [u8], dtype: DType, count: usize, src: usize) -> Result<()>;
}

/// Formats a diagnostic line as `"{timestamp} [{name} RANK: {rank}]: {message}"`.
///
/// The message is the prefix of `buf` up to its first NUL byte, decoded lossily.
pub fn format_log_line(name: &str, rank: usize, timestamp: &str, buf: &[u8]) -> String {
    let end = buf.iter().position(|&byte| byte == 0).unwrap_or(buf.len());
    let message = String::from_utf8_lossy(&buf[..end]);
    format!("{timestamp} [{name} RANK: {rank}]: {message}")
}

/// [`DistributedInterface`] over a [`Transport`].
///
/// An *owning* backend initializes the communicator on construction and
/// finalizes it on drop. A *borrowing* backend attaches to a communicator
/// someone else initialized and leaves it alone on drop.
#[derive(Debug)]
pub struct CollectiveBackend<T: Transport> {
    name: String,
    transport: T,
    manages_communicator: bool,
}

#[bon]
impl<T: Transport> CollectiveBackend<T> {
    #[builder]
    pub fn new(
        transport: T,
        #[builder(into)] name: Option<String>,
        #[builder(default = true)] manage_communicator: bool,
    ) -> Result<Self> {
        let name = name.unwrap_or_else(|| transport.name().to_string());

        if manage_communicator {
            ensure!(!transport.is_initialized(), AlreadyInitializedSnafu { transport: &name });
            transport.init()?;
            info!(backend = %name, rank = transport.rank(), size = transport.size(), "communicator initialized");
        } else {
            ensure!(transport.is_initialized(), NotInitializedSnafu { transport: &name });
        }

        Ok(Self { name, transport, manages_communicator: manage_communicator })
    }
}

impl<T: Transport> CollectiveBackend<T> {
    /// Initializes the communicator and takes responsibility for finalizing it.
    pub fn owning(transport: T) -> Result<Self> {
        Self::builder().transport(transport).build()
    }

    /// Attaches to an already initialized communicator.
    pub fn borrowing(transport: T) -> Result<Self> {
        Self::builder().transport(transport).manage_communicator(false).build()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn manages_communicator(&self) -> bool {
        self.manages_communicator
    }
}

impl<T: Transport> Drop for CollectiveBackend<T> {
    fn drop(&mut self) {
        if !self.manages_communicator || !self.transport.is_initialized() {
            return;
        }
        match self.transport.finalize() {
            Ok(()) => info!(backend = %self.name, rank = self.transport.rank(), "communicator finalized"),
            Err(err) => error!(backend = %self.name, %err, "failed to finalize communicator"),
        }
    }
}

impl<T: Transport> DistributedInterface for CollectiveBackend<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> usize {
        self.transport.size()
    }

    fn rank(&self) -> usize {
        self.transport.rank()
    }

    fn log_print(&self, timestamp: &str, buf: &[u8]) {
        let line = format_log_line(&self.name, self.rank(), timestamp, buf);
        info!(target: "tessera::distributed", rank = self.rank(), "{line}");
    }

    fn all_reduce(
        &self,
        input: &[u8],
        output: &mut [u8],
        dtype: DType,
        reduction: Reduction,
        count: usize,
    ) -> Result<()> {
        let ty = collective_type("all_reduce", dtype)?;
        self.transport.all_reduce(input, output, ty, native_op(reduction), count)
    }

    fn broadcast(&self, buf: &mut [u8], dtype: DType, count: usize, root: usize) -> Result<()> {
        let ty = collective_type("broadcast", dtype)?;
        self.transport.broadcast(buf, ty, count, root)
    }

    fn send(&self, buf: &[u8], dtype: DType, count: usize, dest: usize) -> Result<()> {
        let ty = point_to_point_type("send", dtype)?;
        self.transport.send(buf, ty, count, dest)
    }

    fn recv(&self, buf: &mut [u8], dtype: DType, count: usize, src: usize) -> Result<()> {
        let ty = point_to_point_type("recv", dtype)?;
        self.transport.recv(buf, ty, count, src)
    }
}
