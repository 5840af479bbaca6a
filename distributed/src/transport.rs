//! Byte-level message passing underneath a [`CollectiveBackend`](crate::CollectiveBackend).
//!
//! A transport owns the process-wide communicator. It moves raw element
//! buffers and knows nothing about tessera types beyond [`NativeType`].

use std::sync::Arc;

use crate::datatype::{NativeOp, NativeType};
use crate::error::Result;

/// Kind of message on the wire. Used to detect ranks that entered different
/// collectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Tag {
    AllReduce,
    Broadcast,
    PointToPoint,
}

pub trait Transport: Send + Sync {
    /// Short human readable name, used as the default backend name.
    fn name(&self) -> &str;

    /// Brings the communicator up. Fails if it is already live or was finalized.
    fn init(&self) -> Result<()>;

    /// Tears the communicator down. Fails if it is not live.
    fn finalize(&self) -> Result<()>;

    fn is_initialized(&self) -> bool;

    fn is_finalized(&self) -> bool;

    fn size(&self) -> usize;

    fn rank(&self) -> usize;

    /// Reduces `count` elements of `ty` from every rank; every rank receives
    /// the identical result in `output`.
    fn all_reduce(&self, input: &[u8], output: &mut [u8], ty: NativeType, op: NativeOp, count: usize) -> Result<()>;

    /// Overwrites `buf` on every rank with the contents of `buf` on `root`.
    fn broadcast(&self, buf: &mut [u8], ty: NativeType, count: usize, root: usize) -> Result<()>;

    fn send(&self, buf: &[u8], ty: NativeType, count: usize, dest: usize) -> Result<()>;

    /// Blocks until the matching [`send`](Transport::send) from `src` arrives.
    fn recv(&self, buf: &mut [u8], ty: NativeType, count: usize, src: usize) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn init(&self) -> Result<()> {
        (**self).init()
    }

    fn finalize(&self) -> Result<()> {
        (**self).finalize()
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn is_finalized(&self) -> bool {
        (**self).is_finalized()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn all_reduce(&self, input: &[u8], output: &mut [u8], ty: NativeType, op: NativeOp, count: usize) -> Result<()> {
        (**self).all_reduce(input, output, ty, op, count)
    }

    fn broadcast(&self, buf: &mut [u8], ty: NativeType, count: usize, root: usize) -> Result<()> {
        (**self).broadcast(buf, ty, count, root)
    }

    fn send(&self, buf: &[u8], ty: NativeType, count: usize, dest: usize) -> Result<()> {
        (**self).send(buf, ty, count, dest)
    }

    fn recv(&self, buf: &mut [u8], ty: NativeType, count: usize, src: usize) -> Result<()> {
        (**self).recv(buf, ty, count, src)
    }
}
