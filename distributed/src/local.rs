//! In-process transport: every rank is a thread, every pair of ranks is
//! connected by a `crossbeam` channel.
//!
//! All-reduce uses the ring algorithm (reduce-scatter followed by
//! all-gather), so each rank only ever talks to its neighbours.

use crossbeam::channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use snafu::{OptionExt, ensure};
use tracing::trace;

use crate::datatype::{NativeOp, NativeType, combine};
use crate::error::*;
use crate::transport::{Tag, Transport};

struct Message {
    tag: Tag,
    payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Initialized,
    Finalized,
}

/// One rank's endpoint of a [`LocalWorld`].
pub struct LocalTransport {
    rank: usize,
    size: usize,
    /// Indexed by destination rank.
    outgoing: Vec<Sender<Message>>,
    /// Indexed by source rank.
    incoming: Vec<Receiver<Message>>,
    lifecycle: Mutex<Lifecycle>,
}

impl std::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTransport")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("lifecycle", &*self.lifecycle.lock())
            .finish()
    }
}

pub struct LocalWorld;

impl LocalWorld {
    /// Creates `size` connected endpoints, one per rank, in rank order.
    pub fn endpoints(size: usize) -> Vec<LocalTransport> {
        let mut outgoing: Vec<Vec<Sender<Message>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut incoming: Vec<Vec<Receiver<Message>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();

        for src in 0..size {
            for dst in 0..size {
                let (tx, rx) = unbounded();
                outgoing[src].push(tx);
                incoming[dst].push(rx);
            }
        }

        outgoing
            .into_iter()
            .zip(incoming)
            .enumerate()
            .map(|(rank, (outgoing, incoming))| LocalTransport {
                rank,
                size,
                outgoing,
                incoming,
                lifecycle: Mutex::new(Lifecycle::Uninitialized),
            })
            .collect()
    }

    /// Runs `f` once per rank on scoped threads and collects the results in
    /// rank order. A panic on any rank is propagated to the caller.
    pub fn run<F, R>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(LocalTransport) -> R + Sync,
        R: Send,
    {
        let endpoints = Self::endpoints(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|endpoint| {
                    let f = &f;
                    scope.spawn(move || f(endpoint))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}

impl LocalTransport {
    fn ensure_active(&self) -> Result<()> {
        ensure!(
            *self.lifecycle.lock() == Lifecycle::Initialized,
            NotInitializedSnafu { transport: self.name() }
        );
        Ok(())
    }

    fn ensure_rank(&self, operation: &'static str, rank: usize) -> Result<()> {
        ensure!(rank < self.size, InvalidRankSnafu { operation, rank, size: self.size });
        Ok(())
    }

    fn ensure_len(operation: &'static str, expected: usize, actual: usize) -> Result<()> {
        ensure!(actual >= expected, BufferTooSmallSnafu { operation, expected, actual });
        Ok(())
    }

    fn byte_len(operation: &'static str, count: usize, width: usize) -> Result<usize> {
        count.checked_mul(width).context(SizeOverflowSnafu { operation, count, width })
    }

    fn post(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<()> {
        trace!(rank = self.rank, dest, %tag, bytes = payload.len(), "post");
        self.outgoing[dest]
            .send(Message { tag, payload })
            .map_err(|_| Error::Transport { reason: format!("rank {dest} hung up") })
    }

    fn take(&self, operation: &'static str, src: usize, tag: Tag, expected_len: usize) -> Result<Vec<u8>> {
        let message = self.incoming[src]
            .recv()
            .map_err(|err| err.to_string())
            .map_err(|reason| Error::Transport { reason: format!("rank {src}: {reason}") })?;
        ensure!(
            message.tag == tag && message.payload.len() == expected_len,
            MessageMismatchSnafu {
                operation,
                rank: self.rank,
                peer: src,
                expected: tag,
                expected_len,
                actual: message.tag,
                actual_len: message.payload.len(),
            }
        );
        Ok(message.payload)
    }
}

impl Transport for LocalTransport {
    fn name(&self) -> &str {
        "Local"
    }

    fn init(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Uninitialized => {
                *lifecycle = Lifecycle::Initialized;
                Ok(())
            }
            Lifecycle::Initialized => AlreadyInitializedSnafu { transport: self.name() }.fail(),
            Lifecycle::Finalized => AlreadyFinalizedSnafu { transport: self.name() }.fail(),
        }
    }

    fn finalize(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match *lifecycle {
            Lifecycle::Initialized => {
                *lifecycle = Lifecycle::Finalized;
                Ok(())
            }
            Lifecycle::Uninitialized => NotInitializedSnafu { transport: self.name() }.fail(),
            Lifecycle::Finalized => AlreadyFinalizedSnafu { transport: self.name() }.fail(),
        }
    }

    fn is_initialized(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Initialized
    }

    fn is_finalized(&self) -> bool {
        *self.lifecycle.lock() == Lifecycle::Finalized
    }

    fn size(&self) -> usize {
        self.size
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn all_reduce(&self, input: &[u8], output: &mut [u8], ty: NativeType, op: NativeOp, count: usize) -> Result<()> {
        const OPERATION: &str = "all_reduce";
        self.ensure_active()?;
        let width = ty.size();
        let len = Self::byte_len(OPERATION, count, width)?;
        Self::ensure_len(OPERATION, len, input.len())?;
        Self::ensure_len(OPERATION, len, output.len())?;

        let data = &mut output[..len];
        data.copy_from_slice(&input[..len]);
        if self.size == 1 {
            return Ok(());
        }

        let world = self.size;
        let chunk = count.div_ceil(world);
        let bounds = |index: usize| {
            let start = (index * chunk).min(count);
            let end = (start + chunk).min(count);
            (start * width, end * width)
        };
        let right = (self.rank + 1) % world;
        let left = (self.rank + world - 1) % world;

        // Reduce-scatter: after `world - 1` steps rank r owns the fully
        // reduced chunk (r + 1) % world.
        for step in 0..world - 1 {
            let (send_start, send_end) = bounds((self.rank + world - step) % world);
            self.post(right, Tag::AllReduce, data[send_start..send_end].to_vec())?;

            let (recv_start, recv_end) = bounds((self.rank + world - step - 1) % world);
            let incoming = self.take(OPERATION, left, Tag::AllReduce, recv_end - recv_start)?;
            combine(ty, op, &mut data[recv_start..recv_end], &incoming);
        }

        // All-gather: circulate the reduced chunks around the ring.
        for step in 0..world - 1 {
            let (send_start, send_end) = bounds((self.rank + 1 + world - step) % world);
            self.post(right, Tag::AllReduce, data[send_start..send_end].to_vec())?;

            let (recv_start, recv_end) = bounds((self.rank + world - step) % world);
            let incoming = self.take(OPERATION, left, Tag::AllReduce, recv_end - recv_start)?;
            data[recv_start..recv_end].copy_from_slice(&incoming);
        }

        Ok(())
    }

    fn broadcast(&self, buf: &mut [u8], ty: NativeType, count: usize, root: usize) -> Result<()> {
        const OPERATION: &str = "broadcast";
        self.ensure_active()?;
        self.ensure_rank(OPERATION, root)?;
        let len = Self::byte_len(OPERATION, count, ty.size())?;
        Self::ensure_len(OPERATION, len, buf.len())?;

        if self.rank == root {
            for dest in (0..self.size).filter(|&dest| dest != root) {
                self.post(dest, Tag::Broadcast, buf[..len].to_vec())?;
            }
        } else {
            let payload = self.take(OPERATION, root, Tag::Broadcast, len)?;
            buf[..len].copy_from_slice(&payload);
        }
        Ok(())
    }

    fn send(&self, buf: &[u8], ty: NativeType, count: usize, dest: usize) -> Result<()> {
        const OPERATION: &str = "send";
        self.ensure_active()?;
        self.ensure_rank(OPERATION, dest)?;
        let len = Self::byte_len(OPERATION, count, ty.size())?;
        Self::ensure_len(OPERATION, len, buf.len())?;
        self.post(dest, Tag::PointToPoint, buf[..len].to_vec())
    }

    fn recv(&self, buf: &mut [u8], ty: NativeType, count: usize, src: usize) -> Result<()> {
        const OPERATION: &str = "recv";
        self.ensure_active()?;
        self.ensure_rank(OPERATION, src)?;
        let len = Self::byte_len(OPERATION, count, ty.size())?;
        Self::ensure_len(OPERATION, len, buf.len())?;
        let payload = self.take(OPERATION, src, Tag::PointToPoint, len)?;
        buf[..len].copy_from_slice(&payload);
        Ok(())
    }
}
