//! In-process transport tests. Every multi-rank test runs ranks on scoped threads.

use proptest::prelude::*;
use test_case::test_case;

use crate::datatype::{NativeOp, NativeType};
use crate::error::Error;
use crate::local::LocalWorld;
use crate::transport::{Tag, Transport};

fn f64_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

fn f64_values(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(c);
            f64::from_ne_bytes(raw)
        })
        .collect()
}

#[test]
fn test_endpoints_are_ranked() {
    let endpoints = LocalWorld::endpoints(3);
    let ranks: Vec<_> = endpoints.iter().map(|t| (t.rank(), t.size())).collect();
    assert_eq!(ranks, vec![(0, 3), (1, 3), (2, 3)]);
}

#[test]
fn test_lifecycle() {
    let transport = LocalWorld::endpoints(1).remove(0);
    assert!(!transport.is_initialized());
    assert!(matches!(transport.finalize(), Err(Error::NotInitialized { .. })));

    transport.init().unwrap();
    assert!(transport.is_initialized());
    assert!(matches!(transport.init(), Err(Error::AlreadyInitialized { .. })));

    transport.finalize().unwrap();
    assert!(transport.is_finalized());
    assert!(!transport.is_initialized());
    assert!(matches!(transport.init(), Err(Error::AlreadyFinalized { .. })));
}

#[test]
fn test_operations_require_initialization() {
    let transport = LocalWorld::endpoints(1).remove(0);
    let mut out = [0u8; 8];
    let result = transport.all_reduce(&[0u8; 8], &mut out, NativeType::Double, NativeOp::Sum, 1);
    assert!(matches!(result, Err(Error::NotInitialized { .. })));
}

#[test]
fn test_single_rank_all_reduce_copies() {
    let transport = LocalWorld::endpoints(1).remove(0);
    transport.init().unwrap();
    let input = f64_bytes(&[1.5, 2.5]);
    let mut output = vec![0u8; input.len()];
    transport.all_reduce(&input, &mut output, NativeType::Double, NativeOp::Prod, 2).unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_buffer_too_small() {
    let transport = LocalWorld::endpoints(1).remove(0);
    transport.init().unwrap();
    let mut output = vec![0u8; 4];
    let result = transport.all_reduce(&[0u8; 16], &mut output, NativeType::Double, NativeOp::Sum, 2);
    assert!(matches!(result, Err(Error::BufferTooSmall { expected: 16, actual: 4, .. })));
}

#[test_case("all_reduce"; "all_reduce")]
#[test_case("broadcast"; "broadcast")]
#[test_case("send"; "send")]
#[test_case("recv"; "recv")]
fn test_element_count_overflow(operation: &'static str) {
    let transport = LocalWorld::endpoints(1).remove(0);
    transport.init().unwrap();
    let count = usize::MAX / 4 + 1;
    let mut buf = [0u8; 4];
    let result = match operation {
        "all_reduce" => transport.all_reduce(&[0u8; 4], &mut buf, NativeType::Float, NativeOp::Sum, count),
        "broadcast" => transport.broadcast(&mut buf, NativeType::Float, count, 0),
        "send" => transport.send(&[0u8; 4], NativeType::Float, count, 0),
        _ => transport.recv(&mut buf, NativeType::Float, count, 0),
    };
    let Err(Error::SizeOverflow { operation: op, count: c, width }) = result else {
        panic!("expected an overflow error, got {result:?}");
    };
    assert_eq!((op, c, width), (operation, count, 4));
}

#[test]
fn test_invalid_rank() {
    let transport = LocalWorld::endpoints(2).remove(0);
    transport.init().unwrap();
    let result = transport.send(&[0u8; 4], NativeType::Int, 1, 5);
    assert!(matches!(result, Err(Error::InvalidRank { rank: 5, size: 2, .. })));
}

#[test]
fn test_ring_all_reduce_uneven_chunks() {
    // 5 elements over 3 ranks leaves the last chunk short.
    let results = LocalWorld::run(3, |transport| {
        transport.init().unwrap();
        let rank = transport.rank() as f64;
        let input = f64_bytes(&[rank, rank + 1.0, rank * 2.0, 1.0, -rank]);
        let mut output = vec![0u8; input.len()];
        transport.all_reduce(&input, &mut output, NativeType::Double, NativeOp::Sum, 5).unwrap();
        f64_values(&output)
    });
    for values in results {
        assert_eq!(values, vec![3.0, 6.0, 6.0, 3.0, -3.0]);
    }
}

#[test]
fn test_broadcast_from_root() {
    let results = LocalWorld::run(4, |transport| {
        transport.init().unwrap();
        let mut buf = f64_bytes(&[transport.rank() as f64; 3]);
        transport.broadcast(&mut buf, NativeType::Double, 3, 2).unwrap();
        f64_values(&buf)
    });
    for values in results {
        assert_eq!(values, vec![2.0, 2.0, 2.0]);
    }
}

#[test]
fn test_send_recv_pair() {
    let results = LocalWorld::run(2, |transport| {
        transport.init().unwrap();
        let mut buf = [0u8; 4];
        if transport.rank() == 0 {
            transport.send(&[1, 2, 3, 4], NativeType::UnsignedChar, 4, 1).unwrap();
        } else {
            transport.recv(&mut buf, NativeType::UnsignedChar, 4, 0).unwrap();
        }
        buf
    });
    assert_eq!(results[1], [1, 2, 3, 4]);
}

#[test]
fn test_mismatched_collectives_are_detected() {
    let results = LocalWorld::run(2, |transport| {
        transport.init().unwrap();
        let mut buf = [0u8; 8];
        if transport.rank() == 0 {
            transport.send(&buf, NativeType::Double, 1, 1).map(|_| None)
        } else {
            transport
                .broadcast(&mut buf, NativeType::Double, 1, 0)
                .map(|_| None)
                .or_else(|err| Ok::<_, Error>(Some(err)))
        }
    });
    let err = results[1].as_ref().unwrap().as_ref().unwrap();
    assert!(matches!(err, Error::MessageMismatch { expected: Tag::Broadcast, actual: Tag::PointToPoint, .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn all_reduce_max_agrees_on_every_rank(world in 1usize..6, count in 1usize..17, seed in any::<u32>()) {
        let results = LocalWorld::run(world, |transport| {
            transport.init().unwrap();
            let rank = transport.rank();
            let values: Vec<f64> = (0..count).map(|i| ((seed as usize + rank * 31 + i * 7) % 101) as f64).collect();
            let input = f64_bytes(&values);
            let mut output = vec![0u8; input.len()];
            transport.all_reduce(&input, &mut output, NativeType::Double, NativeOp::Max, count).unwrap();
            f64_values(&output)
        });

        let expected: Vec<f64> = (0..count)
            .map(|i| (0..world).map(|rank| ((seed as usize + rank * 31 + i * 7) % 101) as f64).fold(f64::MIN, f64::max))
            .collect();
        for values in results {
            prop_assert_eq!(&values, &expected);
        }
    }
}
