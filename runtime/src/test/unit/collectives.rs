//! Collective operators executed over a local multi-rank world.

use tessera_distributed::{CollectiveBackend, DistributedInterface, LocalWorld};
use tessera_dtype::DType;
use tessera_ir::{Graph, Output, Reduction};
use test_case::test_case;

use crate::{HostTensor, Interpreter};

fn run_on_world(size: usize, graph: &Graph, input: impl Fn(usize) -> HostTensor + Sync) -> Vec<HostTensor> {
    LocalWorld::run(size, |transport| {
        let backend = CollectiveBackend::owning(transport).unwrap();
        let interpreter = Interpreter::with_distributed(&backend);
        let mut outputs = interpreter.run(graph, &[input(backend.rank())]).unwrap();
        outputs.remove(0)
    })
}

#[test_case(DType::Float32, Reduction::Sum, 10.0; "sum_f32")]
#[test_case(DType::Float64, Reduction::Sum, 10.0; "sum_f64")]
#[test_case(DType::Float32, Reduction::Prod, 24.0; "prod_f32")]
#[test_case(DType::Float64, Reduction::Max, 4.0; "max_f64")]
#[test_case(DType::Float64, Reduction::Min, 1.0; "min_f64")]
fn test_all_reduce_graph(dtype: DType, reduction: Reduction, expected: f64) {
    let x = Output::parameter(0, dtype, [5]);
    let graph = Graph::new(vec![x.clone()], vec![x.try_all_reduce(reduction).unwrap()]).unwrap();

    let outputs = run_on_world(4, &graph, |rank| HostTensor::splat(dtype, [5], rank as f64 + 1.0).unwrap());
    for output in outputs {
        assert_eq!(output.data(), &[expected; 5]);
    }
}

#[test]
fn test_all_reduce_feeds_primitives() {
    let x = Output::parameter(0, DType::Float32, [2]);
    let mean = x.try_all_reduce(Reduction::Sum).unwrap().try_div(&Output::scalar(DType::Float32, 3.0)).unwrap();
    let graph = Graph::new(vec![x.clone()], vec![mean]).unwrap();

    let outputs = run_on_world(3, &graph, |rank| {
        HostTensor::new(DType::Float32, [2], vec![rank as f64, 2.0 * rank as f64]).unwrap()
    });
    for output in outputs {
        assert_eq!(output.data(), &[1.0, 2.0]);
    }
}

#[test]
fn test_broadcast_graph() {
    let x = Output::parameter(0, DType::Float64, [3]);
    let graph = Graph::new(vec![x.clone()], vec![x.try_broadcast_distributed(2).unwrap()]).unwrap();

    let outputs = run_on_world(3, &graph, |rank| HostTensor::splat(DType::Float64, [3], rank as f64 * 10.0).unwrap());
    for output in outputs {
        assert_eq!(output.data(), &[20.0; 3]);
    }
}

#[test]
fn test_send_recv_graphs() {
    let x = Output::parameter(0, DType::Int32, [4]);
    let send = Graph::new(vec![x.clone()], vec![x.try_send(1).unwrap()]).unwrap();
    let recv = Graph::new(vec![x.clone()], vec![x.try_recv(0).unwrap()]).unwrap();

    let outputs = LocalWorld::run(2, |transport| {
        let backend = CollectiveBackend::owning(transport).unwrap();
        let interpreter = Interpreter::with_distributed(&backend);
        let input = HostTensor::from_slice([4], &[backend.rank() as i32 * 5; 4]).unwrap();
        let graph = if backend.rank() == 0 { &send } else { &recv };
        interpreter.run(graph, &[input]).unwrap().remove(0)
    });

    assert_eq!(outputs[0].data(), &[0.0; 4]);
    assert_eq!(outputs[1].data(), &[0.0; 4]);
}

#[test]
fn test_send_recv_transfers_values() {
    let x = Output::parameter(0, DType::Float16, [3]);
    let send = Graph::new(vec![x.clone()], vec![x.try_send(0).unwrap()]).unwrap();
    let recv = Graph::new(vec![x.clone()], vec![x.try_recv(1).unwrap()]).unwrap();

    let outputs = LocalWorld::run(2, |transport| {
        let backend = CollectiveBackend::owning(transport).unwrap();
        let interpreter = Interpreter::with_distributed(&backend);
        let (graph, values) = if backend.rank() == 1 { (&send, vec![0.5, -1.25, 3.0]) } else { (&recv, vec![0.0; 3]) };
        let input = HostTensor::new(DType::Float16, [3], values).unwrap();
        interpreter.run(graph, &[input]).unwrap().remove(0)
    });

    assert_eq!(outputs[0].data(), &[0.5, -1.25, 3.0]);
    assert_eq!(outputs[1].data(), &[0.5, -1.25, 3.0]);
}
