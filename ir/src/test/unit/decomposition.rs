//! Structural tests of the LSTM decomposition.

use std::collections::HashSet;

use tessera_dtype::DType;

use crate::decompositions::{decompose, decompose_graph};
use crate::error::Error;
use crate::fused::LstmCellConfig;
use crate::test::fixtures::{LstmDims, lstm_graph};
use crate::{OpKind, Output};

const DIMS: LstmDims = LstmDims::new(2, 4, 3);

fn config() -> LstmCellConfig {
    LstmCellConfig::builder().hidden_size(DIMS.hidden).build()
}

fn count(nodes: &[std::sync::Arc<crate::Node>], kind: OpKind) -> usize {
    nodes.iter().filter(|node| node.kind() == kind).count()
}

#[test]
fn test_subgraph_outputs_match_cell() {
    let graph = lstm_graph(DType::Float32, DIMS, &config(), true).unwrap();
    let cell = graph.results()[0].node().clone();
    let subgraph = decompose(&cell).unwrap();

    assert_eq!(subgraph.outputs().len(), 2);
    for (output, ty) in subgraph.outputs().iter().zip(cell.outputs()) {
        assert_eq!(output.ty(), ty);
    }
    assert!(subgraph.nodes().iter().all(|node| !node.is_fused()));
}

#[test]
fn test_free_inputs_are_declared_inputs() {
    let graph = lstm_graph(DType::Float32, DIMS, &config(), true).unwrap();
    let subgraph = decompose(graph.results()[0].node()).unwrap();

    let declared: HashSet<Output> = graph.parameters().iter().cloned().collect();
    assert_eq!(subgraph.free_inputs(), declared);
    assert_eq!(count(&subgraph.nodes(), OpKind::Parameter), 0);
}

#[test]
fn test_primitive_node_is_not_fused() {
    let x = Output::parameter(0, DType::Float32, [2]);
    let y = x.try_tanh().unwrap();
    assert!(matches!(decompose(y.node()), Err(Error::NotFused { op: OpKind::Tanh })));
}

#[test]
fn test_default_structure() {
    let graph = lstm_graph(DType::Float32, DIMS, &config(), true).unwrap();
    let nodes = decompose(graph.results()[0].node()).unwrap().nodes();

    assert_eq!(count(&nodes, OpKind::Dot), 2);
    assert_eq!(count(&nodes, OpKind::Sigmoid), 3);
    assert_eq!(count(&nodes, OpKind::Tanh), 2);
    assert_eq!(count(&nodes, OpKind::Clamp), 0);
    assert_eq!(count(&nodes, OpKind::Sub), 0);
}

#[test]
fn test_clip_inserts_clamps() {
    let config = LstmCellConfig::builder().hidden_size(DIMS.hidden).clip(2.0).build();
    let graph = lstm_graph(DType::Float32, DIMS, &config, true).unwrap();
    let nodes = decompose(graph.results()[0].node()).unwrap().nodes();
    assert_eq!(count(&nodes, OpKind::Clamp), 4);
}

#[test]
fn test_input_forget_couples_gates() {
    let config = LstmCellConfig::builder().hidden_size(DIMS.hidden).input_forget(true).build();
    let graph = lstm_graph(DType::Float32, DIMS, &config, true).unwrap();
    let nodes = decompose(graph.results()[0].node()).unwrap().nodes();
    assert_eq!(count(&nodes, OpKind::Sigmoid), 2);
    assert_eq!(count(&nodes, OpKind::Sub), 1);
}

#[test]
fn test_decompose_graph_rebuilds_consumers() {
    let graph = lstm_graph(DType::Float32, DIMS, &config(), true).unwrap();
    let summed = graph.results()[0].try_add(&graph.results()[1]).unwrap();
    let untouched = graph.parameters()[0].try_neg().unwrap();
    let graph =
        crate::Graph::new(graph.parameters().to_vec(), vec![summed.clone(), untouched.clone()]).unwrap();

    let decomposed = decompose_graph(&graph).unwrap();
    assert!(!decomposed.contains_fused());

    let rebuilt = &decomposed.results()[0];
    assert_ne!(rebuilt, &summed);
    assert_eq!(rebuilt.kind(), OpKind::Add);
    assert_eq!(rebuilt.ty(), summed.ty());
    assert_eq!(&decomposed.results()[1], &untouched);
}

#[test]
fn test_primitive_graph_is_untouched() {
    let x = Output::parameter(0, DType::Float32, [3]);
    let graph = crate::Graph::new(vec![x.clone()], vec![x.try_relu().unwrap()]).unwrap();
    let decomposed = decompose_graph(&graph).unwrap();
    assert_eq!(decomposed.results(), graph.results());
}
