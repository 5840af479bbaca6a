//! Rewriting fused operators into primitive subgraphs.
//!
//! [`decompose`] rewrites a single fused node; [`decompose_graph`] applies it
//! to every fused node of a graph and rebuilds their consumers.

pub mod helpers;
mod lstm_cell;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tracing::debug;

use crate::error::*;
use crate::graph::Graph;
use crate::node::{Node, Output, toposort};

/// Primitive replacement of one fused node.
#[derive(Debug, Clone)]
pub struct Subgraph {
    inputs: SmallVec<[Output; 8]>,
    outputs: SmallVec<[Output; 2]>,
}

impl Subgraph {
    /// Declared inputs of the fused node this subgraph replaces.
    pub fn inputs(&self) -> &[Output] {
        &self.inputs
    }

    /// Designated outputs, in the fused node's output order.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Nodes of the subgraph in topological order, excluding the producers
    /// of [`inputs`](Self::inputs).
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        let boundary: HashSet<u64> = self.inputs.iter().map(|input| input.node().id).collect();
        let roots = self.outputs.iter().map(|output| output.node().clone());
        toposort(roots, |node| boundary.contains(&node.id))
            .into_iter()
            .filter(|node| !boundary.contains(&node.id))
            .collect()
    }

    /// Values consumed by the subgraph but produced outside of it.
    pub fn free_inputs(&self) -> HashSet<Output> {
        let nodes = self.nodes();
        let inner: HashSet<u64> = nodes.iter().map(|node| node.id).collect();
        nodes
            .iter()
            .flat_map(|node| node.inputs().into_iter().cloned().collect::<Vec<_>>())
            .filter(|input| !inner.contains(&input.node().id))
            .collect()
    }
}

/// Rewrites a fused node into primitives.
///
/// The outputs of the returned subgraph have exactly the fused node's output
/// types.
pub fn decompose(node: &Arc<Node>) -> Result<Subgraph> {
    let op = node.kind();
    let fused = node.op().as_fused().context(NotFusedSnafu { op })?;
    let outputs = fused.decompose()?;

    ensure!(
        outputs.len() == node.outputs().len(),
        InputCountMismatchSnafu { op, expected: node.outputs().len(), actual: outputs.len() }
    );
    for (index, (output, expected)) in outputs.iter().zip(node.outputs()).enumerate() {
        ensure!(
            output.ty() == expected,
            DecompositionTypeMismatchSnafu { op, index, expected: expected.clone(), actual: output.ty().clone() }
        );
    }

    Ok(Subgraph { inputs: fused.fused_inputs().iter().cloned().collect(), outputs })
}

/// Replaces every fused node of `graph` with its decomposition.
///
/// Consumers of rewritten values are rebuilt bottom-up; nodes that depend on
/// no fused node are shared with the input graph.
pub fn decompose_graph(graph: &Graph) -> Result<Graph> {
    let mut replacements: HashMap<(u64, usize), Output> = HashMap::new();
    let remap = |replacements: &HashMap<(u64, usize), Output>, output: &Output| {
        replacements.get(&(output.node().id, output.index())).cloned().unwrap_or_else(|| output.clone())
    };

    for node in graph.toposort() {
        let inputs: Vec<Output> = node.inputs().into_iter().map(|input| remap(&replacements, input)).collect();
        let changed = node.inputs().into_iter().zip(&inputs).any(|(old, new)| old != new);

        let outputs: SmallVec<[Output; 2]> = if node.is_fused() {
            let node = if changed { node.with_inputs(&inputs)? } else { node.clone() };
            let subgraph = decompose(&node)?;
            debug!(node.id = node.id, op = %node.kind(), nodes = subgraph.nodes().len(), "decomposed fused node");
            subgraph.outputs
        } else if changed {
            let rebuilt = node.with_inputs(&inputs)?;
            (0..rebuilt.outputs().len()).map(|index| rebuilt.output(index)).collect()
        } else {
            continue;
        };

        for (index, output) in outputs.into_iter().enumerate() {
            replacements.insert((node.id, index), output);
        }
    }

    let results = graph.results().iter().map(|result| remap(&replacements, result)).collect();
    Graph::new(graph.parameters().to_vec(), results)
}
