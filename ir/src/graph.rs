//! Function-like graph: ordered parameters and results.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use snafu::ensure;

use crate::error::*;
use crate::node::{Node, Output, toposort};
use crate::op::{Op, OpKind};

#[derive(Debug, Clone)]
pub struct Graph {
    parameters: Vec<Output>,
    results: Vec<Output>,
}

impl Graph {
    /// `parameters[i]` must be `Parameter { index: i }`.
    pub fn new(parameters: Vec<Output>, results: Vec<Output>) -> Result<Self> {
        for (position, parameter) in parameters.iter().enumerate() {
            let valid = matches!(parameter.node().op(), Op::Parameter { index } if *index == position);
            ensure!(valid, InvalidParameterSnafu { position, op: parameter.kind() });
        }
        Ok(Self { parameters, results })
    }

    pub fn parameters(&self) -> &[Output] {
        &self.parameters
    }

    pub fn results(&self) -> &[Output] {
        &self.results
    }

    /// Every parameter and every node reachable from the results, inputs
    /// before consumers. Parameters come first, in index order.
    pub fn toposort(&self) -> Vec<Arc<Node>> {
        let roots = self.parameters.iter().chain(&self.results).map(|output| output.node().clone());
        toposort(roots, |_| false)
    }

    pub fn nodes_of(&self, kind: OpKind) -> Vec<Arc<Node>> {
        self.toposort().into_iter().filter(|node| node.kind() == kind).collect()
    }

    pub fn contains_fused(&self) -> bool {
        self.toposort().iter().any(|node| node.is_fused())
    }

    /// ID-independent hash of the whole graph; equal for graphs built the
    /// same way.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.parameters.len().hash(&mut hasher);
        for parameter in &self.parameters {
            parameter.ty().hash(&mut hasher);
        }
        for result in &self.results {
            result.node().structural_hash().hash(&mut hasher);
            result.index().hash(&mut hasher);
        }
        hasher.finish()
    }
}
