//! Per-pass lowering state.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tessera_distributed::DistributedInterface;
use tessera_ir::{Node, Output};

use crate::builder::{Attribute, DialectBuilder};
use crate::error::*;

/// Maps `(node ID, output index)` to lowered values.
///
/// Filled incrementally by one lowering pass and discarded with it.
#[derive(Debug, Clone)]
pub struct ValueMap<V> {
    values: HashMap<(u64, usize), V>,
}

impl<V> Default for ValueMap<V> {
    fn default() -> Self {
        Self { values: HashMap::new() }
    }
}

impl<V: Clone> ValueMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `output`. Returns the previous value, if any.
    pub fn insert(&mut self, output: &Output, value: V) -> Option<V> {
        self.values.insert((output.node().id, output.index()), value)
    }

    pub fn get(&self, output: &Output) -> Option<&V> {
        self.values.get(&(output.node().id, output.index()))
    }

    /// Whether every output of `node` is mapped.
    pub fn contains_node(&self, node: &Arc<Node>) -> bool {
        (0..node.outputs().len()).all(|index| self.values.contains_key(&(node.id, index)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// State handed to converters: the builder, the value map, and the
/// distributed context collectives lower against.
pub struct LoweringContext<'a, B: DialectBuilder> {
    pub builder: &'a mut B,
    values: ValueMap<B::Value>,
    distributed: Option<&'a dyn DistributedInterface>,
}

impl<'a, B: DialectBuilder> LoweringContext<'a, B> {
    pub fn new(builder: &'a mut B, distributed: Option<&'a dyn DistributedInterface>) -> Self {
        Self { builder, values: ValueMap::new(), distributed }
    }

    pub fn values(&self) -> &ValueMap<B::Value> {
        &self.values
    }

    pub fn distributed(&self) -> Option<&'a dyn DistributedInterface> {
        self.distributed
    }

    /// Lowered value of one operand of `consumer`.
    pub fn operand(&self, consumer: &Arc<Node>, input: &Output) -> Result<B::Value> {
        self.values.get(input).cloned().context(UnloweredOperandSnafu {
            op: consumer.kind(),
            node: consumer.id,
            producer: input.node().id,
            index: input.index(),
        })
    }

    /// Lowered values of every input of `node`, in order.
    pub fn operands(&self, node: &Arc<Node>) -> Result<SmallVec<[B::Value; 4]>> {
        node.inputs().into_iter().map(|input| self.operand(node, input)).collect()
    }

    /// Maps the outputs of `node` to `values`, in order.
    ///
    /// Fails if there are more values than outputs; missing values are
    /// reported by the pass once the converter returns.
    pub fn register(&mut self, node: &Arc<Node>, values: impl IntoIterator<Item = B::Value>) -> Result<()> {
        let expected = node.outputs().len();
        let mut actual = 0;
        for value in values {
            ensure!(
                actual < expected,
                ExcessResultsSnafu { op: node.kind(), node: node.id, expected, actual: actual + 1 }
            );
            self.values.insert(&node.output(actual), value);
            actual += 1;
        }
        Ok(())
    }

    /// Emits `name` over the node's operands and maps its results to the
    /// node's outputs.
    pub fn emit(&mut self, node: &Arc<Node>, name: &str, attributes: &[(&'static str, Attribute)]) -> Result<()> {
        let operands = self.operands(node)?;
        let results = self.builder.operation(name, &operands, attributes, node.outputs())?;
        self.register(node, results)
    }
}
