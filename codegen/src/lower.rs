//! The lowering pass.

use std::sync::Arc;

use snafu::{ResultExt, ensure};
use tessera_distributed::DistributedInterface;
use tessera_ir::decompositions::decompose_graph;
use tessera_ir::{Graph, Node, OpKind};
use tracing::{debug, warn};

use crate::builder::DialectBuilder;
use crate::ctx::LoweringContext;
use crate::error::*;
use crate::table::ConverterTable;
use crate::text::TextModule;

/// Options of [`compile`].
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct LoweringOptions {
    /// Name of the emitted function.
    #[builder(default = "main".to_string(), into)]
    pub function_name: String,
}

impl Default for LoweringOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Lowers one node through its converter.
///
/// A node whose outputs are already mapped is skipped, so a repeated call
/// never emits a second construct.
pub fn lower_node<B: DialectBuilder + 'static>(
    ctx: &mut LoweringContext<'_, B>,
    table: &ConverterTable<B>,
    node: &Arc<Node>,
) -> Result<()> {
    if ctx.values().contains_node(node) {
        warn!(node.id = node.id, op = %node.kind(), "node already lowered, skipping");
        return Ok(());
    }

    let converter = table.get(node.kind())?;
    debug!(node.id = node.id, op = %node.kind(), "lowering node");
    converter(ctx, node)?;

    for index in 0..node.outputs().len() {
        ensure!(
            ctx.values().get(&node.output(index)).is_some(),
            IncompleteConversionSnafu { op: node.kind(), node: node.id, index }
        );
    }
    Ok(())
}

/// Lowers every node of `graph` in topological order and returns its results.
///
/// The first failing node aborts the pass; the builder then holds a partial
/// function that must be discarded.
pub fn lower_graph<B: DialectBuilder + 'static>(
    graph: &Graph,
    builder: &mut B,
    table: &ConverterTable<B>,
    distributed: Option<&dyn DistributedInterface>,
) -> Result<()> {
    let mut ctx = LoweringContext::new(builder, distributed);
    for node in graph.toposort() {
        lower_node(&mut ctx, table, &node)?;
    }

    let results = graph
        .results()
        .iter()
        .map(|result| {
            let node = result.node();
            ctx.operand(node, result)
        })
        .collect::<Result<Vec<_>>>()?;
    ctx.builder.ret(&results)
}

/// Every operator kind of `graph` without a converter, in first-use order.
pub fn unsupported_ops<B: DialectBuilder + 'static>(graph: &Graph, table: &ConverterTable<B>) -> Vec<OpKind> {
    let mut unsupported = Vec::new();
    for node in graph.toposort() {
        let kind = node.kind();
        if !table.supports(kind) && !unsupported.contains(&kind) {
            unsupported.push(kind);
        }
    }
    unsupported
}

/// Decomposes fused operators and lowers the result to a text module.
pub fn compile(
    graph: &Graph,
    options: &LoweringOptions,
    distributed: Option<&dyn DistributedInterface>,
) -> Result<TextModule> {
    let graph = decompose_graph(graph).context(IrSnafu)?;
    let table = ConverterTable::standard();

    let unsupported = unsupported_ops(&graph, &table);
    if let Some(first) = unsupported.first() {
        let names: Vec<String> = unsupported.iter().map(ToString::to_string).collect();
        warn!(ops = ?names, "graph contains unsupported operators");
        return UnsupportedOpSnafu { op: first.to_string() }.fail();
    }

    let mut module = TextModule::new(options.function_name.clone());
    lower_graph(&graph, &mut module, &table, distributed)?;
    Ok(module)
}
