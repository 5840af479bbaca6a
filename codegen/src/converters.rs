//! Converters for the primitive operator set.
//!
//! Each converter handles one operator family and emits exactly one
//! target operation per node.

use std::sync::Arc;

use snafu::OptionExt;
use tessera_ir::{Literal, Node, Op, OpKind};

use crate::builder::{Attribute, DialectBuilder};
use crate::ctx::LoweringContext;
use crate::error::*;

/// Target operation name for operators lowered one to one.
pub fn operation_name(kind: OpKind) -> Option<&'static str> {
    let name = match kind {
        OpKind::Constant => "tg.constant",
        OpKind::Neg => "tg.neg",
        OpKind::Abs => "tg.abs",
        OpKind::Exp => "tg.exp",
        OpKind::Log => "tg.log",
        OpKind::Sqrt => "tg.sqrt",
        OpKind::Sigmoid => "tg.sigmoid",
        OpKind::Tanh => "tg.tanh",
        OpKind::Relu => "tg.relu",
        OpKind::Add => "tg.add",
        OpKind::Sub => "tg.sub",
        OpKind::Mul => "tg.mul",
        OpKind::Div => "tg.div",
        OpKind::Maximum => "tg.max",
        OpKind::Minimum => "tg.min",
        OpKind::Clamp => "tg.clamp",
        OpKind::Dot => "tg.dot",
        OpKind::Transpose => "tg.transpose",
        OpKind::Reshape => "tg.reshape",
        OpKind::Slice => "tg.slice",
        OpKind::Concat => "tg.concat",
        OpKind::AllReduce => "tg.all_reduce",
        OpKind::BroadcastDistributed => "tg.broadcast",
        OpKind::Send => "tg.send",
        OpKind::Recv => "tg.recv",
        OpKind::Parameter | OpKind::Mvn | OpKind::LstmCell => return None,
    };
    Some(name)
}

pub fn lower_parameter<B: DialectBuilder>(ctx: &mut LoweringContext<'_, B>, node: &Arc<Node>) -> Result<()> {
    let Op::Parameter { index } = node.op() else {
        return UnsupportedOpSnafu { op: node.kind().to_string() }.fail();
    };
    let value = ctx.builder.argument(*index, &node.outputs()[0])?;
    ctx.register(node, [value])
}

/// Attributes carried by a node's operation, excluding distributed ones.
pub fn attributes(op: &Op) -> Vec<(&'static str, Attribute)> {
    match op {
        Op::Constant(Literal::Splat(value)) => vec![("value", Attribute::Float(*value))],
        Op::Constant(Literal::Dense(values)) => vec![("value", Attribute::Floats(values.to_vec()))],
        Op::Clamp { min, max, .. } => vec![("min", Attribute::Float(*min)), ("max", Attribute::Float(*max))],
        Op::Transpose { perm, .. } => vec![("permutation", Attribute::usizes(perm))],
        Op::Slice { begins, ends, .. } => {
            vec![("lower_bounds", Attribute::usizes(begins)), ("upper_bounds", Attribute::usizes(ends))]
        }
        Op::Concat { axis, .. } => vec![("axis", Attribute::Int(*axis as i64))],
        Op::AllReduce { reduction, .. } => vec![("reduction", Attribute::Str(reduction.to_string()))],
        Op::BroadcastDistributed { root, .. } => vec![("root", Attribute::Int(*root as i64))],
        Op::Send { dest, .. } => vec![("dest", Attribute::Int(*dest as i64))],
        Op::Recv { source, .. } => vec![("source", Attribute::Int(*source as i64))],
        Op::Parameter { .. }
        | Op::Unary(..)
        | Op::Binary(..)
        | Op::Dot { .. }
        | Op::Reshape { .. }
        | Op::Mvn { .. }
        | Op::LstmCell(_) => Vec::new(),
    }
}

/// Lowers a primitive node to its one-to-one target operation.
pub fn lower_primitive<B: DialectBuilder>(ctx: &mut LoweringContext<'_, B>, node: &Arc<Node>) -> Result<()> {
    let name = operation_name(node.kind()).context(UnsupportedOpSnafu { op: node.kind().to_string() })?;
    ctx.emit(node, name, &attributes(node.op()))
}

/// Lowers a collective. The target op records which transport it runs on.
pub fn lower_collective<B: DialectBuilder>(ctx: &mut LoweringContext<'_, B>, node: &Arc<Node>) -> Result<()> {
    let op = node.kind();
    let name = operation_name(op).context(UnsupportedOpSnafu { op: op.to_string() })?;
    let distributed = ctx.distributed().context(MissingDistributedContextSnafu { op })?;

    let mut attrs = attributes(node.op());
    attrs.push(("transport", Attribute::Str(distributed.name().to_string())));
    attrs.push(("world_size", Attribute::Int(distributed.size() as i64)));
    ctx.emit(node, name, &attrs)
}
