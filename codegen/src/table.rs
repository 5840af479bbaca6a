//! Dispatch table from operator identity to converter.

use std::collections::HashMap;
use std::sync::Arc;

use snafu::OptionExt;
use strum::IntoEnumIterator;
use tessera_ir::{Node, OpKind};

use crate::builder::DialectBuilder;
use crate::converters::{lower_collective, lower_parameter, lower_primitive};
use crate::ctx::LoweringContext;
use crate::error::*;

pub type Converter<B> = Box<dyn Fn(&mut LoweringContext<'_, B>, &Arc<Node>) -> Result<()> + Send + Sync>;

/// Converters keyed by [`OpKind`].
///
/// Lookups of unregistered operators fail with [`Error::UnsupportedOp`]
/// carrying the operator name; there is no fallback lowering.
pub struct ConverterTable<B: DialectBuilder> {
    converters: HashMap<OpKind, Converter<B>>,
}

impl<B: DialectBuilder + 'static> Default for ConverterTable<B> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<B: DialectBuilder + 'static> ConverterTable<B> {
    pub fn empty() -> Self {
        Self { converters: HashMap::new() }
    }

    /// Table covering every primitive operator.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for kind in OpKind::iter() {
            if let Some(converter) = standard_converter::<B>(kind) {
                table.converters.insert(kind, converter);
            }
        }
        table
    }

    /// Installs `converter` for `kind`, returning the one it replaces.
    pub fn register<F>(&mut self, kind: OpKind, converter: F) -> Option<Converter<B>>
    where
        F: Fn(&mut LoweringContext<'_, B>, &Arc<Node>) -> Result<()> + Send + Sync + 'static,
    {
        self.converters.insert(kind, Box::new(converter))
    }

    pub fn unregister(&mut self, kind: OpKind) -> Option<Converter<B>> {
        self.converters.remove(&kind)
    }

    pub fn get(&self, kind: OpKind) -> Result<&Converter<B>> {
        self.converters.get(&kind).context(UnsupportedOpSnafu { op: kind.to_string() })
    }

    pub fn supports(&self, kind: OpKind) -> bool {
        self.converters.contains_key(&kind)
    }

    /// Registered operators, in declaration order.
    pub fn supported(&self) -> Vec<OpKind> {
        OpKind::iter().filter(|kind| self.supports(*kind)).collect()
    }
}

/// Built-in converter for `kind`. `None` marks operators the target has no
/// lowering for: MVN, and fused operators that must be decomposed first.
fn standard_converter<B: DialectBuilder + 'static>(kind: OpKind) -> Option<Converter<B>> {
    match kind {
        OpKind::Parameter => Some(Box::new(lower_parameter::<B>)),
        OpKind::Constant
        | OpKind::Neg
        | OpKind::Abs
        | OpKind::Exp
        | OpKind::Log
        | OpKind::Sqrt
        | OpKind::Sigmoid
        | OpKind::Tanh
        | OpKind::Relu
        | OpKind::Add
        | OpKind::Sub
        | OpKind::Mul
        | OpKind::Div
        | OpKind::Maximum
        | OpKind::Minimum
        | OpKind::Clamp
        | OpKind::Dot
        | OpKind::Transpose
        | OpKind::Reshape
        | OpKind::Slice
        | OpKind::Concat => Some(Box::new(lower_primitive::<B>)),
        OpKind::AllReduce | OpKind::BroadcastDistributed | OpKind::Send | OpKind::Recv => {
            Some(Box::new(lower_collective::<B>))
        }
        OpKind::Mvn | OpKind::LstmCell => None,
    }
}
