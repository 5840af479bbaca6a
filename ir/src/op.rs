//! Operator enum and its flat identity tag.

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use snafu::ensure;

use crate::Reduction;
use crate::error::*;
use crate::fused::{FusedOp, LstmCell};
use crate::node::Output;
use crate::shape::Shape;
use crate::types::{BinaryOp, Literal, UnaryOp};

/// Stable operator identity.
///
/// Every [`Op`] variant maps to one tag (unary and binary operations are
/// flattened), so passes can dispatch with an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumIter, strum::EnumCount, strum::AsRefStr)]
pub enum OpKind {
    Parameter,
    Constant,

    Neg,
    Abs,
    Exp,
    Log,
    Sqrt,
    Sigmoid,
    Tanh,
    Relu,

    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,

    Clamp,
    Dot,
    Transpose,
    Reshape,
    Slice,
    Concat,

    #[strum(to_string = "MVN")]
    Mvn,

    AllReduce,
    BroadcastDistributed,
    Send,
    Recv,

    #[strum(to_string = "LSTMCell")]
    LstmCell,
}

impl OpKind {
    /// Fused operators must be decomposed before lowering.
    pub const fn is_fused(&self) -> bool {
        matches!(self, Self::LstmCell)
    }

    /// Operators that synchronize with other ranks.
    pub const fn is_collective(&self) -> bool {
        matches!(self, Self::AllReduce | Self::BroadcastDistributed | Self::Send | Self::Recv)
    }
}

impl From<UnaryOp> for OpKind {
    fn from(op: UnaryOp) -> Self {
        match op {
            UnaryOp::Neg => Self::Neg,
            UnaryOp::Abs => Self::Abs,
            UnaryOp::Exp => Self::Exp,
            UnaryOp::Log => Self::Log,
            UnaryOp::Sqrt => Self::Sqrt,
            UnaryOp::Sigmoid => Self::Sigmoid,
            UnaryOp::Tanh => Self::Tanh,
            UnaryOp::Relu => Self::Relu,
        }
    }
}

impl From<BinaryOp> for OpKind {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => Self::Add,
            BinaryOp::Sub => Self::Sub,
            BinaryOp::Mul => Self::Mul,
            BinaryOp::Div => Self::Div,
            BinaryOp::Maximum => Self::Maximum,
            BinaryOp::Minimum => Self::Minimum,
        }
    }
}

/// Graph operation together with its inputs and attributes.
#[derive(Debug, Clone)]
pub enum Op {
    /// Graph input at position `index`.
    Parameter { index: usize },
    Constant(Literal),

    Unary(UnaryOp, Output),
    Binary(BinaryOp, Output, Output),

    /// Elementwise clamp into `[min, max]`.
    Clamp { src: Output, min: f64, max: f64 },
    /// Matrix product of `[m, k]` and `[k, n]` operands.
    Dot { lhs: Output, rhs: Output },
    Transpose { src: Output, perm: SmallVec<[usize; 4]> },
    /// Target shape is the node's output type.
    Reshape { src: Output },
    Slice { src: Output, begins: Shape, ends: Shape },
    Concat { sources: SmallVec<[Output; 4]>, axis: usize },

    /// Mean-variance normalization over `axes`.
    Mvn { src: Output, axes: SmallVec<[usize; 4]>, normalize_variance: bool, eps: f64 },

    AllReduce { src: Output, reduction: Reduction },
    BroadcastDistributed { src: Output, root: usize },
    /// Sends `src` to rank `dest`; the output aliases `src`.
    Send { src: Output, dest: usize },
    /// Receives a tensor shaped like `src` from rank `source`.
    Recv { src: Output, source: usize },

    LstmCell(Box<LstmCell>),
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Parameter { .. } => OpKind::Parameter,
            Self::Constant(_) => OpKind::Constant,
            Self::Unary(op, _) => (*op).into(),
            Self::Binary(op, _, _) => (*op).into(),
            Self::Clamp { .. } => OpKind::Clamp,
            Self::Dot { .. } => OpKind::Dot,
            Self::Transpose { .. } => OpKind::Transpose,
            Self::Reshape { .. } => OpKind::Reshape,
            Self::Slice { .. } => OpKind::Slice,
            Self::Concat { .. } => OpKind::Concat,
            Self::Mvn { .. } => OpKind::Mvn,
            Self::AllReduce { .. } => OpKind::AllReduce,
            Self::BroadcastDistributed { .. } => OpKind::BroadcastDistributed,
            Self::Send { .. } => OpKind::Send,
            Self::Recv { .. } => OpKind::Recv,
            Self::LstmCell(_) => OpKind::LstmCell,
        }
    }

    /// Ordered input references.
    pub fn inputs(&self) -> SmallVec<[&Output; 4]> {
        match self {
            Self::Parameter { .. } | Self::Constant(_) => SmallVec::new(),
            Self::Unary(_, src)
            | Self::Clamp { src, .. }
            | Self::Transpose { src, .. }
            | Self::Reshape { src }
            | Self::Slice { src, .. }
            | Self::Mvn { src, .. }
            | Self::AllReduce { src, .. }
            | Self::BroadcastDistributed { src, .. }
            | Self::Send { src, .. }
            | Self::Recv { src, .. } => smallvec::smallvec![src],
            Self::Binary(_, lhs, rhs) | Self::Dot { lhs, rhs } => smallvec::smallvec![lhs, rhs],
            Self::Concat { sources, .. } => sources.iter().collect(),
            Self::LstmCell(cell) => cell.inputs().iter().collect(),
        }
    }

    pub fn as_fused(&self) -> Option<&dyn FusedOp> {
        match self {
            Self::LstmCell(cell) => Some(cell.as_ref()),
            _ => None,
        }
    }

    /// Same operation and attributes over new inputs.
    ///
    /// Inputs are replaced positionally. Callers must keep input types
    /// unchanged, so output types stay valid.
    pub(crate) fn with_inputs(&self, inputs: &[Output]) -> Result<Op> {
        let expected = self.inputs().len();
        ensure!(inputs.len() == expected, InputCountMismatchSnafu { op: self.kind(), expected, actual: inputs.len() });

        let src = || inputs[0].clone();
        Ok(match self {
            Self::Parameter { .. } | Self::Constant(_) => self.clone(),
            Self::Unary(op, _) => Self::Unary(*op, src()),
            Self::Binary(op, _, _) => Self::Binary(*op, src(), inputs[1].clone()),
            Self::Clamp { min, max, .. } => Self::Clamp { src: src(), min: *min, max: *max },
            Self::Dot { .. } => Self::Dot { lhs: src(), rhs: inputs[1].clone() },
            Self::Transpose { perm, .. } => Self::Transpose { src: src(), perm: perm.clone() },
            Self::Reshape { .. } => Self::Reshape { src: src() },
            Self::Slice { begins, ends, .. } => Self::Slice { src: src(), begins: begins.clone(), ends: ends.clone() },
            Self::Concat { axis, .. } => Self::Concat { sources: inputs.iter().cloned().collect(), axis: *axis },
            Self::Mvn { axes, normalize_variance, eps, .. } => {
                Self::Mvn { src: src(), axes: axes.clone(), normalize_variance: *normalize_variance, eps: *eps }
            }
            Self::AllReduce { reduction, .. } => Self::AllReduce { src: src(), reduction: *reduction },
            Self::BroadcastDistributed { root, .. } => Self::BroadcastDistributed { src: src(), root: *root },
            Self::Send { dest, .. } => Self::Send { src: src(), dest: *dest },
            Self::Recv { source, .. } => Self::Recv { src: src(), source: *source },
            Self::LstmCell(cell) => Self::LstmCell(Box::new(cell.with_inputs(inputs)?)),
        })
    }

    /// Hashes the operator identity and attributes, not the inputs.
    pub(crate) fn hash_attributes<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::Parameter { index } => index.hash(state),
            Self::Constant(literal) => literal.hash(state),
            Self::Unary(..) | Self::Binary(..) | Self::Dot { .. } | Self::Reshape { .. } => {}
            Self::Clamp { min, max, .. } => {
                min.to_bits().hash(state);
                max.to_bits().hash(state);
            }
            Self::Transpose { perm, .. } => perm.hash(state),
            Self::Slice { begins, ends, .. } => {
                begins.hash(state);
                ends.hash(state);
            }
            Self::Concat { axis, .. } => axis.hash(state),
            Self::Mvn { axes, normalize_variance, eps, .. } => {
                axes.hash(state);
                normalize_variance.hash(state);
                eps.to_bits().hash(state);
            }
            Self::AllReduce { reduction, .. } => reduction.hash(state),
            Self::BroadcastDistributed { root, .. } => root.hash(state),
            Self::Send { dest, .. } => dest.hash(state),
            Self::Recv { source, .. } => source.hash(state),
            Self::LstmCell(cell) => cell.hash_attributes(state),
        }
    }
}
