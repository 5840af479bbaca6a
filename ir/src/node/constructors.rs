//! Validated node constructors.
//!
//! Every constructor checks operand types and shapes before creating a node,
//! so an invalid graph is rejected where it is built.

use std::sync::Arc;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};
use tessera_dtype::DType;

use super::core::{Node, Output};
use crate::Reduction;
use crate::error::*;
use crate::op::{Op, OpKind};
use crate::shape::{broadcast_shapes, is_permutation, num_elements};
use crate::types::{BinaryOp, Literal, TensorType, UnaryOp};

fn single(op: Op, ty: TensorType) -> Output {
    Node::new(op, [ty]).output(0)
}

macro_rules! unary_constructors {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> Result<Output> {
                self.try_unary(UnaryOp::$op)
            }
        )*
    };
}

macro_rules! binary_constructors {
    ($($name:ident => $op:ident),* $(,)?) => {
        $(
            pub fn $name(&self, rhs: &Output) -> Result<Output> {
                self.try_binary(BinaryOp::$op, rhs)
            }
        )*
    };
}

impl Output {
    // =========================================================================
    // Leaves
    // =========================================================================

    pub fn parameter(index: usize, dtype: DType, shape: impl IntoIterator<Item = usize>) -> Output {
        single(Op::Parameter { index }, TensorType::new(dtype, shape))
    }

    pub fn constant(dtype: DType, shape: impl IntoIterator<Item = usize>, literal: Literal) -> Result<Output> {
        let ty = TensorType::new(dtype, shape);
        if let Literal::Dense(values) = &literal {
            let expected = ty.num_elements();
            ensure!(values.len() == expected, LiteralSizeMismatchSnafu { expected, actual: values.len() });
        }
        Ok(single(Op::Constant(literal), ty))
    }

    /// Constant with every element equal to `value`.
    pub fn splat(dtype: DType, shape: impl IntoIterator<Item = usize>, value: f64) -> Output {
        single(Op::Constant(Literal::Splat(value)), TensorType::new(dtype, shape))
    }

    /// Rank-0 constant; broadcasts against any shape.
    pub fn scalar(dtype: DType, value: f64) -> Output {
        Self::splat(dtype, [], value)
    }

    // =========================================================================
    // Elementwise
    // =========================================================================

    pub fn try_unary(&self, op: UnaryOp) -> Result<Output> {
        let dtype = self.dtype();
        let valid = if op.requires_float() { dtype.is_float() } else { dtype.is_float() || dtype.is_int() };
        ensure!(valid, InvalidDTypeForUnaryOpSnafu { operation: op, dtype });
        Ok(single(Op::Unary(op, self.clone()), self.ty().clone()))
    }

    pub fn try_binary(&self, op: BinaryOp, rhs: &Output) -> Result<Output> {
        let (lhs_dtype, rhs_dtype) = (self.dtype(), rhs.dtype());
        ensure!(lhs_dtype == rhs_dtype, DTypeMismatchSnafu { op: OpKind::from(op), lhs: lhs_dtype, rhs: rhs_dtype });
        ensure!(
            lhs_dtype.is_float() || lhs_dtype.is_int(),
            InvalidDTypeForOpSnafu { op: OpKind::from(op), dtype: lhs_dtype }
        );
        let shape = broadcast_shapes(self.shape(), rhs.shape())
            .context(BroadcastShapeMismatchSnafu { lhs: self.shape(), rhs: rhs.shape() })?;
        Ok(single(Op::Binary(op, self.clone(), rhs.clone()), TensorType { dtype: lhs_dtype, shape }))
    }

    unary_constructors! {
        try_neg => Neg,
        try_abs => Abs,
        try_exp => Exp,
        try_log => Log,
        try_sqrt => Sqrt,
        try_sigmoid => Sigmoid,
        try_tanh => Tanh,
        try_relu => Relu,
    }

    binary_constructors! {
        try_add => Add,
        try_sub => Sub,
        try_mul => Mul,
        try_div => Div,
        try_maximum => Maximum,
        try_minimum => Minimum,
    }

    pub fn try_clamp(&self, min: f64, max: f64) -> Result<Output> {
        ensure!(min <= max, InvalidClampRangeSnafu { min, max });
        Ok(single(Op::Clamp { src: self.clone(), min, max }, self.ty().clone()))
    }

    // =========================================================================
    // Linear algebra and movement
    // =========================================================================

    /// `[m, k] x [k, n] -> [m, n]`.
    pub fn try_dot(&self, rhs: &Output) -> Result<Output> {
        let (lhs_dtype, rhs_dtype) = (self.dtype(), rhs.dtype());
        ensure!(lhs_dtype == rhs_dtype, DTypeMismatchSnafu { op: OpKind::Dot, lhs: lhs_dtype, rhs: rhs_dtype });
        let (lhs_shape, rhs_shape) = (self.shape(), rhs.shape());
        ensure!(
            lhs_shape.len() == 2 && rhs_shape.len() == 2 && lhs_shape[1] == rhs_shape[0],
            DotShapeMismatchSnafu { lhs: lhs_shape, rhs: rhs_shape }
        );
        let ty = TensorType::new(lhs_dtype, [lhs_shape[0], rhs_shape[1]]);
        Ok(single(Op::Dot { lhs: self.clone(), rhs: rhs.clone() }, ty))
    }

    pub fn try_transpose(&self, perm: &[usize]) -> Result<Output> {
        ensure!(is_permutation(perm, self.rank()), InvalidPermutationSnafu { permutation: perm, rank: self.rank() });
        let shape = perm.iter().map(|&axis| self.shape()[axis]);
        let ty = TensorType::new(self.dtype(), shape);
        Ok(single(Op::Transpose { src: self.clone(), perm: perm.iter().copied().collect() }, ty))
    }

    /// Reverses the axes.
    pub fn try_t(&self) -> Result<Output> {
        let perm: SmallVec<[usize; 4]> = (0..self.rank()).rev().collect();
        self.try_transpose(&perm)
    }

    pub fn try_reshape(&self, shape: impl IntoIterator<Item = usize>) -> Result<Output> {
        let ty = TensorType::new(self.dtype(), shape);
        let (input_size, output_size) = (num_elements(self.shape()), ty.num_elements());
        ensure!(input_size == output_size, ReshapeSizeMismatchSnafu { input_size, output_size });
        Ok(single(Op::Reshape { src: self.clone() }, ty))
    }

    /// Half-open box `[begins, ends)`.
    pub fn try_slice(&self, begins: &[usize], ends: &[usize]) -> Result<Output> {
        let rank = self.rank();
        ensure!(begins.len() == rank, SliceRankMismatchSnafu { expected: rank, actual: begins.len() });
        ensure!(ends.len() == rank, SliceRankMismatchSnafu { expected: rank, actual: ends.len() });
        for (dim, ((&begin, &end), &size)) in begins.iter().zip(ends).zip(self.shape()).enumerate() {
            ensure!(begin <= end && end <= size, SliceOutOfBoundsSnafu { dim, begin, end, size });
        }
        let shape = begins.iter().zip(ends).map(|(begin, end)| end - begin);
        let ty = TensorType::new(self.dtype(), shape);
        let op = Op::Slice {
            src: self.clone(),
            begins: begins.iter().copied().collect(),
            ends: ends.iter().copied().collect(),
        };
        Ok(single(op, ty))
    }

    pub fn try_concat(sources: &[Output], axis: usize) -> Result<Output> {
        let first = sources.first().context(ConcatEmptySnafu)?;
        ensure!(axis < first.rank(), AxisOutOfRangeSnafu { axis, rank: first.rank() });

        let mut shape = first.ty().shape.clone();
        shape[axis] = 0;
        for source in sources {
            let compatible = source.dtype() == first.dtype()
                && source.rank() == first.rank()
                && source.shape().iter().zip(first.shape()).enumerate().all(|(dim, (a, b))| dim == axis || a == b);
            ensure!(compatible, ConcatMismatchSnafu { axis, lhs: first.ty().clone(), rhs: source.ty().clone() });
            shape[axis] += source.shape()[axis];
        }

        let ty = TensorType { dtype: first.dtype(), shape };
        Ok(single(Op::Concat { sources: sources.iter().cloned().collect(), axis }, ty))
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Mean-variance normalization: `(x - mean) / sqrt(var + eps)` over `axes`,
    /// or only mean subtraction when `normalize_variance` is false.
    pub fn try_mvn(&self, axes: &[usize], normalize_variance: bool, eps: f64) -> Result<Output> {
        ensure!(self.dtype().is_float(), InvalidDTypeForOpSnafu { op: OpKind::Mvn, dtype: self.dtype() });
        if let Some(&axis) = axes.iter().find(|&&axis| axis >= self.rank()) {
            return AxisOutOfRangeSnafu { axis, rank: self.rank() }.fail();
        }
        let op = Op::Mvn { src: self.clone(), axes: axes.iter().copied().collect(), normalize_variance, eps };
        Ok(single(op, self.ty().clone()))
    }

    // =========================================================================
    // Collectives
    // =========================================================================

    fn ensure_collective_dtype(&self, op: OpKind) -> Result<()> {
        let dtype = self.dtype();
        ensure!(matches!(dtype, DType::Float32 | DType::Float64), InvalidDTypeForOpSnafu { op, dtype });
        Ok(())
    }

    pub fn try_all_reduce(&self, reduction: Reduction) -> Result<Output> {
        self.ensure_collective_dtype(OpKind::AllReduce)?;
        Ok(single(Op::AllReduce { src: self.clone(), reduction }, self.ty().clone()))
    }

    /// Replaces the value on every rank with the value on `root`.
    pub fn try_broadcast_distributed(&self, root: usize) -> Result<Output> {
        self.ensure_collective_dtype(OpKind::BroadcastDistributed)?;
        Ok(single(Op::BroadcastDistributed { src: self.clone(), root }, self.ty().clone()))
    }

    pub fn try_send(&self, dest: usize) -> Result<Output> {
        let dtype = self.dtype();
        ensure!(dtype.is_static(), InvalidDTypeForOpSnafu { op: OpKind::Send, dtype });
        Ok(single(Op::Send { src: self.clone(), dest }, self.ty().clone()))
    }

    pub fn try_recv(&self, source: usize) -> Result<Output> {
        let dtype = self.dtype();
        ensure!(dtype.is_static(), InvalidDTypeForOpSnafu { op: OpKind::Recv, dtype });
        Ok(single(Op::Recv { src: self.clone(), source }, self.ty().clone()))
    }
}

impl Node {
    /// Rebuilds this node over `inputs`, keeping its operation and output types.
    pub(crate) fn with_inputs(self: &Arc<Self>, inputs: &[Output]) -> Result<Arc<Node>> {
        let op = self.op.with_inputs(inputs)?;
        Ok(Node::new(op, self.outputs.iter().cloned()))
    }
}
