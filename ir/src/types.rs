//! Fundamental value types shared by the graph and its consumers.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tessera_dtype::DType;

use crate::shape::{Shape, num_elements};

/// Element type and static shape of one node output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorType {
    pub fn new(dtype: DType, shape: impl IntoIterator<Item = usize>) -> Self {
        Self { dtype, shape: shape.into_iter().collect() }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> usize {
        num_elements(&self.shape)
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.dtype, self.shape.as_slice())
    }
}

/// Elementwise unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::AsRefStr)]
pub enum UnaryOp {
    Neg,
    Abs,
    Exp,
    Log,
    Sqrt,
    Sigmoid,
    Tanh,
    Relu,
}

impl UnaryOp {
    /// Transcendental ops are only defined on floating point inputs.
    pub const fn requires_float(&self) -> bool {
        matches!(self, Self::Exp | Self::Log | Self::Sqrt | Self::Sigmoid | Self::Tanh)
    }
}

/// Elementwise binary operations with NumPy broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::AsRefStr)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
}

/// Constant payload. Values are stored as `f64` regardless of the node's
/// element type and converted on materialization.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Every element holds the same value.
    Splat(f64),
    /// Row-major element values.
    Dense(Arc<[f64]>),
}

impl Literal {
    /// Value at flat index `index`.
    pub fn get(&self, index: usize) -> f64 {
        match self {
            Self::Splat(value) => *value,
            Self::Dense(values) => values[index],
        }
    }
}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Splat(value) => {
                0u8.hash(state);
                value.to_bits().hash(state);
            }
            Self::Dense(values) => {
                1u8.hash(state);
                values.len().hash(state);
                values.iter().for_each(|value| value.to_bits().hash(state));
            }
        }
    }
}
