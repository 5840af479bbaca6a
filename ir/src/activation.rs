//! Named nonlinearities used inside fused recurrent cells.

use snafu::OptionExt;
use tessera_dtype::DType;

use crate::error::*;
use crate::node::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ActivationKind {
    Sigmoid,
    Tanh,
    Relu,
    HardSigmoid,
}

/// Resolved activation: a kind plus its shaping parameters.
///
/// Only `hardsigmoid` reads `alpha` and `beta`; it computes
/// `clamp(alpha * x + beta, 0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationFunction {
    kind: ActivationKind,
    alpha: f32,
    beta: f32,
}

impl ActivationFunction {
    pub const HARD_SIGMOID_ALPHA: f32 = 0.2;
    pub const HARD_SIGMOID_BETA: f32 = 0.5;

    pub fn new(kind: ActivationKind) -> Self {
        Self::with_params(kind, None, None)
    }

    pub fn with_params(kind: ActivationKind, alpha: Option<f32>, beta: Option<f32>) -> Self {
        let (default_alpha, default_beta) = match kind {
            ActivationKind::HardSigmoid => (Self::HARD_SIGMOID_ALPHA, Self::HARD_SIGMOID_BETA),
            ActivationKind::Sigmoid | ActivationKind::Tanh | ActivationKind::Relu => (0.0, 0.0),
        };
        Self { kind, alpha: alpha.unwrap_or(default_alpha), beta: beta.unwrap_or(default_beta) }
    }

    /// Looks an activation up by name (case-insensitive).
    pub fn resolve(name: &str, alpha: Option<f32>, beta: Option<f32>) -> Result<Self> {
        let kind = name.parse::<ActivationKind>().ok().context(UnknownActivationSnafu { name })?;
        Ok(Self::with_params(kind, alpha, beta))
    }

    pub fn kind(&self) -> ActivationKind {
        self.kind
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// Builds the primitive nodes computing this activation of `arg`.
    pub fn apply(&self, arg: &Output) -> Result<Output> {
        match self.kind {
            ActivationKind::Sigmoid => arg.try_sigmoid(),
            ActivationKind::Tanh => arg.try_tanh(),
            ActivationKind::Relu => arg.try_relu(),
            ActivationKind::HardSigmoid => {
                let dtype: DType = arg.dtype();
                let alpha = Output::scalar(dtype, self.alpha as f64);
                let beta = Output::scalar(dtype, self.beta as f64);
                arg.try_mul(&alpha)?.try_add(&beta)?.try_clamp(0.0, 1.0)
            }
        }
    }
}
