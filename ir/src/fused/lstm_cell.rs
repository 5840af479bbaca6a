use std::hash::{Hash, Hasher};
use std::sync::Arc;

use snafu::ensure;

use crate::activation::ActivationFunction;
use crate::error::*;
use crate::node::{Node, Output};
use crate::op::{Op, OpKind};
use crate::types::TensorType;

/// Activations used when none are configured: gates, cell input, output.
pub const DEFAULT_ACTIVATIONS: [&str; 3] = ["sigmoid", "tanh", "tanh"];

/// Hyper-parameters of an [`LstmCell`].
///
/// ```ignore
/// let config = LstmCellConfig::builder().hidden_size(3).clip(1.5).build();
/// ```
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct LstmCellConfig {
    pub hidden_size: usize,

    /// Activation names for the gates (f), the cell input (g) and the output (h).
    #[builder(default = DEFAULT_ACTIVATIONS.iter().map(|name| name.to_string()).collect::<Vec<_>>())]
    pub activations: Vec<String>,

    /// Per-activation alpha, indexed like `activations`. Missing entries use defaults.
    #[builder(default)]
    pub activations_alpha: Vec<f32>,

    /// Per-activation beta, indexed like `activations`. Missing entries use defaults.
    #[builder(default)]
    pub activations_beta: Vec<f32>,

    /// Clips gate pre-activations to `[-clip, clip]`; zero disables clipping.
    #[builder(default)]
    pub clip: f32,

    /// Couples the forget gate to the input gate as `1 - i`.
    #[builder(default)]
    pub input_forget: bool,
}

/// Tensor inputs of an [`LstmCell`].
#[derive(Debug, Clone, bon::Builder)]
pub struct LstmCellInputs {
    /// `[batch, input_size]`
    pub x: Output,
    /// `[4 * hidden, input_size]`, gates ordered i, o, f, c.
    pub w: Output,
    /// `[4 * hidden, hidden]`, gates ordered i, o, f, c.
    pub r: Output,
    /// `[batch, hidden]`
    pub h: Output,
    /// `[batch, hidden]`
    pub c: Output,
    /// `[8 * hidden]`: input biases followed by recurrence biases. Zero when absent.
    pub b: Option<Output>,
    /// `[3 * hidden]`: peepholes for the i, o, f gates. Zero when absent.
    pub p: Option<Output>,
}

/// Single step of an LSTM layer, ONNX flavoured.
///
/// Produces the new hidden state `H'` (output 0) and the new cell state `C'`
/// (output 1), both `[batch, hidden]`.
#[derive(Debug, Clone)]
pub struct LstmCell {
    /// X, W, R, H, C, B, P.
    inputs: [Output; 7],
    hidden_size: usize,
    activations: [ActivationFunction; 3],
    clip: f32,
    input_forget: bool,
}

impl LstmCell {
    pub const GATES: usize = 4;
    pub const PEEPHOLES: usize = 3;
    pub const INPUT_NAMES: [&'static str; 7] = ["X", "W", "R", "H_t", "C_t", "B", "P"];

    pub fn new(inputs: LstmCellInputs, config: &LstmCellConfig) -> Result<Self> {
        let activations = resolve_activations(config)?;
        ensure!(config.clip >= 0.0, NegativeClipSnafu { clip: config.clip });
        let hidden_size = config.hidden_size;
        ensure!(hidden_size > 0, InvalidHiddenSizeSnafu { op: OpKind::LstmCell });

        validate_inputs(
            [&inputs.x, &inputs.w, &inputs.r, &inputs.h, &inputs.c],
            inputs.b.as_ref(),
            inputs.p.as_ref(),
            hidden_size,
        )?;

        let dtype = inputs.x.dtype();
        let b = inputs.b.unwrap_or_else(|| Output::splat(dtype, [2 * Self::GATES * hidden_size], 0.0));
        let p = inputs.p.unwrap_or_else(|| Output::splat(dtype, [Self::PEEPHOLES * hidden_size], 0.0));

        Ok(Self {
            inputs: [inputs.x, inputs.w, inputs.r, inputs.h, inputs.c, b, p],
            hidden_size,
            activations,
            clip: config.clip,
            input_forget: config.input_forget,
        })
    }

    /// Validates and wraps the cell into a graph node with outputs `(H', C')`.
    pub fn build(inputs: LstmCellInputs, config: &LstmCellConfig) -> Result<Arc<Node>> {
        Ok(Self::new(inputs, config)?.into_node())
    }

    pub fn into_node(self) -> Arc<Node> {
        let outputs = self.output_types();
        Node::new(Op::LstmCell(Box::new(self)), outputs)
    }

    pub fn inputs(&self) -> &[Output] {
        &self.inputs
    }

    pub fn x(&self) -> &Output {
        &self.inputs[0]
    }

    pub fn w(&self) -> &Output {
        &self.inputs[1]
    }

    pub fn r(&self) -> &Output {
        &self.inputs[2]
    }

    pub fn h(&self) -> &Output {
        &self.inputs[3]
    }

    pub fn c(&self) -> &Output {
        &self.inputs[4]
    }

    pub fn b(&self) -> &Output {
        &self.inputs[5]
    }

    pub fn p(&self) -> &Output {
        &self.inputs[6]
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Gate, cell-input and output activations.
    pub fn activations(&self) -> &[ActivationFunction; 3] {
        &self.activations
    }

    pub fn clip(&self) -> f32 {
        self.clip
    }

    pub fn input_forget(&self) -> bool {
        self.input_forget
    }

    pub fn output_types(&self) -> [TensorType; 2] {
        let ty = TensorType::new(self.x().dtype(), [self.x().shape()[0], self.hidden_size]);
        [ty.clone(), ty]
    }

    pub(crate) fn with_inputs(&self, inputs: &[Output]) -> Result<Self> {
        let expected = Self::INPUT_NAMES.len();
        ensure!(
            inputs.len() == expected,
            InputCountMismatchSnafu { op: OpKind::LstmCell, expected, actual: inputs.len() }
        );
        validate_inputs(
            [&inputs[0], &inputs[1], &inputs[2], &inputs[3], &inputs[4]],
            Some(&inputs[5]),
            Some(&inputs[6]),
            self.hidden_size,
        )?;

        Ok(Self {
            inputs: std::array::from_fn(|i| inputs[i].clone()),
            hidden_size: self.hidden_size,
            activations: self.activations,
            clip: self.clip,
            input_forget: self.input_forget,
        })
    }

    pub(crate) fn hash_attributes<H: Hasher>(&self, state: &mut H) {
        self.hidden_size.hash(state);
        for activation in &self.activations {
            activation.kind().hash(state);
            activation.alpha().to_bits().hash(state);
            activation.beta().to_bits().hash(state);
        }
        self.clip.to_bits().hash(state);
        self.input_forget.hash(state);
    }
}

fn resolve_activations(config: &LstmCellConfig) -> Result<[ActivationFunction; 3]> {
    let names = &config.activations;
    ensure!(names.len() == 3, ActivationCountSnafu { expected: 3usize, actual: names.len() });

    let resolve = |i: usize| {
        ActivationFunction::resolve(
            &names[i],
            config.activations_alpha.get(i).copied(),
            config.activations_beta.get(i).copied(),
        )
    };
    Ok([resolve(0)?, resolve(1)?, resolve(2)?])
}

fn ensure_shape(input: &'static str, output: &Output, expected: &[usize]) -> Result<()> {
    ensure!(
        output.shape() == expected,
        InputShapeMismatchSnafu { op: OpKind::LstmCell, input, expected, actual: output.shape() }
    );
    Ok(())
}

/// Checks `[x, w, r, h, c]` and the optional bias and peepholes against each other.
fn validate_inputs(
    [x, w, r, h, c]: [&Output; 5],
    b: Option<&Output>,
    p: Option<&Output>,
    hidden_size: usize,
) -> Result<()> {
    let op = OpKind::LstmCell;
    ensure!(x.rank() == 2, InputRankMismatchSnafu { op, input: "X", expected: 2usize, actual: x.rank() });

    let dtype = x.dtype();
    ensure!(dtype.is_float(), InvalidDTypeForOpSnafu { op, dtype });

    let (batch, input_size) = (x.shape()[0], x.shape()[1]);
    let gates = LstmCell::GATES * hidden_size;

    let mut checks: Vec<(&'static str, &Output, Vec<usize>)> = vec![
        ("W", w, vec![gates, input_size]),
        ("R", r, vec![gates, hidden_size]),
        ("H_t", h, vec![batch, hidden_size]),
        ("C_t", c, vec![batch, hidden_size]),
    ];
    if let Some(b) = b {
        checks.push(("B", b, vec![2 * gates]));
    }
    if let Some(p) = p {
        checks.push(("P", p, vec![LstmCell::PEEPHOLES * hidden_size]));
    }

    for (input, output, expected) in checks {
        ensure!(
            output.dtype() == dtype,
            InputDTypeMismatchSnafu { op, input, expected: dtype, actual: output.dtype() }
        );
        ensure_shape(input, output, &expected)?;
    }
    Ok(())
}
