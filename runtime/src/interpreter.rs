//! Reference execution of primitive graphs on the host.
//!
//! Nodes run one at a time in topological order. Collectives are forwarded
//! to a [`DistributedInterface`]; every rank runs its own interpreter over
//! the same graph.

use std::collections::HashMap;
use std::fmt;

use smallvec::{SmallVec, smallvec};
use snafu::{OptionExt, ResultExt, ensure};
use tessera_distributed::DistributedInterface;
use tessera_ir::{Graph, Node, Op, Output};
use tracing::{debug, trace};

use crate::error::*;
use crate::kernels;
use crate::tensor::HostTensor;

type Values = HashMap<(u64, usize), HostTensor>;

#[derive(Default, Clone, Copy)]
pub struct Interpreter<'a> {
    distributed: Option<&'a dyn DistributedInterface>,
}

impl fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter").field("distributed", &self.distributed.map(|d| d.name())).finish()
    }
}

impl<'a> Interpreter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpreter whose collectives run on `distributed`.
    pub fn with_distributed(distributed: &'a dyn DistributedInterface) -> Self {
        Self { distributed: Some(distributed) }
    }

    /// Evaluates `graph` with `inputs` bound to its parameters, in order.
    pub fn run(&self, graph: &Graph, inputs: &[HostTensor]) -> Result<Vec<HostTensor>> {
        let parameters = graph.parameters();
        ensure!(inputs.len() == parameters.len(), InputCountSnafu { expected: parameters.len(), actual: inputs.len() });

        let mut values = Values::new();
        for (index, (parameter, input)) in parameters.iter().zip(inputs).enumerate() {
            ensure!(
                parameter.ty() == input.ty(),
                InputMismatchSnafu { index, expected: parameter.ty().clone(), actual: input.ty().clone() }
            );
            values.insert(key(parameter), input.clone());
        }

        let nodes = graph.toposort();
        debug!(nodes = nodes.len(), rank = ?self.distributed.map(|d| d.rank()), "running graph");
        for node in nodes {
            if values.contains_key(&(node.id, 0)) {
                continue;
            }
            trace!(node.id = node.id, op = %node.kind(), "evaluating node");
            let outputs = self.evaluate(&node, &values)?;
            for (index, output) in outputs.into_iter().enumerate() {
                values.insert((node.id, index), output);
            }
        }

        graph.results().iter().map(|result| lookup(&values, result).cloned()).collect()
    }

    fn evaluate(&self, node: &Node, values: &Values) -> Result<SmallVec<[HostTensor; 2]>> {
        let inputs =
            node.inputs().into_iter().map(|input| lookup(values, input)).collect::<Result<SmallVec<[_; 4]>>>()?;
        let ty = node.outputs()[0].clone();
        let out_shape = ty.shape.clone();

        let data = match node.op() {
            Op::Parameter { index } => return UnboundParameterSnafu { index: *index }.fail(),
            Op::Constant(literal) => (0..ty.num_elements()).map(|index| literal.get(index)).collect(),
            Op::Unary(op, _) => inputs[0].data().iter().map(|&x| kernels::unary(*op, x)).collect(),
            Op::Binary(op, _, _) => kernels::broadcast_binary(
                *op,
                (inputs[0].data(), inputs[0].shape().as_slice()),
                (inputs[1].data(), inputs[1].shape().as_slice()),
                &out_shape,
            ),
            Op::Clamp { min, max, .. } => inputs[0].data().iter().map(|x| x.clamp(*min, *max)).collect(),
            Op::Dot { .. } => {
                let (lhs, rhs) = (inputs[0], inputs[1]);
                kernels::matmul(lhs.data(), rhs.data(), lhs.shape()[0], lhs.shape()[1], rhs.shape()[1])
            }
            Op::Transpose { perm, .. } => kernels::transpose(inputs[0].data(), inputs[0].shape(), perm),
            Op::Reshape { .. } => return Ok(smallvec![inputs[0].reshaped(ty)?]),
            Op::Slice { begins, ends, .. } => kernels::slice(inputs[0].data(), inputs[0].shape(), begins, ends),
            Op::Concat { axis, .. } => {
                let sources: Vec<(&[f64], &[usize])> =
                    inputs.iter().map(|input| (input.data(), input.shape().as_slice())).collect();
                kernels::concat(&sources, *axis)
            }
            Op::Mvn { axes, normalize_variance, eps, .. } => {
                kernels::mvn(inputs[0].data(), inputs[0].shape(), axes, *normalize_variance, *eps)
            }
            Op::AllReduce { reduction, .. } => {
                let distributed = self.distributed(node)?;
                let src = inputs[0];
                let input = src.to_bytes();
                let mut output = vec![0u8; input.len()];
                distributed
                    .all_reduce(&input, &mut output, src.dtype(), *reduction, src.num_elements())
                    .context(DistributedSnafu)?;
                return Ok(smallvec![HostTensor::from_bytes(ty.dtype, out_shape, &output)?]);
            }
            Op::BroadcastDistributed { root, .. } => {
                let distributed = self.distributed(node)?;
                let src = inputs[0];
                let mut buf = src.to_bytes();
                distributed.broadcast(&mut buf, src.dtype(), src.num_elements(), *root).context(DistributedSnafu)?;
                return Ok(smallvec![HostTensor::from_bytes(ty.dtype, out_shape, &buf)?]);
            }
            Op::Send { dest, .. } => {
                let distributed = self.distributed(node)?;
                let src = inputs[0];
                distributed.send(&src.to_bytes(), src.dtype(), src.num_elements(), *dest).context(DistributedSnafu)?;
                return Ok(smallvec![src.clone()]);
            }
            Op::Recv { source, .. } => {
                let distributed = self.distributed(node)?;
                let mut buf = vec![0u8; ty.num_elements() * ty.dtype.bytes()];
                distributed.recv(&mut buf, ty.dtype, ty.num_elements(), *source).context(DistributedSnafu)?;
                return Ok(smallvec![HostTensor::from_bytes(ty.dtype, out_shape, &buf)?]);
            }
            Op::LstmCell(_) => return RequiresDecompositionSnafu { op: node.kind() }.fail(),
        };

        Ok(smallvec![HostTensor::from_type(ty, data)?])
    }

    fn distributed(&self, node: &Node) -> Result<&'a dyn DistributedInterface> {
        self.distributed.context(MissingDistributedContextSnafu { op: node.kind() })
    }
}

fn key(output: &Output) -> (u64, usize) {
    (output.node().id, output.index())
}

fn lookup<'v>(values: &'v Values, output: &Output) -> Result<&'v HostTensor> {
    values.get(&key(output)).context(MissingValueSnafu { node: output.node().id, index: output.index() })
}
