//! Reference kernels over row-major `f64` buffers.
//!
//! Kernels compute in `f64`; callers round results to the output element type.

use tessera_ir::shape::{num_elements, strides};
use tessera_ir::{BinaryOp, UnaryOp};

pub fn unary(op: UnaryOp, x: f64) -> f64 {
    match op {
        UnaryOp::Neg => -x,
        UnaryOp::Abs => x.abs(),
        UnaryOp::Exp => x.exp(),
        UnaryOp::Log => x.ln(),
        UnaryOp::Sqrt => x.sqrt(),
        UnaryOp::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        UnaryOp::Tanh => x.tanh(),
        UnaryOp::Relu => x.max(0.0),
    }
}

pub fn binary(op: BinaryOp, lhs: f64, rhs: f64) -> f64 {
    match op {
        BinaryOp::Add => lhs + rhs,
        BinaryOp::Sub => lhs - rhs,
        BinaryOp::Mul => lhs * rhs,
        BinaryOp::Div => lhs / rhs,
        BinaryOp::Maximum => lhs.max(rhs),
        BinaryOp::Minimum => lhs.min(rhs),
    }
}

/// Coordinates of row-major index `linear` in `shape`.
fn unravel(mut linear: usize, shape: &[usize], coords: &mut [usize]) {
    for axis in (0..shape.len()).rev() {
        coords[axis] = linear % shape[axis];
        linear /= shape[axis];
    }
}

/// For every element of `out`, the index of the `src` element broadcast to it.
pub fn broadcast_indices(out: &[usize], src: &[usize]) -> Vec<usize> {
    let src_strides = strides(src);
    let offset = out.len() - src.len();
    let mut coords = vec![0; out.len()];
    (0..num_elements(out))
        .map(|linear| {
            unravel(linear, out, &mut coords);
            src.iter()
                .zip(&src_strides)
                .enumerate()
                .filter(|&(_, (&size, _))| size != 1)
                .map(|(axis, (_, &stride))| coords[axis + offset] * stride)
                .sum()
        })
        .collect()
}

pub fn broadcast_binary(
    op: BinaryOp,
    (lhs, lhs_shape): (&[f64], &[usize]),
    (rhs, rhs_shape): (&[f64], &[usize]),
    out: &[usize],
) -> Vec<f64> {
    let lhs_indices = broadcast_indices(out, lhs_shape);
    let rhs_indices = broadcast_indices(out, rhs_shape);
    lhs_indices.into_iter().zip(rhs_indices).map(|(l, r)| binary(op, lhs[l], rhs[r])).collect()
}

/// `[m, k] x [k, n] -> [m, n]`.
pub fn matmul(lhs: &[f64], rhs: &[f64], m: usize, k: usize, n: usize) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    for row in 0..m {
        for inner in 0..k {
            let a = lhs[row * k + inner];
            for col in 0..n {
                out[row * n + col] += a * rhs[inner * n + col];
            }
        }
    }
    out
}

/// Output axis `i` is input axis `perm[i]`.
pub fn transpose(src: &[f64], shape: &[usize], perm: &[usize]) -> Vec<f64> {
    let src_strides = strides(shape);
    let out_shape: Vec<usize> = perm.iter().map(|&axis| shape[axis]).collect();
    let mut coords = vec![0; shape.len()];
    (0..src.len())
        .map(|linear| {
            unravel(linear, &out_shape, &mut coords);
            coords.iter().zip(perm).map(|(&coord, &axis)| coord * src_strides[axis]).sum::<usize>()
        })
        .map(|index| src[index])
        .collect()
}

pub fn slice(src: &[f64], shape: &[usize], begins: &[usize], ends: &[usize]) -> Vec<f64> {
    let src_strides = strides(shape);
    let out_shape: Vec<usize> = begins.iter().zip(ends).map(|(begin, end)| end - begin).collect();
    let mut coords = vec![0; shape.len()];
    (0..num_elements(&out_shape))
        .map(|linear| {
            unravel(linear, &out_shape, &mut coords);
            let index: usize = coords.iter().zip(begins).zip(&src_strides).map(|((c, b), s)| (c + b) * s).sum();
            src[index]
        })
        .collect()
}

/// Concatenates `(data, shape)` pairs along `axis`.
pub fn concat(sources: &[(&[f64], &[usize])], axis: usize) -> Vec<f64> {
    let Some(&(_, first)) = sources.first() else { return Vec::new() };
    let outer = num_elements(&first[..axis]);
    let total = sources.iter().map(|(data, _)| data.len()).sum();

    let mut out = Vec::with_capacity(total);
    for block in 0..outer {
        for (data, shape) in sources {
            let chunk = num_elements(&shape[axis..]);
            out.extend_from_slice(&data[block * chunk..(block + 1) * chunk]);
        }
    }
    out
}

/// `(x - mean) / sqrt(var + eps)` with statistics over `axes`; the division
/// is skipped when `normalize_variance` is false.
pub fn mvn(src: &[f64], shape: &[usize], axes: &[usize], normalize_variance: bool, eps: f64) -> Vec<f64> {
    let reduced: Vec<usize> =
        shape.iter().enumerate().map(|(axis, &size)| if axes.contains(&axis) { 1 } else { size }).collect();
    let groups = broadcast_indices(shape, &reduced);
    let group_count = num_elements(&reduced);
    let group_size = (src.len() / group_count.max(1)).max(1) as f64;

    let mut mean = vec![0.0; group_count];
    for (&value, &group) in src.iter().zip(&groups) {
        mean[group] += value;
    }
    mean.iter_mut().for_each(|sum| *sum /= group_size);
    let centered: Vec<f64> = src.iter().zip(&groups).map(|(&value, &group)| value - mean[group]).collect();
    if !normalize_variance {
        return centered;
    }

    let mut variance = vec![0.0; group_count];
    for (&value, &group) in centered.iter().zip(&groups) {
        variance[group] += value * value;
    }
    variance.iter_mut().for_each(|sum| *sum /= group_size);
    centered.iter().zip(&groups).map(|(&value, &group)| value / (variance[group] + eps).sqrt()).collect()
}
