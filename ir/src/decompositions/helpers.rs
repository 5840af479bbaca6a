//! Building blocks shared by decompositions.

use smallvec::smallvec;
use snafu::ensure;

use crate::error::*;
use crate::node::Output;
use crate::shape::Shape;

/// Clamps `x` to `[-clip, clip]`. A zero bound leaves `x` untouched.
pub fn clip(x: &Output, clip: f32) -> Result<Output> {
    if clip == 0.0 {
        return Ok(x.clone());
    }
    let bound = clip as f64;
    x.try_clamp(-bound, bound)
}

/// Splits `x` into `N` equal slices along `axis`.
pub fn split<const N: usize>(x: &Output, axis: usize) -> Result<[Output; N]> {
    let rank = x.rank();
    ensure!(axis < rank, AxisOutOfRangeSnafu { axis, rank });
    let chunk = x.shape()[axis] / N;

    let mut begins: Shape = smallvec![0; rank];
    let mut ends: Shape = x.shape().into();
    let mut parts = Vec::with_capacity(N);
    for part in 0..N {
        begins[axis] = part * chunk;
        ends[axis] = (part + 1) * chunk;
        parts.push(x.try_slice(&begins, &ends)?);
    }
    Ok(parts.try_into().unwrap_or_else(|_: Vec<Output>| unreachable!("split produced exactly {N} parts")))
}

/// `1 - x`, broadcasting a scalar one.
pub fn one_minus(x: &Output) -> Result<Output> {
    Output::scalar(x.dtype(), 1.0).try_sub(x)
}
