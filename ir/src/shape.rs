//! Static tensor shapes and NumPy-style broadcasting.

use smallvec::SmallVec;

/// Tensor shape. Rank-0 (empty) shapes denote scalars.
pub type Shape = SmallVec<[usize; 4]>;

/// Number of elements in a tensor of the given shape.
pub fn num_elements(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Broadcasts two shapes with NumPy rules: dimensions are aligned from the
/// right and must be equal or 1.
///
/// Returns `None` when the shapes are incompatible.
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Option<Shape> {
    let rank = lhs.len().max(rhs.len());
    let dim = |shape: &[usize], axis: usize| {
        let offset = rank - shape.len();
        if axis < offset { 1 } else { shape[axis - offset] }
    };

    (0..rank)
        .map(|axis| match (dim(lhs, axis), dim(rhs, axis)) {
            (a, b) if a == b => Some(a),
            (1, b) => Some(b),
            (a, 1) => Some(a),
            _ => None,
        })
        .collect()
}

/// Row-major strides, in elements.
pub fn strides(shape: &[usize]) -> Shape {
    let mut strides: Shape = smallvec::smallvec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Whether `perm` is a permutation of `0..rank`.
pub fn is_permutation(perm: &[usize], rank: usize) -> bool {
    if perm.len() != rank {
        return false;
    }
    let mut seen = vec![false; rank];
    perm.iter().all(|&axis| axis < rank && !std::mem::replace(&mut seen[axis], true))
}
