use test_case::test_case;

use crate::shape::{broadcast_shapes, is_permutation, num_elements, strides};

#[test_case(&[2, 3], &[2, 3], Some(vec![2, 3]); "same")]
#[test_case(&[2, 3], &[3], Some(vec![2, 3]); "trailing")]
#[test_case(&[2, 1], &[1, 4], Some(vec![2, 4]); "ones")]
#[test_case(&[], &[5, 2], Some(vec![5, 2]); "scalar")]
#[test_case(&[2, 3], &[4], None; "incompatible")]
fn test_broadcast_shapes(lhs: &[usize], rhs: &[usize], expected: Option<Vec<usize>>) {
    assert_eq!(broadcast_shapes(lhs, rhs).map(|shape| shape.to_vec()), expected);
}

#[test]
fn test_strides() {
    assert_eq!(strides(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
    assert!(strides(&[]).is_empty());
}

#[test]
fn test_num_elements() {
    assert_eq!(num_elements(&[2, 3, 4]), 24);
    assert_eq!(num_elements(&[]), 1);
}

#[test_case(&[1, 0], 2, true; "swap")]
#[test_case(&[0, 0], 2, false; "repeat")]
#[test_case(&[0, 2], 2, false; "out_of_range")]
#[test_case(&[0], 2, false; "short")]
fn test_is_permutation(perm: &[usize], rank: usize, expected: bool) {
    assert_eq!(is_permutation(perm, rank), expected);
}
