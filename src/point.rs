use crate::Scalar;

/// Capability required from anything stored in a [`CoverTree`](crate::CoverTree).
///
/// `distance` must be symmetric, non-negative and satisfy the triangle inequality. None of this
/// is checked; the pruning rules of the tree are only correct for a true metric.
///
/// Equality is taken from [`PartialEq`] and may be strictly finer than "distance 0": two unequal
/// points at distance 0 are stored side by side in the same node.
pub trait Point: Clone + PartialEq {
    /// Distance between `self` and `other`.
    fn distance(&self, other: &Self) -> Scalar;
}
