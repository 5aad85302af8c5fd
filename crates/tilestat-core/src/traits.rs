//! Core traits shared by all aggregates

use crate::Result;

/// An aggregate that can be merged with another instance of itself
///
/// `fold` combines two aggregates built over disjoint sets of samples into a
/// new aggregate equivalent to one built over their union. Operands are
/// never modified and the result shares no state with them.
///
/// Implementations must be commutative and associative up to floating point
/// rounding, so that a left fold over partitions and a balanced tree
/// reduction give the same answer. An error is returned only when the
/// operands are provably incompatible (different bucketing strategies,
/// different component counts).
pub trait Foldable: Sized {
    /// Merge `self` with `other` into a new aggregate
    fn fold(&self, other: &Self) -> Result<Self>;
}
