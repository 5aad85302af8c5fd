//! Reduction of per-partition partials
//!
//! Partials computed independently over partitions are combined here either
//! with a left fold or with a balanced binary tree. Both give the same
//! result up to floating point rounding.

use crate::traits::Foldable;
use crate::Result;

/// Left fold over the partials, `None` when there are none
pub fn fold_sequential<T: Foldable + Clone>(partials: &[T]) -> Result<Option<T>> {
    let Some((first, rest)) = partials.split_first() else {
        return Ok(None);
    };
    log::trace!("sequential fold over {} partials", partials.len());

    let mut acc = first.clone();
    for partial in rest {
        acc = acc.fold(partial)?;
    }
    Ok(Some(acc))
}

/// Balanced binary tree reduction over the partials, `None` when there are none
pub fn fold_tree<T: Foldable + Clone>(partials: &[T]) -> Result<Option<T>> {
    if partials.is_empty() {
        return Ok(None);
    }
    log::trace!("tree fold over {} partials", partials.len());
    fold_range(partials).map(Some)
}

fn fold_range<T: Foldable + Clone>(partials: &[T]) -> Result<T> {
    match partials {
        [single] => Ok(single.clone()),
        [a, b] => a.fold(b),
        _ => {
            let (left, right) = partials.split_at(partials.len() / 2);
            fold_range(left)?.fold(&fold_range(right)?)
        }
    }
}

/// Tree reduction on the rayon thread pool
#[cfg(feature = "parallel")]
pub fn fold_tree_parallel<T>(partials: &[T]) -> Result<Option<T>>
where
    T: Foldable + Clone + Send + Sync,
{
    use rayon::prelude::*;

    log::trace!("parallel fold over {} partials", partials.len());
    partials
        .par_iter()
        .map(|p| Ok(p.clone()))
        .try_reduce_with(|a: T, b: T| a.fold(&b))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ScalarStats};
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Tally(Vec<u32>);

    impl Foldable for Tally {
        fn fold(&self, other: &Self) -> Result<Self> {
            if self.0.len() != other.0.len() {
                return Err(Error::component_mismatch(self.0.len(), other.0.len(), "Tally"));
            }
            Ok(Tally(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect()))
        }
    }

    #[test]
    fn test_empty_input() {
        let none: Vec<ScalarStats> = Vec::new();
        assert!(fold_sequential(&none).unwrap().is_none());
        assert!(fold_tree(&none).unwrap().is_none());
    }

    #[test]
    fn test_sequential_and_tree_agree() {
        let partials: Vec<ScalarStats> = (0..7)
            .map(|p| {
                let mut s = ScalarStats::new();
                for i in 0..(p * 13 + 1) {
                    s.update((i as f64 * 1.7 + p as f64).cos() * 50.0);
                }
                s
            })
            .collect();

        let seq = fold_sequential(&partials).unwrap().unwrap();
        let tree = fold_tree(&partials).unwrap().unwrap();
        assert_eq!(seq.count(), tree.count());
        assert_eq!(seq.min(), tree.min());
        assert_eq!(seq.max(), tree.max());
        assert_relative_eq!(seq.mean(), tree.mean(), max_relative = 1e-9);
        assert_relative_eq!(seq.stddev(), tree.stddev(), max_relative = 1e-9);
    }

    #[test]
    fn test_error_propagates() {
        let partials = vec![Tally(vec![1, 2]), Tally(vec![3, 4]), Tally(vec![5])];
        assert!(fold_sequential(&partials).is_err());
        assert!(fold_tree(&partials).is_err());

        let ok = vec![Tally(vec![1, 2]), Tally(vec![3, 4]), Tally(vec![5, 6])];
        assert_eq!(fold_tree(&ok).unwrap(), Some(Tally(vec![9, 12])));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_tree() {
        let partials: Vec<Tally> = (0..100).map(|i| Tally(vec![i, 1])).collect();
        assert_eq!(
            fold_tree_parallel(&partials).unwrap(),
            fold_tree(&partials).unwrap()
        );
    }
}
