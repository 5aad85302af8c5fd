//! Operations on histograms
//!
//! These produce new aggregates for reporting. None of them should run
//! before a fold: dropping empty or unmatched buckets loses information a
//! later merge would need.

use crate::types::{Bucket, Histogram};
use tilestat_bucketing::{check_ranges, intersects_any};
use tilestat_core::{Result, ScalarStats};

/// Operations that can be performed on histograms and histogram collections
pub trait HistogramOps: Sized {
    /// Aggregate produced by [`summarise`](HistogramOps::summarise)
    type Summary;

    /// Copy without empty buckets
    fn optimise(&self) -> Self;

    /// Collapse into a single summary over every value
    fn summarise(&self) -> Self::Summary;

    /// Keep only buckets overlapping one of the ranges `[lower[i], upper[i])`
    ///
    /// Fails when the two bound lists differ in length.
    fn filter_by_range(&self, lower: &[f64], upper: &[f64]) -> Result<Self>;

    /// Keep only buckets that contain one of the given values
    fn filter_by_value(&self, values: &[f64]) -> Self;
}

impl HistogramOps for Histogram {
    type Summary = ScalarStats;

    fn optimise(&self) -> Self {
        self.retain(|b| b.count() > 0)
    }

    fn summarise(&self) -> ScalarStats {
        self.buckets()
            .iter()
            .filter(|b| b.count() > 0)
            .fold(ScalarStats::new(), |acc, b| acc.fold(b.stats()))
    }

    fn filter_by_range(&self, lower: &[f64], upper: &[f64]) -> Result<Self> {
        check_ranges(lower, upper)?;
        Ok(self.retain(|b| intersects_any((b.lower(), b.upper()), lower, upper)))
    }

    fn filter_by_value(&self, values: &[f64]) -> Self {
        self.retain(|b| values.iter().any(|&v| b.can_contain(v)))
    }
}

impl Histogram {
    fn retain<F: Fn(&Bucket) -> bool>(&self, keep: F) -> Histogram {
        let buckets = self.buckets().iter().filter(|b| keep(b)).copied().collect();
        Histogram::from_sorted(self.strategy().clone(), buckets)
    }
}
