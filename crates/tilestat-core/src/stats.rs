//! Running scalar statistics
//!
//! [`ScalarStats`] keeps count, extrema, mean and the sum of squared
//! deviations (`m2`) of a stream of samples in O(1) memory. Samples are added
//! one at a time with Welford's update, and two independently accumulated
//! instances are merged with the parallel algorithm of Chan et al.

use crate::sample::is_valid;
use crate::traits::Foldable;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this many samples, or below a tenth of the other operand's count, a
/// fold operand is treated as a small contribution and the mean is updated
/// incrementally instead of as a weighted average.
const SMALL_CONTRIBUTION: u64 = 10;

/// Online min/max/mean/variance over a stream of `f64` samples
///
/// # Example
///
/// ```rust
/// use tilestat_core::ScalarStats;
///
/// let mut stats = ScalarStats::new();
/// for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     stats.update(x);
/// }
/// assert_eq!(stats.count(), 8);
/// assert_eq!(stats.mean(), 5.0);
/// assert!((stats.stddev() - 2.138089935).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "StatsRecord", from = "StatsRecord")]
pub struct ScalarStats {
    count: u64,
    min: f64,
    max: f64,
    mean: f64,
    // m2 = variance * (count - 1)
    m2: f64,
}

impl Default for ScalarStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarStats {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self {
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Rebuild statistics from previously persisted parts
    ///
    /// A zero count always yields the canonical empty state, whatever the
    /// other arguments are.
    pub fn from_parts(count: u64, min: f64, max: f64, mean: f64, m2: f64) -> Self {
        if count == 0 {
            return Self::new();
        }
        Self {
            count,
            min,
            max,
            mean,
            m2,
        }
    }

    /// Add one observation
    ///
    /// Non-finite values (raster no-data) are ignored.
    pub fn update(&mut self, value: f64) {
        if !is_valid(value) {
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        // Welford's online update
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Combine with statistics accumulated over a disjoint set of samples
    ///
    /// Neither operand is modified.
    pub fn fold(&self, other: &Self) -> Self {
        let n = self.count + other.count;
        if n == 0 {
            return Self::new();
        }
        if other.count == 0 {
            return *self;
        }
        if self.count == 0 {
            return *other;
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n_x = n as f64;

        let delta = other.mean - self.mean;
        let mean = if other.count < SMALL_CONTRIBUTION || other.count < self.count / 10 {
            // meanX = meanA + delta * nB/nX
            self.mean + delta * (n_b / n_x)
        } else {
            // meanX = (nA * meanA + nB * meanB) / nX
            (self.mean * n_a + other.mean * n_b) / n_x
        };

        let m2 = self.m2 + other.m2 + delta * delta * (n_a * n_b / n_x);

        Self {
            count: n,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            mean,
            m2,
        }
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Check whether no observations have been made
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Smallest observation, `+inf` when empty
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observation, `-inf` when empty
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Arithmetic mean, `0.0` when empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sum of squared deviations from the mean
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// Sum of all observations
    pub fn sum(&self) -> f64 {
        self.mean * self.count as f64
    }

    /// Sample variance
    ///
    /// NaN when fewer than two samples were observed; this signals
    /// insufficient data rather than an error.
    pub fn variance(&self) -> f64 {
        if self.count <= 1 {
            return f64::NAN;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Sample standard deviation, NaN when `count <= 1`
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl Foldable for ScalarStats {
    fn fold(&self, other: &Self) -> Result<Self> {
        Ok(ScalarStats::fold(self, other))
    }
}

impl fmt::Display for ScalarStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n: {}, min: {}, max: {}, mean: {}, stddev: {}",
            self.count,
            self.min,
            self.max,
            self.mean,
            self.stddev()
        )
    }
}

/// Flat persisted form of [`ScalarStats`]
///
/// Extrema of empty statistics are infinite, which JSON cannot carry, so they
/// are stored as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StatsRecord {
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
    mean: f64,
    m2: f64,
}

impl From<ScalarStats> for StatsRecord {
    fn from(stats: ScalarStats) -> Self {
        let finite = |v: f64| if v.is_finite() { Some(v) } else { None };
        Self {
            count: stats.count,
            min: finite(stats.min),
            max: finite(stats.max),
            mean: stats.mean,
            m2: stats.m2,
        }
    }
}

impl From<StatsRecord> for ScalarStats {
    fn from(record: StatsRecord) -> Self {
        ScalarStats::from_parts(
            record.count,
            record.min.unwrap_or(f64::INFINITY),
            record.max.unwrap_or(f64::NEG_INFINITY),
            record.mean,
            record.m2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn build(values: &[f64]) -> ScalarStats {
        let mut stats = ScalarStats::new();
        for &v in values {
            stats.update(v);
        }
        stats
    }

    #[test]
    fn test_empty_state() {
        let stats = ScalarStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min(), f64::INFINITY);
        assert_eq!(stats.max(), f64::NEG_INFINITY);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.m2(), 0.0);
        assert!(stats.stddev().is_nan());
    }

    #[test]
    fn test_update() {
        let stats = build(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(stats.count(), 5);
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 5.0);
        assert_relative_eq!(stats.mean(), 3.0);
        assert_relative_eq!(stats.variance(), 2.5);
        assert_relative_eq!(stats.sum(), 15.0);
    }

    #[test]
    fn test_invalid_samples_are_skipped() {
        let stats = build(&[1.0, f64::NAN, 3.0, f64::INFINITY, f64::NEG_INFINITY]);
        assert_eq!(stats.count(), 2);
        assert_relative_eq!(stats.mean(), 2.0);
        assert_eq!(stats.max(), 3.0);
    }

    #[test]
    fn test_single_sample_stddev_is_nan() {
        let stats = build(&[42.0]);
        assert_eq!(stats.count(), 1);
        assert!(stats.stddev().is_nan());
    }

    #[test]
    fn test_fold_matches_serial() {
        let values: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.37).sin() * 100.0).collect();
        let serial = build(&values);

        for split in [1, 5, 9, 10, 11, 100, 500, 999] {
            let left = build(&values[..split]);
            let right = build(&values[split..]);
            let folded = ScalarStats::fold(&left, &right);
            assert_eq!(folded.count(), serial.count());
            assert_eq!(folded.min(), serial.min());
            assert_eq!(folded.max(), serial.max());
            assert_relative_eq!(folded.mean(), serial.mean(), max_relative = 1e-9);
            assert_relative_eq!(folded.stddev(), serial.stddev(), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_fold_with_empty() {
        let stats = build(&[1.0, 2.0, 3.0]);
        let empty = ScalarStats::new();
        assert_eq!(ScalarStats::fold(&stats, &empty), stats);
        assert_eq!(ScalarStats::fold(&empty, &stats), stats);
        assert_eq!(ScalarStats::fold(&empty, &empty), ScalarStats::new());
    }

    #[test]
    fn test_fold_with_self_doubles_count() {
        let stats = build(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0, 8.0]);
        let doubled = ScalarStats::fold(&stats, &stats);
        assert_eq!(doubled.count(), 2 * stats.count());
        assert_eq!(doubled.min(), stats.min());
        assert_eq!(doubled.max(), stats.max());
        assert_relative_eq!(doubled.mean(), stats.mean(), max_relative = 1e-12);
    }

    #[test]
    fn test_fold_is_commutative() {
        let a = build(&[1.0, 2.0, 3.0, 100.0]);
        let b = build(&(0..50).map(|i| i as f64).collect::<Vec<_>>());
        let ab = ScalarStats::fold(&a, &b);
        let ba = ScalarStats::fold(&b, &a);
        assert_eq!(ab.count(), ba.count());
        assert_relative_eq!(ab.mean(), ba.mean(), max_relative = 1e-12);
        assert_relative_eq!(ab.m2(), ba.m2(), max_relative = 1e-12);
    }

    #[test]
    fn test_serde_round_trip_of_empty_stats() {
        let json = serde_json::to_string(&ScalarStats::new()).unwrap();
        assert!(json.contains("\"min\":null"));
        let back: ScalarStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScalarStats::new());
    }
}
