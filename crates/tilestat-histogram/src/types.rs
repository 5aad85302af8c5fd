//! Core types for histogram representation

use serde::{Deserialize, Serialize};
use std::fmt;
use tilestat_bucketing::BucketingStrategy;
use tilestat_core::{is_valid, Error, Foldable, Result, ScalarStats};

/// Relative tolerance used to match values against single-point buckets
pub const CATEGORICAL_EPSILON: f64 = 1e-9;

/// A bucket: a half-open range `[lower, upper)` and the statistics of the
/// values that fell in it
///
/// A bucket with `lower == upper` holds a single category value and matches
/// values within a relative tolerance of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "BucketRecord", from = "BucketRecord")]
pub struct Bucket {
    lower: f64,
    upper: f64,
    stats: ScalarStats,
}

impl Bucket {
    /// Create an empty bucket
    pub fn new(lower: f64, upper: f64) -> Self {
        Self::with_stats(lower, upper, ScalarStats::new())
    }

    /// Create a bucket from bounds and previously accumulated statistics
    pub fn with_stats(lower: f64, upper: f64, stats: ScalarStats) -> Self {
        debug_assert!(!(lower > upper), "bucket bounds out of order: {lower} > {upper}");
        Self { lower, upper, stats }
    }

    /// Lower edge (inclusive)
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper edge (exclusive)
    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn stats(&self) -> &ScalarStats {
        &self.stats
    }

    /// Number of values in this bucket
    pub fn count(&self) -> u64 {
        self.stats.count()
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check if this is a single-point (categorical) bucket
    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }

    /// Check if a value belongs in this bucket
    pub fn can_contain(&self, value: f64) -> bool {
        if self.is_point() {
            if !value.is_finite() || !self.lower.is_finite() {
                return value == self.lower;
            }
            let epsilon = CATEGORICAL_EPSILON * self.lower.abs();
            return value >= self.lower - epsilon && value <= self.lower + epsilon;
        }
        value >= self.lower && value < self.upper
    }

    /// Check if two buckets overlap
    ///
    /// Touching half-open buckets do not overlap. A single-point bucket
    /// overlaps another bucket when the other can contain its value.
    pub fn intersects(&self, other: &Bucket) -> bool {
        if self.is_point() {
            return other.can_contain(self.lower);
        }
        if other.is_point() {
            return self.can_contain(other.lower);
        }
        !(other.lower >= self.upper || other.upper <= self.lower)
    }

    /// Add a value to the bucket's statistics
    pub fn update(&mut self, value: f64) {
        self.stats.update(value);
    }

    /// Combine two buckets into one spanning both
    ///
    /// Two point buckets within tolerance of each other stay a point bucket
    /// at the lower of the two values.
    pub fn fold(&self, other: &Bucket) -> Bucket {
        let lower = self.lower.min(other.lower);
        let upper = if self.is_point() && other.is_point() && self.intersects(other) {
            lower
        } else {
            self.upper.max(other.upper)
        };
        Bucket {
            lower,
            upper,
            stats: self.stats.fold(&other.stats),
        }
    }
}

impl Foldable for Bucket {
    fn fold(&self, other: &Self) -> Result<Self> {
        Ok(Bucket::fold(self, other))
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}): count={}", self.lower, self.upper, self.count())
    }
}

/// Persisted form of [`Bucket`]; infinite outer edges are stored as `None`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BucketRecord {
    lower: Option<f64>,
    upper: Option<f64>,
    stats: ScalarStats,
}

impl From<Bucket> for BucketRecord {
    fn from(bucket: Bucket) -> Self {
        Self {
            lower: bucket.lower.is_finite().then_some(bucket.lower),
            upper: bucket.upper.is_finite().then_some(bucket.upper),
            stats: bucket.stats,
        }
    }
}

impl From<BucketRecord> for Bucket {
    fn from(record: BucketRecord) -> Self {
        Bucket {
            lower: record.lower.unwrap_or(f64::NEG_INFINITY),
            upper: record.upper.unwrap_or(f64::INFINITY),
            stats: record.stats,
        }
    }
}

/// A histogram whose buckets are created on demand by a bucketing strategy
///
/// Buckets are kept sorted by lower bound and never overlap. The index of
/// the most recently updated bucket is remembered, since raster data tends
/// to repeat nearby values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    strategy: BucketingStrategy,
    buckets: Vec<Bucket>,
    #[serde(skip)]
    mru: Option<usize>,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(BucketingStrategy::default())
    }
}

impl PartialEq for Histogram {
    fn eq(&self, other: &Self) -> bool {
        self.strategy == other.strategy && self.buckets == other.buckets
    }
}

impl Histogram {
    /// Create an empty histogram
    pub fn new(strategy: BucketingStrategy) -> Self {
        Self {
            strategy,
            buckets: Vec::new(),
            mru: None,
        }
    }

    /// Assemble a histogram from buckets already sorted and disjoint
    pub(crate) fn from_sorted(strategy: BucketingStrategy, buckets: Vec<Bucket>) -> Self {
        Self {
            strategy,
            buckets,
            mru: None,
        }
    }

    pub fn strategy(&self) -> &BucketingStrategy {
        &self.strategy
    }

    /// Get the buckets, sorted by lower bound
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Get the number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the histogram has no buckets
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of values across all buckets
    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(Bucket::count).sum()
    }

    /// Find the bucket that holds `value`, if it has been created
    pub fn find_bucket(&self, value: f64) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.can_contain(value))
    }

    /// Add a value, creating its bucket if needed
    ///
    /// Non-finite values are ignored.
    pub fn update(&mut self, value: f64) {
        if !is_valid(value) {
            return;
        }

        if let Some(i) = self.mru {
            if let Some(bucket) = self.buckets.get_mut(i) {
                if bucket.can_contain(value) {
                    bucket.update(value);
                    return;
                }
            }
        }

        let mut insert_at = self.buckets.len();
        for (i, bucket) in self.buckets.iter_mut().enumerate() {
            if bucket.can_contain(value) {
                bucket.update(value);
                self.mru = Some(i);
                return;
            }
            if bucket.lower() > value {
                insert_at = i;
                break;
            }
        }

        let (lower, upper) = self.strategy.compute_bucket_bounds(value);
        log::trace!("new bucket [{lower}, {upper}) for {value}");
        let mut bucket = Bucket::new(lower, upper);
        bucket.update(value);
        self.buckets.insert(insert_at, bucket);
        self.mru = Some(insert_at);
    }

    /// Combine with a histogram accumulated over other samples
    ///
    /// Both histograms must share a bucketing strategy, unless one of them
    /// has no buckets at all. Buckets are merged in lower-bound order and
    /// overlapping buckets coalesce.
    pub fn fold(&self, other: &Histogram) -> Result<Histogram> {
        if self.strategy != other.strategy {
            if self.is_empty() {
                return Ok(Histogram::from_sorted(other.strategy.clone(), other.buckets.clone()));
            }
            if !other.is_empty() {
                log::warn!(
                    "refusing to fold histograms with strategies {} and {}",
                    self.strategy,
                    other.strategy
                );
                return Err(Error::incompatible_strategies(
                    "Histogram fold",
                    &self.strategy.to_string(),
                    &other.strategy.to_string(),
                ));
            }
        }
        Ok(self.merge(other))
    }

    /// Merge buckets without checking strategies
    pub(crate) fn merge(&self, other: &Histogram) -> Histogram {
        Histogram::from_sorted(
            self.strategy.clone(),
            merge_buckets(&self.buckets, &other.buckets),
        )
    }
}

impl Foldable for Histogram {
    fn fold(&self, other: &Self) -> Result<Self> {
        Histogram::fold(self, other)
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Histogram ({}, {} buckets)", self.strategy, self.len())?;
        for bucket in &self.buckets {
            writeln!(f, "  {bucket}")?;
        }
        Ok(())
    }
}

/// Merge two sorted bucket lists, coalescing buckets that overlap
fn merge_buckets(a: &[Bucket], b: &[Bucket]) -> Vec<Bucket> {
    let mut merged: Vec<Bucket> = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        let next = if j >= b.len() || (i < a.len() && a[i].lower() <= b[j].lower()) {
            i += 1;
            a[i - 1]
        } else {
            j += 1;
            b[j - 1]
        };

        match merged.last_mut() {
            Some(last) if last.intersects(&next) => *last = last.fold(&next),
            _ => merged.push(next),
        }
    }

    merged
}
