//! Logarithmic bucketing families
//!
//! All three strategies here enumerate their bucket boundaries with an
//! integer index `i` and a monotone function `lower_bound(i)`. The bucket of
//! index `i` is `[lower_bound(i), lower_bound(i + 1))`, so neighbouring
//! buckets always share the exact same `f64` boundary.
//!
//! Values in `[0, scale)` fall in the bucket `[0, scale)`. Negative values
//! are mapped through their magnitude onto the mirrored bucket, with the
//! inequalities flipped so the mirrored bucket is still closed on its lower
//! end.

use tilestat_core::{Error, Result};

/// Slack added to the estimated bucket index before truncation
const INDEX_EPSILON: f64 = 1e-9;

/// Boundary enumeration shared by the logarithmic families
trait IndexedBounds {
    /// Lower bound of bucket `index` for `index >= 0`
    fn lower_bound(&self, index: i64) -> f64;

    /// Estimate of the index of the bucket holding `magnitude >= scale`
    ///
    /// The estimate may be off after rounding, or far off once lower bounds
    /// overflow; callers correct it against `lower_bound`.
    fn index_estimate(&self, magnitude: f64) -> i64;
}

/// Index bound keeping `index + 1` exact in both `i64` and `f64`
const MAX_INDEX: i64 = 1 << 53;

/// Single steps tried around the estimate before falling back to bisection
const CORRECTION_STEPS: usize = 2;

/// Largest `i >= 0` for which `fits(i)` holds, given that `fits(0)` does and
/// `fits` is monotone (true up to some index, false after it)
fn locate<F: Fn(i64) -> bool>(estimate: i64, fits: F) -> i64 {
    let mut i = estimate.clamp(0, MAX_INDEX);
    for _ in 0..CORRECTION_STEPS {
        if i > 0 && !fits(i) {
            i -= 1;
        } else if i < MAX_INDEX && fits(i + 1) {
            i += 1;
        } else {
            return i;
        }
    }

    // the estimate was far off, e.g. lower bounds overflowing to infinity
    let (mut lo, mut hi) = (0, i.max(1));
    while fits(hi) {
        if hi == MAX_INDEX {
            return hi;
        }
        lo = hi;
        hi = hi.saturating_mul(2).min(MAX_INDEX);
    }
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}

fn indexed_bounds<B: IndexedBounds>(buckets: &B, value: f64) -> (f64, f64) {
    let first = buckets.lower_bound(0);

    if value >= 0.0 {
        if value < first {
            return (0.0, first);
        }
        // lower_bound(i) <= value < lower_bound(i + 1)
        let i = locate(buckets.index_estimate(value), |i| {
            buckets.lower_bound(i) <= value
        });
        (buckets.lower_bound(i), buckets.lower_bound(i + 1))
    } else {
        let magnitude = -value;
        if magnitude <= first {
            return (-first, 0.0);
        }
        // lower_bound(i) < magnitude <= lower_bound(i + 1)
        let i = locate(buckets.index_estimate(magnitude), |i| {
            buckets.lower_bound(i) < magnitude
        });
        (-buckets.lower_bound(i + 1), -buckets.lower_bound(i))
    }
}

/// `log_base(magnitude / scale)` without overflowing the quotient
fn scaled_log(magnitude: f64, base: f64, scale: f64) -> f64 {
    (magnitude.ln() - scale.ln()) / base.ln()
}

fn check_common(base: f64, n: u32, scale: f64) -> Result<()> {
    if !base.is_finite() || base <= 1.0 {
        return Err(Error::InvalidParameter(format!(
            "base must be finite and greater than 1, got {base}"
        )));
    }
    if n < 1 {
        return Err(Error::InvalidParameter(
            "number of sub-buckets must be at least 1".to_string(),
        ));
    }
    if !scale.is_finite() || scale < f64::MIN_POSITIVE {
        return Err(Error::InvalidParameter(format!(
            "scale must be finite and positive, got {scale}"
        )));
    }
    Ok(())
}

/// Geometric buckets: `n` buckets per power of `base`
///
/// Bucket `i` starts at `base^(i/n) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogBuckets {
    base: f64,
    n: u32,
    scale: f64,
}

impl Default for LogBuckets {
    fn default() -> Self {
        Self {
            base: 10.0,
            n: 3,
            scale: 0.1,
        }
    }
}

impl LogBuckets {
    pub fn new(base: f64, n: u32, scale: f64) -> Result<Self> {
        let buckets = Self { base, n, scale };
        buckets.validate()?;
        Ok(buckets)
    }

    pub fn validate(&self) -> Result<()> {
        check_common(self.base, self.n, self.scale)
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Bounds of the bucket holding a finite `value`
    pub fn bounds(&self, value: f64) -> (f64, f64) {
        indexed_bounds(self, value)
    }
}

impl IndexedBounds for LogBuckets {
    fn lower_bound(&self, index: i64) -> f64 {
        self.base.powf(index as f64 / self.n as f64) * self.scale
    }

    fn index_estimate(&self, magnitude: f64) -> i64 {
        let log = scaled_log(magnitude, self.base, self.scale);
        (log * self.n as f64 + INDEX_EPSILON).floor() as i64
    }
}

/// Each power of `base` split into `n` equal-width buckets
///
/// The sub-buckets of order `d` are aligned on multiples of
/// `scale * base^(d+1) / n`, so the first bucket of every order is narrower
/// than the others: `[scale * base^d, scale * base^(d+1) / n)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRegularBuckets {
    base: f64,
    n: u32,
    scale: f64,
}

impl Default for LogRegularBuckets {
    fn default() -> Self {
        Self {
            base: 10.0,
            n: 5,
            scale: 0.1,
        }
    }
}

impl LogRegularBuckets {
    pub fn new(base: f64, n: u32, scale: f64) -> Result<Self> {
        let buckets = Self { base, n, scale };
        buckets.validate()?;
        Ok(buckets)
    }

    pub fn validate(&self) -> Result<()> {
        check_common(self.base, self.n, self.scale)?;
        // the first sub-bucket of each order would otherwise be empty or inverted
        if self.base - (self.n as f64) < 0.1 {
            return Err(Error::InvalidParameter(format!(
                "base ({}) must exceed the number of sub-buckets ({}) by at least 0.1",
                self.base, self.n
            )));
        }
        Ok(())
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bounds(&self, value: f64) -> (f64, f64) {
        indexed_bounds(self, value)
    }
}

impl IndexedBounds for LogRegularBuckets {
    fn lower_bound(&self, index: i64) -> f64 {
        let n = self.n as i64;
        let order = index.div_euclid(n);
        let rem = index.rem_euclid(n);
        if rem == 0 {
            self.scale * self.base.powf(order as f64)
        } else {
            self.scale * self.base.powf((order + 1) as f64) * rem as f64 / self.n as f64
        }
    }

    fn index_estimate(&self, magnitude: f64) -> i64 {
        let log = scaled_log(magnitude, self.base, self.scale) + INDEX_EPSILON;
        let order = log.floor();
        let sub = (self.n as f64 * self.base.powf(log - order) / self.base).floor();
        (order * self.n as f64) as i64 + (sub as i64).clamp(0, self.n as i64 - 1)
    }
}

/// Each power of `base` split into `root` equal-width buckets aligned on the
/// start of the order
///
/// Order `d` covers `[scale * base^d, scale * base^(d+1))` and its
/// sub-buckets have width `scale * base^d * (base - 1) / root`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalBuckets {
    base: f64,
    root: u32,
    scale: f64,
}

impl Default for DecimalBuckets {
    fn default() -> Self {
        Self {
            base: 10.0,
            root: 3,
            scale: 0.1,
        }
    }
}

impl DecimalBuckets {
    pub fn new(base: f64, root: u32, scale: f64) -> Result<Self> {
        let buckets = Self { base, root, scale };
        buckets.validate()?;
        Ok(buckets)
    }

    pub fn validate(&self) -> Result<()> {
        check_common(self.base, self.root, self.scale)
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bounds(&self, value: f64) -> (f64, f64) {
        indexed_bounds(self, value)
    }
}

impl IndexedBounds for DecimalBuckets {
    fn lower_bound(&self, index: i64) -> f64 {
        let root = self.root as i64;
        let order = index.div_euclid(root);
        let rem = index.rem_euclid(root);
        let start = self.scale * self.base.powf(order as f64);
        if rem == 0 {
            start
        } else {
            start * (1.0 + rem as f64 * (self.base - 1.0) / self.root as f64)
        }
    }

    fn index_estimate(&self, magnitude: f64) -> i64 {
        let log = scaled_log(magnitude, self.base, self.scale) + INDEX_EPSILON;
        let order = log.floor();
        let start = self.scale * self.base.powf(order);
        let sub = ((magnitude / start - 1.0) * self.root as f64 / (self.base - 1.0)).floor();
        (order * self.root as f64) as i64 + (sub as i64).clamp(0, self.root as i64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_bounds(actual: (f64, f64), expected: (f64, f64)) {
        assert_relative_eq!(actual.0, expected.0, max_relative = 1e-9);
        assert_relative_eq!(actual.1, expected.1, max_relative = 1e-9);
    }

    #[test]
    fn test_log_defaults() {
        let log = LogBuckets::default();
        assert_bounds(log.bounds(5.0), (4.6415888336, 10.0));
        assert_bounds(log.bounds(-5.0), (-10.0, -4.6415888336));
        assert_eq!(log.bounds(0.0), (0.0, 0.1));
        assert_eq!(log.bounds(0.05), (0.0, 0.1));
        assert_eq!(log.bounds(-0.05), (-0.1, 0.0));
    }

    #[test]
    fn test_log_value_on_boundary() {
        let log = LogBuckets::new(10.0, 1, 1.0).unwrap();
        assert_eq!(log.bounds(10.0), (10.0, 100.0));
        assert_eq!(log.bounds(-10.0), (-10.0, -1.0));
        assert_eq!(log.bounds(1.0), (1.0, 10.0));
        assert_eq!(log.bounds(-1.0), (-1.0, 0.0));
    }

    #[test]
    fn test_log_validation() {
        assert!(LogBuckets::new(1.0, 3, 0.1).is_err());
        assert!(LogBuckets::new(0.5, 3, 0.1).is_err());
        assert!(LogBuckets::new(10.0, 0, 0.1).is_err());
        assert!(LogBuckets::new(10.0, 3, 0.0).is_err());
        assert!(LogBuckets::new(f64::INFINITY, 3, 0.1).is_err());
        assert!(LogBuckets::new(f64::NAN, 3, 0.1).is_err());
        assert!(LogBuckets::new(2.0, 1, 1e-300).is_ok());
    }

    #[test]
    fn test_log_regular_lower_bounds() {
        let lr = LogRegularBuckets::new(10.0, 3, 0.1).unwrap();
        assert_relative_eq!(lr.lower_bound(1), 0.333333333, max_relative = 1e-6);
        assert_relative_eq!(lr.lower_bound(7), 33.3333333, max_relative = 1e-6);
        assert_relative_eq!(lr.lower_bound(11), 666.666667, max_relative = 1e-6);
    }

    #[test]
    fn test_log_regular_indices() {
        let lr = LogRegularBuckets::new(10.0, 3, 0.1).unwrap();
        let index = |v: f64| {
            let (lower, _) = lr.bounds(v);
            (0..40).find(|&i| lr.lower_bound(i) == lower).unwrap()
        };
        assert_eq!(index(0.1), 0);
        assert_eq!(index(0.4), 1);
        assert_eq!(index(40.0), 7);
        assert_eq!(index(200.0), 9);
        assert_eq!(index(300.0), 9);
        assert_eq!(index(800.0), 11);
    }

    #[test]
    fn test_log_regular_bounds() {
        let lr = LogRegularBuckets::new(10.0, 3, 0.1).unwrap();
        assert_bounds(lr.bounds(5.0), (3.3333333333, 6.6666666667));
        assert_bounds(lr.bounds(-5.0), (-6.6666666667, -3.3333333333));
        assert_eq!(lr.bounds(0.0), (0.0, 0.1));
        assert_eq!(lr.bounds(-0.05), (-0.1, 0.0));
    }

    #[test]
    fn test_log_regular_default_widths() {
        let lr = LogRegularBuckets::default();
        let mut previous = lr.lower_bound(0);
        for i in 1..30 {
            let next = lr.lower_bound(i);
            assert!(next - previous >= 0.05, "bucket {i} too narrow");
            previous = next;
        }
    }

    #[test]
    fn test_log_regular_validation() {
        assert!(LogRegularBuckets::new(10.0, 10, 0.1).is_err());
        assert!(LogRegularBuckets::new(10.0, 9, 0.1).is_ok());
        assert!(LogRegularBuckets::new(3.05, 3, 0.1).is_err());
    }

    #[test]
    fn test_decimal_bounds() {
        let dec = DecimalBuckets::default();
        // order [1, 10) split into [1, 4), [4, 7), [7, 10)
        assert_bounds(dec.bounds(5.0), (4.0, 7.0));
        assert_bounds(dec.bounds(9.99), (7.0, 10.0));
        assert_bounds(dec.bounds(10.0), (10.0, 40.0));
        assert_bounds(dec.bounds(-5.0), (-7.0, -4.0));
        assert_eq!(dec.bounds(0.01), (0.0, 0.1));
    }

    #[test]
    fn test_lower_bounds_are_monotone() {
        let log = LogBuckets::default();
        let lr = LogRegularBuckets::default();
        let dec = DecimalBuckets::default();
        for i in 0..200 {
            assert!(log.lower_bound(i) < log.lower_bound(i + 1));
            assert!(lr.lower_bound(i) < lr.lower_bound(i + 1));
            assert!(dec.lower_bound(i) < dec.lower_bound(i + 1));
        }
    }

    #[test]
    fn test_extreme_magnitudes_terminate() {
        let log = LogBuckets::default();
        let lr = LogRegularBuckets::default();
        let dec = DecimalBuckets::default();
        for value in [5e307, f64::MAX, -f64::MAX, -5e307] {
            for (lower, upper) in [log.bounds(value), lr.bounds(value), dec.bounds(value)] {
                assert!(lower <= value && value < upper, "{value} not in [{lower}, {upper})");
            }
        }

        // the top bucket is open ended
        assert_eq!(log.bounds(f64::MAX).1, f64::INFINITY);
        assert_eq!(log.bounds(-f64::MAX).0, f64::NEG_INFINITY);
        assert_bounds(dec.bounds(f64::MAX), (7e307, f64::INFINITY));
        assert_bounds(log.bounds(2e307), (1e307, 2.1544346900318837e307));
    }

    #[test]
    fn test_overflowing_lower_bounds_fall_back_to_search() {
        // the estimate lands far past the last finite lower bound
        let fine = LogBuckets::new(2.0, 1000, 1e-300).unwrap();
        let (lower, upper) = fine.bounds(f64::MAX);
        assert!(lower.is_finite() && lower <= f64::MAX);
        assert_eq!(upper, f64::INFINITY);

        let (lower, upper) = fine.bounds(-f64::MAX);
        assert_eq!(lower, f64::NEG_INFINITY);
        assert!(upper.is_finite() && upper < 0.0);
    }
}
