//! Fixed-width linear buckets

use tilestat_core::{Error, Result};

/// Above this many widths from the origin, neighbouring grid indices stop
/// being distinct `f64` values
const MAX_EXACT_INDEX: f64 = 4_503_599_627_370_496.0;

/// Adjustments allowed after the division before giving up on the grid
const CORRECTION_STEPS: usize = 3;

/// Buckets of constant `width` aligned on `origin`
///
/// Bucket `k` is `[origin + k * width, origin + (k + 1) * width)` for any
/// integer `k`, negative included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularBuckets {
    origin: f64,
    width: f64,
}

impl Default for RegularBuckets {
    fn default() -> Self {
        Self {
            origin: 0.0,
            width: 20.0,
        }
    }
}

impl RegularBuckets {
    pub fn new(origin: f64, width: f64) -> Result<Self> {
        let buckets = Self { origin, width };
        buckets.validate()?;
        Ok(buckets)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.origin.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "origin must be finite, got {}",
                self.origin
            )));
        }
        if !self.width.is_finite() || self.width < f64::MIN_POSITIVE {
            return Err(Error::InvalidParameter(format!(
                "width must be finite and positive, got {}",
                self.width
            )));
        }
        Ok(())
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    fn edge(&self, index: f64) -> f64 {
        self.origin + index * self.width
    }

    /// Bounds of the bucket holding a finite `value`
    ///
    /// Where the grid is finer than the spacing of `f64` values, or the
    /// index cannot be represented exactly, the bucket shrinks to
    /// `[value, next_up(value))`.
    pub fn bounds(&self, value: f64) -> (f64, f64) {
        let mut index = ((value - self.origin) / self.width).floor();

        if index.is_finite() && index.abs() < MAX_EXACT_INDEX {
            // rounding in the division can land one bucket off
            for _ in 0..CORRECTION_STEPS {
                if value < self.edge(index) {
                    index -= 1.0;
                } else if value >= self.edge(index + 1.0) {
                    index += 1.0;
                } else {
                    break;
                }
            }
            let (lower, upper) = (self.edge(index), self.edge(index + 1.0));
            if lower <= value && value < upper {
                return (lower, upper);
            }
        }

        (value, next_up(value))
    }
}

/// Smallest `f64` greater than a finite `x`
fn next_up(x: f64) -> f64 {
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}
