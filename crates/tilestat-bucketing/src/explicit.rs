//! Caller-supplied bucket boundaries

use tilestat_core::{Error, Result};

/// Buckets delimited by a strictly increasing list of boundaries
///
/// Every bucket is half-open. Values below the first boundary fall in
/// `(-inf, first)` and values at or above the last boundary in
/// `[last, +inf)`. An empty list gives a single bucket spanning the whole
/// line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplicitBuckets {
    bounds: Vec<f64>,
}

impl ExplicitBuckets {
    pub fn new(bounds: Vec<f64>) -> Result<Self> {
        let buckets = Self { bounds };
        buckets.validate()?;
        Ok(buckets)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self.bounds.iter().find(|b| b.is_nan()) {
            return Err(Error::InvalidParameter(format!(
                "explicit bounds must not contain {bad}"
            )));
        }
        if let Some(pair) = self.bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::InvalidParameter(format!(
                "explicit bounds must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }

    pub fn bounds_list(&self) -> &[f64] {
        &self.bounds
    }

    /// Bounds of the bucket holding a finite `value`
    pub fn bounds(&self, value: f64) -> (f64, f64) {
        let (Some(&first), Some(&last)) = (self.bounds.first(), self.bounds.last()) else {
            return (f64::NEG_INFINITY, f64::INFINITY);
        };

        let k = self.bounds.partition_point(|&b| b <= value);
        if k == 0 {
            (f64::NEG_INFINITY, first)
        } else if k == self.bounds.len() {
            (last, f64::INFINITY)
        } else {
            (self.bounds[k - 1], self.bounds[k])
        }
    }
}
