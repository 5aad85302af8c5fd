//! Sample validity and conversion
//!
//! Raster bands mark missing pixels either with a non-finite value or with a
//! nodata sentinel. Every aggregate skips such samples silently.

use num_traits::ToPrimitive;

/// Check whether a sample should contribute to an aggregate
#[inline]
pub fn is_valid(value: f64) -> bool {
    value.is_finite()
}

/// Convert a band sample of any numeric type to `f64`
///
/// Values that cannot be represented come back as NaN, which every
/// aggregate treats as missing.
#[inline]
pub fn to_sample<T: ToPrimitive>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Maps raw band samples to `f64`, blanking the nodata sentinel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleFilter {
    nodata: Option<f64>,
}

impl SampleFilter {
    /// Create a filter with an optional nodata sentinel
    ///
    /// A non-finite sentinel is ignored, since such values are skipped
    /// anyway.
    pub fn new(nodata: Option<f64>) -> Self {
        Self {
            nodata: nodata.filter(|v| v.is_finite()),
        }
    }

    /// The configured sentinel
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Convert a sample, returning NaN for nodata and unrepresentable values
    #[inline]
    pub fn apply<T: ToPrimitive>(&self, value: T) -> f64 {
        let v = to_sample(value);
        match self.nodata {
            Some(nodata) if v == nodata => f64::NAN,
            _ => v,
        }
    }

    /// Convert a sample and keep it only if valid
    #[inline]
    pub fn accept<T: ToPrimitive>(&self, value: T) -> Option<f64> {
        let v = self.apply(value);
        is_valid(v).then_some(v)
    }
}
