//! The bucketing strategy enum and its single dispatch point

use crate::descriptor;
use crate::explicit::ExplicitBuckets;
use crate::logarithmic::{DecimalBuckets, LogBuckets, LogRegularBuckets};
use crate::regular::RegularBuckets;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tilestat_core::{Error, Result};

/// Pure mapping from a value to the bounds of the bucket holding it
///
/// Apart from [`Categorical`](BucketingStrategy::Categorical), the buckets
/// produced for any two neighbouring `f64` values are either identical or
/// share their boundary exactly: there are no gaps and no overlaps.
///
/// Strategies serialize as their descriptor string, e.g.
/// `"log/base/10/n/3/scale/0.1"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BucketingStrategy {
    /// One single-point bucket per distinct value
    Categorical,
    Log(LogBuckets),
    /// Also known as `logQuantile`
    LogRegular(LogRegularBuckets),
    Regular(RegularBuckets),
    Explicit(ExplicitBuckets),
    Decimal(DecimalBuckets),
}

impl Default for BucketingStrategy {
    fn default() -> Self {
        BucketingStrategy::Log(LogBuckets::default())
    }
}

impl BucketingStrategy {
    pub fn categorical() -> Self {
        BucketingStrategy::Categorical
    }

    pub fn log(base: f64, n: u32, scale: f64) -> Result<Self> {
        LogBuckets::new(base, n, scale).map(BucketingStrategy::Log)
    }

    pub fn log_regular(base: f64, n: u32, scale: f64) -> Result<Self> {
        LogRegularBuckets::new(base, n, scale).map(BucketingStrategy::LogRegular)
    }

    pub fn regular(origin: f64, width: f64) -> Result<Self> {
        RegularBuckets::new(origin, width).map(BucketingStrategy::Regular)
    }

    pub fn explicit(bounds: Vec<f64>) -> Result<Self> {
        ExplicitBuckets::new(bounds).map(BucketingStrategy::Explicit)
    }

    pub fn decimal(base: f64, root: u32, scale: f64) -> Result<Self> {
        DecimalBuckets::new(base, root, scale).map(BucketingStrategy::Decimal)
    }

    /// Parse a descriptor such as `regular?origin=5&width=10`
    pub fn from_descriptor(text: &str) -> Result<Self> {
        descriptor::parse(text)
    }

    /// Bounds `(lower, upper)` of the bucket holding `value`
    ///
    /// NaN maps to `(NaN, NaN)` and an infinity to a degenerate bucket at
    /// that infinity, whatever the variant.
    pub fn compute_bucket_bounds(&self, value: f64) -> (f64, f64) {
        if value.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        if value.is_infinite() {
            return (value, value);
        }
        // -0.0 and 0.0 share a bucket
        let value = if value == 0.0 { 0.0 } else { value };

        match self {
            BucketingStrategy::Categorical => (value, value),
            BucketingStrategy::Log(b) => b.bounds(value),
            BucketingStrategy::LogRegular(b) => b.bounds(value),
            BucketingStrategy::Regular(b) => b.bounds(value),
            BucketingStrategy::Explicit(b) => b.bounds(value),
            BucketingStrategy::Decimal(b) => b.bounds(value),
        }
    }

    /// Re-check the parameters
    ///
    /// Constructors already validate, so this only fails for a strategy
    /// assembled by hand from unchecked parts.
    pub fn check_configuration(&self) -> Result<()> {
        match self {
            BucketingStrategy::Categorical => Ok(()),
            BucketingStrategy::Log(b) => b.validate(),
            BucketingStrategy::LogRegular(b) => b.validate(),
            BucketingStrategy::Regular(b) => b.validate(),
            BucketingStrategy::Explicit(b) => b.validate(),
            BucketingStrategy::Decimal(b) => b.validate(),
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, BucketingStrategy::Categorical)
    }

    /// Canonical name as used in descriptors
    pub fn name(&self) -> &'static str {
        match self {
            BucketingStrategy::Categorical => "categorical",
            BucketingStrategy::Log(_) => "log",
            BucketingStrategy::LogRegular(_) => "logRegular",
            BucketingStrategy::Regular(_) => "regular",
            BucketingStrategy::Explicit(_) => "explicit",
            BucketingStrategy::Decimal(_) => "decimal",
        }
    }

    /// Canonical path-style descriptor; parsing it yields an equal strategy
    pub fn descriptor(&self) -> String {
        match self {
            BucketingStrategy::Categorical => self.name().to_string(),
            BucketingStrategy::Log(b) => format!(
                "{}/base/{}/n/{}/scale/{}",
                self.name(),
                b.base(),
                b.n(),
                b.scale()
            ),
            BucketingStrategy::LogRegular(b) => format!(
                "{}/base/{}/n/{}/scale/{}",
                self.name(),
                b.base(),
                b.n(),
                b.scale()
            ),
            BucketingStrategy::Regular(b) => {
                format!("{}/origin/{}/width/{}", self.name(), b.origin(), b.width())
            }
            BucketingStrategy::Explicit(b) => {
                let bounds: Vec<String> = b.bounds_list().iter().map(|v| v.to_string()).collect();
                format!("{}/bounds/{}", self.name(), bounds.join(","))
            }
            BucketingStrategy::Decimal(b) => format!(
                "{}/base/{}/root/{}/scale/{}",
                self.name(),
                b.base(),
                b.root(),
                b.scale()
            ),
        }
    }
}

impl fmt::Display for BucketingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

impl FromStr for BucketingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        descriptor::parse(s)
    }
}

impl From<BucketingStrategy> for String {
    fn from(strategy: BucketingStrategy) -> Self {
        strategy.descriptor()
    }
}

impl TryFrom<String> for BucketingStrategy {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        descriptor::parse(&text)
    }
}
