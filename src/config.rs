//! Accumulator configuration

use serde::{Deserialize, Serialize};
use tilestat_bucketing::BucketingStrategy;
use tilestat_core::{Error, Result};

/// Settings shared by the pipeline accumulators
///
/// Every field has a default, so a configuration file only needs to name
/// what it changes:
///
/// ```rust
/// use tilestat::AccumulatorConfig;
///
/// let config = AccumulatorConfig::from_json(r#"{"buckets": "regular?width=5", "nodata": -9999}"#).unwrap();
/// assert_eq!(config.nodata, Some(-9999.0));
/// assert_eq!(config.ledger_buckets, "categorical");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Descriptor of the strategy used by histogram and category accumulators
    pub buckets: String,
    /// Colon-separated descriptors, one per ledger dimension; a single
    /// descriptor applies to every band
    pub ledger_buckets: String,
    /// Band value marking a missing pixel
    pub nodata: Option<f64>,
    /// Band holding the category labels for the categories accumulator
    pub category_band: usize,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            buckets: "log".to_string(),
            ledger_buckets: "categorical".to_string(),
            nodata: None,
            category_band: 0,
        }
    }
}

impl AccumulatorConfig {
    /// Load a configuration from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse the histogram bucketing strategy
    pub fn strategy(&self) -> Result<BucketingStrategy> {
        BucketingStrategy::from_descriptor(&self.buckets)
    }

    /// Parse the ledger strategies for a raster with `bands` bands
    pub fn ledger_strategies(&self, bands: usize) -> Result<Vec<BucketingStrategy>> {
        let strategies = self
            .ledger_buckets
            .split(':')
            .map(BucketingStrategy::from_descriptor)
            .collect::<Result<Vec<_>>>()?;

        match strategies.len() {
            1 => Ok(vec![strategies[0].clone(); bands]),
            n if n == bands => Ok(strategies),
            n => Err(Error::size_mismatch(bands, n, "ledger bucketing descriptors")),
        }
    }
}
