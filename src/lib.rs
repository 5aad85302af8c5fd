//! Foldable streaming statistics for tiled raster data
//!
//! A raster is processed one partition (tile) at a time. Each partition
//! feeds its pixels to an [`Accumulator`], which keeps a small aggregate in
//! memory; the aggregates of all partitions are then folded together in any
//! grouping to give the same answer as a single pass over the whole raster.
//!
//! The aggregates themselves live in the member crates and are re-exported
//! here:
//!
//! - [`ScalarStats`] and [`VectorStats`]: count, extrema, mean and variance
//! - [`Histogram`], [`CategoryMap`] and their vector forms, bucketed by a
//!   [`BucketingStrategy`]
//! - [`Ledger`]: co-occurrence counts of bucketed multi-band values
//!
//! # Example
//!
//! ```rust
//! use tilestat::prelude::*;
//!
//! let context = AccumulatorContext::new(1);
//! let tiles: Vec<Vec<[u16; 1]>> = vec![
//!     (0..100).map(|v| [v]).collect(),
//!     (100..250).map(|v| [v]).collect(),
//! ];
//!
//! let partials = tiles
//!     .iter()
//!     .map(|tile| accumulate::<StatisticsAccumulator, u16, _>(&context, tile.iter().map(|p| &p[..])))
//!     .collect::<Result<Vec<_>>>()
//!     .unwrap();
//!
//! let total = fold_tree(&partials).unwrap().unwrap();
//! assert_eq!(total.get(0).unwrap().count(), 250);
//! assert_eq!(total.get(0).unwrap().max(), 249.0);
//! ```

pub mod accumulator;
pub mod config;

pub use accumulator::{
    accumulate, Accumulator, AccumulatorContext, CategoriesAccumulator, HistogramAccumulator,
    LedgerAccumulator, StatisticsAccumulator,
};
pub use config::AccumulatorConfig;

pub use tilestat_bucketing::{
    BucketingStrategy, DecimalBuckets, ExplicitBuckets, LogBuckets, LogRegularBuckets,
    RegularBuckets,
};
pub use tilestat_core::{fold_sequential, fold_tree, Error, Foldable, Result, SampleFilter, ScalarStats};
#[cfg(feature = "parallel")]
pub use tilestat_core::fold_tree_parallel;
pub use tilestat_histogram::{
    Bucket, CategoryMap, Histogram, HistogramOps, VectorCategoryMap, VectorHistogram, VectorStats,
};
pub use tilestat_ledger::Ledger;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accumulator::{
        accumulate, Accumulator, AccumulatorContext, CategoriesAccumulator, HistogramAccumulator,
        LedgerAccumulator, StatisticsAccumulator,
    };
    pub use crate::config::AccumulatorConfig;
    pub use tilestat_bucketing::BucketingStrategy;
    pub use tilestat_core::prelude::*;
    pub use tilestat_histogram::{
        CategoryMap, Histogram, HistogramOps, VectorCategoryMap, VectorHistogram, VectorStats,
    };
    pub use tilestat_ledger::Ledger;
}
