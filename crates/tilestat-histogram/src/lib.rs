//! Foldable streaming histograms for raster statistics
//!
//! This crate builds histograms one value at a time, creating buckets only
//! where data actually falls. Bucket bounds come from a
//! [`BucketingStrategy`](tilestat_bucketing::BucketingStrategy), so
//! histograms built independently over different partitions of a raster
//! share bucket edges and can be folded back into exactly the histogram a
//! serial pass would have produced.
//!
//! # Key Features
//!
//! - **Lazy buckets**: memory grows with the number of distinct buckets hit
//! - **Per-bucket statistics**: each bucket carries count, extrema, mean
//!   and variance of its values
//! - **Categories**: [`CategoryMap`] keeps one histogram per class label
//! - **Multi-band**: vector wrappers fan each sample out per band
//!
//! # Example
//!
//! ```rust
//! use tilestat_bucketing::BucketingStrategy;
//! use tilestat_histogram::{Histogram, HistogramOps};
//!
//! let strategy = BucketingStrategy::regular(0.0, 10.0).unwrap();
//! let mut left = Histogram::new(strategy.clone());
//! let mut right = Histogram::new(strategy);
//! for v in [1.0, 4.0, 12.0] {
//!     left.update(v);
//! }
//! for v in [7.0, 31.0] {
//!     right.update(v);
//! }
//!
//! let merged = left.fold(&right).unwrap();
//! assert_eq!(merged.len(), 3);
//! assert_eq!(merged.buckets()[0].count(), 3);
//! assert_eq!(merged.summarise().count(), 5);
//! ```

pub mod categories;
pub mod ops;
pub mod types;
pub mod vector;

pub use categories::CategoryMap;
pub use ops::HistogramOps;
pub use types::{Bucket, Histogram, CATEGORICAL_EPSILON};
pub use vector::{VectorCategoryMap, VectorHistogram, VectorStats};
