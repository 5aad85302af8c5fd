//! Bucketing strategies for streaming histograms
//!
//! A [`BucketingStrategy`] maps any `f64` to the bounds `(lower, upper)` of
//! the bucket that holds it. Histograms ask the strategy for a bucket only
//! when a value falls outside every bucket created so far, so the strategy
//! fixes the bucket layout without any bucket being allocated up front.
//!
//! # Available Strategies
//!
//! - **Categorical**: one single-point bucket per distinct value
//! - **Log**: `n` geometric buckets per power of `base`
//! - **LogRegular** (`logQuantile`): each power of `base` split into `n`
//!   equal-width buckets
//! - **Decimal**: each power of `base` split into `root` equal-width buckets
//!   starting at the power itself
//! - **Regular**: constant-width buckets aligned on an origin
//! - **Explicit**: caller-supplied boundaries
//!
//! Every strategy except Categorical is exactly contiguous: two neighbouring
//! `f64` values get either the same bucket or two buckets sharing the exact
//! same boundary.
//!
//! # Example
//!
//! ```rust
//! use tilestat_bucketing::BucketingStrategy;
//!
//! let strategy: BucketingStrategy = "regular?origin=5&width=10".parse().unwrap();
//! assert_eq!(strategy.compute_bucket_bounds(6.0), (5.0, 15.0));
//! assert_eq!(strategy.compute_bucket_bounds(-6.0), (-15.0, -5.0));
//! assert_eq!(strategy.to_string(), "regular/origin/5/width/10");
//! ```

pub mod descriptor;
pub mod explicit;
pub mod logarithmic;
pub mod range;
pub mod regular;
pub mod strategy;

pub use explicit::ExplicitBuckets;
pub use logarithmic::{DecimalBuckets, LogBuckets, LogRegularBuckets};
pub use range::{check_ranges, intersects_any, intersects_range};
pub use regular::RegularBuckets;
pub use strategy::BucketingStrategy;
