//! Core traits and types for foldable raster statistics
//!
//! This crate provides the building blocks shared by every tilestat
//! aggregate: the [`Foldable`] merge contract, the [`ScalarStats`] running
//! statistics, sample validity rules and reduction helpers that combine
//! per-partition partials.
//!
//! # Design Philosophy
//!
//! - **One pass per partition**: aggregates are updated in place, one sample
//!   at a time, in O(1) memory per statistic
//! - **Pure folds**: merging two partials never mutates either operand
//! - **Associative**: sequential and tree reductions agree up to rounding
//!
//! # Example
//!
//! ```rust
//! use tilestat_core::{fold_tree, ScalarStats};
//!
//! let partials: Vec<ScalarStats> = (0..4)
//!     .map(|p| {
//!         let mut stats = ScalarStats::new();
//!         for i in 0..100 {
//!             stats.update((p * 100 + i) as f64);
//!         }
//!         stats
//!     })
//!     .collect();
//!
//! let total = fold_tree(&partials).unwrap().unwrap();
//! assert_eq!(total.count(), 400);
//! assert_eq!(total.max(), 399.0);
//! ```

pub mod error;
pub mod reduce;
pub mod sample;
pub mod stats;
pub mod traits;

// Re-export core types
pub use error::{Error, Result};
pub use reduce::{fold_sequential, fold_tree};
#[cfg(feature = "parallel")]
pub use reduce::fold_tree_parallel;
pub use sample::{is_valid, to_sample, SampleFilter};
pub use stats::ScalarStats;
pub use traits::Foldable;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::{fold_sequential, fold_tree, Foldable, Result, ScalarStats, SampleFilter};

    #[cfg(feature = "parallel")]
    pub use crate::fold_tree_parallel;
}
