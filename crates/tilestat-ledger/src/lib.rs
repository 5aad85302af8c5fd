//! Multi-dimensional co-occurrence counting for raster bands
//!
//! A [`Ledger`] answers questions like "how many pixels are land-cover class
//! 3 *and* have an elevation between 200 and 300 m". Each band is bucketed
//! with its own strategy and the tuple of bucket lower bounds is counted.
//!
//! # Example
//!
//! ```rust
//! use tilestat_ledger::Ledger;
//!
//! let mut ledger = Ledger::from_descriptors(&["categorical", "regular?width=100"]).unwrap();
//! ledger.add(&[3.0, 250.0]).unwrap();
//! ledger.add(&[3.0, 275.0]).unwrap();
//! ledger.add(&[1.0, 20.0]).unwrap();
//!
//! assert_eq!(ledger.get(&[3.0, 200.0]), 2);
//! assert_eq!(ledger.total_count(), 3);
//! ```

pub mod ledger;

pub use ledger::Ledger;
