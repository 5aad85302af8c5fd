//! Matching bucket bounds against caller-supplied ranges

use tilestat_core::{Error, Result};

/// Check whether a bucket overlaps the range `[lower, upper)`
///
/// A bucket starting exactly at `lower` always matches, which lets a
/// single-point range select a categorical bucket.
pub fn intersects_range((bucket_lower, bucket_upper): (f64, f64), lower: f64, upper: f64) -> bool {
    if bucket_lower == lower {
        return true;
    }
    !(bucket_lower >= upper || bucket_upper <= lower)
}

/// Check a bucket against parallel lists of range bounds
pub fn intersects_any(bounds: (f64, f64), lower: &[f64], upper: &[f64]) -> bool {
    lower
        .iter()
        .zip(upper)
        .any(|(&lo, &hi)| intersects_range(bounds, lo, hi))
}

/// Reject range lists of different lengths
pub fn check_ranges(lower: &[f64], upper: &[f64]) -> Result<()> {
    if lower.len() != upper.len() {
        return Err(Error::size_mismatch(
            lower.len(),
            upper.len(),
            "range filter bounds",
        ));
    }
    Ok(())
}
