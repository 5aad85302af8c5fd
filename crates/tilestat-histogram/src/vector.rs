//! Per-band aggregates for multi-band rasters
//!
//! Each wrapper holds one scalar aggregate per band. The band count is
//! fixed at construction, every sample must supply exactly that many
//! components, and only wrappers with equal band counts can be folded.

use crate::categories::CategoryMap;
use crate::ops::HistogramOps;
use crate::types::Histogram;
use serde::{Deserialize, Serialize};
use tilestat_bucketing::BucketingStrategy;
use tilestat_core::{Error, Foldable, Result, ScalarStats};

fn check_sample(expected: usize, actual: usize, context: &str) -> Result<()> {
    if expected != actual {
        return Err(Error::size_mismatch(expected, actual, context));
    }
    Ok(())
}

fn fold_components<T: Foldable>(a: &[T], b: &[T], context: &str) -> Result<Vec<T>> {
    if a.len() != b.len() {
        log::warn!("{context}: cannot fold {} components with {}", a.len(), b.len());
        return Err(Error::component_mismatch(a.len(), b.len(), context));
    }
    a.iter().zip(b).map(|(x, y)| x.fold(y)).collect()
}

/// Running statistics per band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorStats {
    components: Vec<ScalarStats>,
}

impl VectorStats {
    pub fn new(size: usize) -> Self {
        Self {
            components: vec![ScalarStats::new(); size],
        }
    }

    pub fn update(&mut self, sample: &[f64]) -> Result<()> {
        check_sample(self.components.len(), sample.len(), "VectorStats sample")?;
        for (stats, &value) in self.components.iter_mut().zip(sample) {
            stats.update(value);
        }
        Ok(())
    }

    pub fn fold(&self, other: &VectorStats) -> Result<VectorStats> {
        Ok(VectorStats {
            components: fold_components(&self.components, &other.components, "VectorStats fold")?,
        })
    }

    pub fn components(&self) -> &[ScalarStats] {
        &self.components
    }

    pub fn get(&self, band: usize) -> Option<&ScalarStats> {
        self.components.get(band)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Foldable for VectorStats {
    fn fold(&self, other: &Self) -> Result<Self> {
        VectorStats::fold(self, other)
    }
}

/// One histogram per band, all with the same strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorHistogram {
    components: Vec<Histogram>,
}

impl VectorHistogram {
    pub fn new(size: usize, strategy: BucketingStrategy) -> Self {
        Self {
            components: vec![Histogram::new(strategy); size],
        }
    }

    pub fn update(&mut self, sample: &[f64]) -> Result<()> {
        check_sample(self.components.len(), sample.len(), "VectorHistogram sample")?;
        for (hist, &value) in self.components.iter_mut().zip(sample) {
            hist.update(value);
        }
        Ok(())
    }

    pub fn fold(&self, other: &VectorHistogram) -> Result<VectorHistogram> {
        Ok(VectorHistogram {
            components: fold_components(
                &self.components,
                &other.components,
                "VectorHistogram fold",
            )?,
        })
    }

    pub fn components(&self) -> &[Histogram] {
        &self.components
    }

    pub fn get(&self, band: usize) -> Option<&Histogram> {
        self.components.get(band)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Per-band copies without empty buckets
    pub fn optimise(&self) -> VectorHistogram {
        VectorHistogram {
            components: self.components.iter().map(HistogramOps::optimise).collect(),
        }
    }

    /// Per-band summary statistics
    pub fn summarise(&self) -> VectorStats {
        VectorStats {
            components: self.components.iter().map(HistogramOps::summarise).collect(),
        }
    }
}

impl Foldable for VectorHistogram {
    fn fold(&self, other: &Self) -> Result<Self> {
        VectorHistogram::fold(self, other)
    }
}

/// One category map per band, sharing a single category value per sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorCategoryMap {
    components: Vec<CategoryMap>,
}

impl VectorCategoryMap {
    pub fn new(size: usize, strategy: BucketingStrategy) -> Self {
        Self {
            components: vec![CategoryMap::new(strategy); size],
        }
    }

    /// Record each band's value under `category`
    pub fn update(&mut self, category: f64, values: &[f64]) -> Result<()> {
        check_sample(self.components.len(), values.len(), "VectorCategoryMap sample")?;
        for (cats, &value) in self.components.iter_mut().zip(values) {
            cats.update(category, value);
        }
        Ok(())
    }

    pub fn fold(&self, other: &VectorCategoryMap) -> Result<VectorCategoryMap> {
        Ok(VectorCategoryMap {
            components: fold_components(
                &self.components,
                &other.components,
                "VectorCategoryMap fold",
            )?,
        })
    }

    pub fn components(&self) -> &[CategoryMap] {
        &self.components
    }

    pub fn get(&self, band: usize) -> Option<&CategoryMap> {
        self.components.get(band)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Per-band copies without empty buckets or categories
    pub fn optimise(&self) -> VectorCategoryMap {
        VectorCategoryMap {
            components: self.components.iter().map(HistogramOps::optimise).collect(),
        }
    }
}

impl Foldable for VectorCategoryMap {
    fn fold(&self, other: &Self) -> Result<Self> {
        VectorCategoryMap::fold(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vector_stats() {
        let mut stats = VectorStats::new(2);
        stats.update(&[1.0, 10.0]).unwrap();
        stats.update(&[3.0, f64::NAN]).unwrap();
        assert_eq!(stats.get(0).unwrap().count(), 2);
        assert_eq!(stats.get(1).unwrap().count(), 1);
        assert_relative_eq!(stats.get(0).unwrap().mean(), 2.0);
    }

    #[test]
    fn test_sample_length_mismatch() {
        let mut stats = VectorStats::new(3);
        assert!(matches!(stats.update(&[1.0]), Err(Error::InvalidInput(_))));

        let mut hist = VectorHistogram::new(2, BucketingStrategy::default());
        assert!(hist.update(&[1.0, 2.0, 3.0]).is_err());

        let mut cats = VectorCategoryMap::new(1, BucketingStrategy::default());
        assert!(cats.update(1.0, &[]).is_err());
    }

    #[test]
    fn test_fold_component_mismatch() {
        let a = VectorStats::new(2);
        let b = VectorStats::new(3);
        assert!(matches!(a.fold(&b), Err(Error::Incompatible(_))));

        let a = VectorHistogram::new(1, BucketingStrategy::default());
        let b = VectorHistogram::new(2, BucketingStrategy::default());
        assert!(a.fold(&b).is_err());
    }

    #[test]
    fn test_vector_histogram_fold() {
        let strategy = BucketingStrategy::regular(0.0, 1.0).unwrap();
        let mut a = VectorHistogram::new(2, strategy.clone());
        let mut b = VectorHistogram::new(2, strategy);
        a.update(&[0.5, 1.5]).unwrap();
        b.update(&[0.7, 2.5]).unwrap();

        let folded = a.fold(&b).unwrap();
        assert_eq!(folded.get(0).unwrap().len(), 1);
        assert_eq!(folded.get(1).unwrap().len(), 2);
        let summary = folded.summarise();
        assert_eq!(summary.get(0).unwrap().count(), 2);
        assert_relative_eq!(summary.get(1).unwrap().mean(), 2.0);
    }

    #[test]
    fn test_vector_category_map() {
        let mut cats = VectorCategoryMap::new(2, BucketingStrategy::categorical());
        cats.update(1.0, &[5.0, 6.0]).unwrap();
        cats.update(2.0, &[5.0, f64::NAN]).unwrap();
        cats.update(f64::NAN, &[7.0, 7.0]).unwrap();

        assert_eq!(cats.get(0).unwrap().len(), 2);
        assert_eq!(cats.get(1).unwrap().len(), 1);

        let folded = cats.fold(&cats).unwrap();
        assert_eq!(folded.get(0).unwrap().get(1).unwrap().total_count(), 2);
    }

    #[test]
    fn test_serde_is_transparent() {
        let stats = VectorStats::new(2);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.starts_with('['));
        let back: VectorStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stats);
    }
}
