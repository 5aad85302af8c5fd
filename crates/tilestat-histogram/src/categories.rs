//! Histograms grouped by a discrete category

use crate::ops::HistogramOps;
use crate::types::Histogram;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tilestat_bucketing::{check_ranges, BucketingStrategy};
use tilestat_core::{is_valid, Error, Foldable, Result};

/// One histogram per integer category, all sharing a bucketing strategy
///
/// Categories are keyed by the truncated integer part of the category
/// value. A category that was never seen is equivalent to an empty
/// histogram.
///
/// Histograms are kept in a vector sorted by key. Raster scans tend to
/// repeat the same category across neighbouring pixels, so the slot used
/// last is remembered and tried before searching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "CategoryRecord", from = "CategoryRecord")]
pub struct CategoryMap {
    strategy: BucketingStrategy,
    categories: Vec<(i64, Histogram)>,
    current: Option<usize>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new(BucketingStrategy::default())
    }
}

impl PartialEq for CategoryMap {
    fn eq(&self, other: &Self) -> bool {
        self.strategy == other.strategy && self.categories == other.categories
    }
}

impl CategoryMap {
    pub fn new(strategy: BucketingStrategy) -> Self {
        Self::with_categories(strategy, Vec::new())
    }

    /// `categories` must be sorted by key without duplicates
    fn with_categories(strategy: BucketingStrategy, categories: Vec<(i64, Histogram)>) -> Self {
        Self {
            strategy,
            categories,
            current: None,
        }
    }

    pub fn strategy(&self) -> &BucketingStrategy {
        &self.strategy
    }

    fn position(&self, category: i64) -> std::result::Result<usize, usize> {
        self.categories.binary_search_by_key(&category, |(k, _)| *k)
    }

    /// Record `value` under `category`
    ///
    /// The sample is skipped when either number is not finite.
    pub fn update(&mut self, category: f64, value: f64) {
        if !is_valid(category) || !is_valid(value) {
            return;
        }
        let key = category.trunc() as i64;

        if let Some(i) = self.current {
            if let Some((k, hist)) = self.categories.get_mut(i) {
                if *k == key {
                    hist.update(value);
                    return;
                }
            }
        }

        let i = match self.position(key) {
            Ok(i) => i,
            Err(i) => {
                log::trace!("new category {key}");
                self.categories
                    .insert(i, (key, Histogram::new(self.strategy.clone())));
                i
            }
        };
        self.categories[i].1.update(value);
        self.current = Some(i);
    }

    /// Combine with a map accumulated over other samples
    ///
    /// Categories present on one side only are merged with an empty
    /// histogram. Fails if the two maps use different strategies and both
    /// hold data.
    pub fn fold(&self, other: &CategoryMap) -> Result<CategoryMap> {
        if self.strategy != other.strategy {
            if self.categories.is_empty() {
                return Ok(other.fresh_copy());
            }
            if !other.categories.is_empty() {
                log::warn!(
                    "refusing to fold category maps with strategies {} and {}",
                    self.strategy,
                    other.strategy
                );
                return Err(Error::incompatible_strategies(
                    "CategoryMap fold",
                    &self.strategy.to_string(),
                    &other.strategy.to_string(),
                ));
            }
        }

        let empty = Histogram::new(self.strategy.clone());
        let mut categories = Vec::with_capacity(self.categories.len().max(other.categories.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.categories.len() || j < other.categories.len() {
            let left = self.categories.get(i);
            let right = other.categories.get(j);
            let order = match (left, right) {
                (Some((ka, _)), Some((kb, _))) => ka.cmp(kb),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            let (key, a, b) = match (order, left, right) {
                (Ordering::Equal, Some((k, a)), Some((_, b))) => {
                    i += 1;
                    j += 1;
                    (*k, a, b)
                }
                (Ordering::Less, Some((k, a)), _) => {
                    i += 1;
                    (*k, a, &empty)
                }
                (_, _, Some((k, b))) => {
                    j += 1;
                    (*k, &empty, b)
                }
                _ => break,
            };
            categories.push((key, a.fold(b)?));
        }
        Ok(CategoryMap::with_categories(self.strategy.clone(), categories))
    }

    fn fresh_copy(&self) -> CategoryMap {
        CategoryMap::with_categories(self.strategy.clone(), self.categories.clone())
    }

    /// Histogram of one category
    pub fn get(&self, category: i64) -> Option<&Histogram> {
        self.position(category).ok().map(|i| &self.categories[i].1)
    }

    /// Category keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.categories.iter().map(|(k, _)| *k)
    }

    /// Iterate over `(category, histogram)` pairs in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Histogram)> {
        self.categories.iter().map(|(k, h)| (*k, h))
    }

    /// Number of categories seen
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Keep only the listed categories
    pub fn filter_by_category(&self, keys: &[i64]) -> CategoryMap {
        let categories = self
            .categories
            .iter()
            .filter(|(k, _)| keys.contains(k))
            .cloned()
            .collect();
        CategoryMap::with_categories(self.strategy.clone(), categories)
    }

    fn map_histograms<F: Fn(&Histogram) -> Histogram>(&self, f: F) -> CategoryMap {
        let categories = self.categories.iter().map(|(k, h)| (*k, f(h))).collect();
        CategoryMap::with_categories(self.strategy.clone(), categories)
    }
}

impl HistogramOps for CategoryMap {
    type Summary = Histogram;

    /// Optimise every histogram and drop categories left without values
    fn optimise(&self) -> Self {
        let categories = self
            .categories
            .iter()
            .map(|(k, h)| (*k, h.optimise()))
            .filter(|(_, h)| h.total_count() > 0)
            .collect();
        CategoryMap::with_categories(self.strategy.clone(), categories)
    }

    /// Histogram of all values regardless of category
    fn summarise(&self) -> Histogram {
        self.categories
            .iter()
            .fold(Histogram::new(self.strategy.clone()), |acc, (_, h)| acc.merge(h))
    }

    fn filter_by_range(&self, lower: &[f64], upper: &[f64]) -> Result<Self> {
        check_ranges(lower, upper)?;
        let categories = self
            .categories
            .iter()
            .map(|(k, h)| h.filter_by_range(lower, upper).map(|f| (*k, f)))
            .collect::<Result<Vec<_>>>()?;
        Ok(CategoryMap::with_categories(self.strategy.clone(), categories))
    }

    fn filter_by_value(&self, values: &[f64]) -> Self {
        self.map_histograms(|h| h.filter_by_value(values))
    }
}

impl Foldable for CategoryMap {
    fn fold(&self, other: &Self) -> Result<Self> {
        CategoryMap::fold(self, other)
    }
}

impl fmt::Display for CategoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CategoryMap ({}, {} categories)", self.strategy, self.len())?;
        for (key, hist) in self.iter() {
            writeln!(f, "  {key}: {} values in {} buckets", hist.total_count(), hist.len())?;
        }
        Ok(())
    }
}

/// Persisted form of [`CategoryMap`], keyed by category
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoryRecord {
    strategy: BucketingStrategy,
    categories: BTreeMap<i64, Histogram>,
}

impl From<CategoryMap> for CategoryRecord {
    fn from(map: CategoryMap) -> Self {
        Self {
            strategy: map.strategy,
            categories: map.categories.into_iter().collect(),
        }
    }
}

impl From<CategoryRecord> for CategoryMap {
    fn from(record: CategoryRecord) -> Self {
        CategoryMap::with_categories(record.strategy, record.categories.into_iter().collect())
    }
}
