//! Counting combinations of bucketed values

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tilestat_bucketing::{check_ranges, intersects_any, BucketingStrategy};
use tilestat_core::{is_valid, Error, Foldable, Result};

type Key = Vec<OrderedFloat<f64>>;

/// Counts occurrences of combinations of values, one bucketing strategy per
/// dimension
///
/// Each component of a sample is replaced by the lower bound of its bucket
/// and the resulting tuple is counted. A missing (non-finite) component is
/// recorded as NaN in its position, so partially missing samples are still
/// counted; samples with every component missing are skipped.
///
/// Counts live in a slab indexed from the key map. Neighbouring pixels of a
/// raster scan often share a combination, so the last combination and its
/// slot are remembered and a repeat skips the map lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "LedgerRecord", try_from = "LedgerRecord")]
pub struct Ledger {
    strategies: Vec<BucketingStrategy>,
    entries: BTreeMap<Key, usize>,
    counts: Vec<u64>,
    // bucketed form of the sample being added, reused across calls
    scratch: Key,
    // last combination added and its slot in `counts`
    last: Key,
    current: Option<usize>,
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.strategies == other.strategies && self.rows().eq(other.rows())
    }
}

fn to_key(components: &[f64]) -> Key {
    components.iter().map(|&v| OrderedFloat(v)).collect()
}

fn from_key(key: &[OrderedFloat<f64>]) -> Vec<f64> {
    key.iter().map(|v| v.0).collect()
}

impl Ledger {
    /// Create an empty ledger with one strategy per dimension
    pub fn new(strategies: Vec<BucketingStrategy>) -> Self {
        log::debug!("ledger with {} dimensions", strategies.len());
        Self::with_entries(strategies, BTreeMap::new())
    }

    /// Create a ledger from one descriptor per dimension
    pub fn from_descriptors<S: AsRef<str>>(descriptors: &[S]) -> Result<Self> {
        let strategies = descriptors
            .iter()
            .map(|d| BucketingStrategy::from_descriptor(d.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(strategies))
    }

    fn with_entries(strategies: Vec<BucketingStrategy>, entries: BTreeMap<Key, u64>) -> Self {
        let mut counts = Vec::with_capacity(entries.len());
        let entries = entries
            .into_iter()
            .map(|(key, count)| {
                counts.push(count);
                (key, counts.len() - 1)
            })
            .collect();
        Self {
            strategies,
            entries,
            counts,
            scratch: Vec::new(),
            last: Vec::new(),
            current: None,
        }
    }

    fn rows(&self) -> impl Iterator<Item = (&Key, u64)> + '_ {
        self.entries.iter().map(|(key, &slot)| (key, self.counts[slot]))
    }

    pub fn strategies(&self) -> &[BucketingStrategy] {
        &self.strategies
    }

    /// Number of dimensions
    pub fn arity(&self) -> usize {
        self.strategies.len()
    }

    /// Count one sample
    ///
    /// Fails when the sample does not have one component per dimension.
    pub fn add(&mut self, components: &[f64]) -> Result<()> {
        if components.len() != self.strategies.len() {
            return Err(Error::size_mismatch(
                self.strategies.len(),
                components.len(),
                "ledger sample",
            ));
        }
        if !components.iter().any(|&v| is_valid(v)) {
            return Ok(());
        }

        self.scratch.clear();
        for (strategy, &value) in self.strategies.iter().zip(components) {
            let bucketed = if is_valid(value) {
                strategy.compute_bucket_bounds(value).0
            } else {
                f64::NAN
            };
            self.scratch.push(OrderedFloat(bucketed));
        }

        if let Some(slot) = self.current {
            if self.scratch == self.last {
                self.counts[slot] += 1;
                return Ok(());
            }
        }

        let slot = match self.entries.get(self.scratch.as_slice()) {
            Some(&slot) => slot,
            None => {
                log::trace!("new ledger combination {:?}", from_key(&self.scratch));
                let slot = self.counts.len();
                self.counts.push(0);
                self.entries.insert(self.scratch.clone(), slot);
                slot
            }
        };
        self.counts[slot] += 1;
        std::mem::swap(&mut self.last, &mut self.scratch);
        self.current = Some(slot);
        Ok(())
    }

    /// Combine with a ledger accumulated over other samples
    ///
    /// A ledger with neither strategies nor entries adopts the strategies of
    /// the other operand. Otherwise the strategies must be equal.
    pub fn fold(&self, other: &Ledger) -> Result<Ledger> {
        if self.is_blank() {
            return Ok(other.fresh_copy());
        }
        if other.is_blank() {
            return Ok(self.fresh_copy());
        }
        if self.strategies != other.strategies {
            let ours = format!("{:?}", self.descriptors());
            let theirs = format!("{:?}", other.descriptors());
            log::warn!("refusing to fold ledgers with strategies {ours} and {theirs}");
            return Err(Error::incompatible_strategies("Ledger fold", &ours, &theirs));
        }

        let mut entries = self.count_map();
        for (key, count) in other.rows() {
            *entries.entry(key.clone()).or_insert(0) += count;
        }
        Ok(Ledger::with_entries(self.strategies.clone(), entries))
    }

    fn count_map(&self) -> BTreeMap<Key, u64> {
        self.rows().map(|(key, count)| (key.clone(), count)).collect()
    }

    fn fresh_copy(&self) -> Ledger {
        Ledger::with_entries(self.strategies.clone(), self.count_map())
    }

    fn is_blank(&self) -> bool {
        self.strategies.is_empty() && self.entries.is_empty()
    }

    /// Descriptors of the dimension strategies
    pub fn descriptors(&self) -> Vec<String> {
        self.strategies.iter().map(BucketingStrategy::descriptor).collect()
    }

    /// Count recorded for a bucketed combination (lower bounds, NaN for missing)
    pub fn get(&self, key: &[f64]) -> u64 {
        self.entries
            .get(to_key(key).as_slice())
            .map(|&slot| self.counts[slot])
            .unwrap_or(0)
    }

    /// Number of distinct combinations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of samples counted
    pub fn total_count(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest count of any combination
    pub fn max_count(&self) -> Option<u64> {
        self.counts.iter().copied().max()
    }

    /// Smallest count of any combination
    pub fn min_count(&self) -> Option<u64> {
        self.counts.iter().copied().min()
    }

    /// Largest non-missing key component in a column
    pub fn max_key(&self, column: usize) -> Option<f64> {
        self.column_values(column).fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
    }

    /// Smallest non-missing key component in a column
    pub fn min_key(&self, column: usize) -> Option<f64> {
        self.column_values(column).fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
    }

    fn column_values(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.entries
            .keys()
            .filter_map(move |k| k.get(column))
            .map(|v| v.0)
            .filter(|v| !v.is_nan())
    }

    /// Iterate over `(combination, count)` pairs in key order
    pub fn entries(&self) -> impl Iterator<Item = (Vec<f64>, u64)> + '_ {
        self.rows().map(|(k, c)| (from_key(k), c))
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.strategies.len() {
            return Err(Error::InvalidInput(format!(
                "column {column} out of range for a ledger with {} dimensions",
                self.strategies.len()
            )));
        }
        Ok(())
    }

    /// Keep only the given columns, summing rows that become identical
    pub fn filter_columns(&self, columns: &[usize]) -> Result<Ledger> {
        for &column in columns {
            self.check_column(column)?;
        }

        let strategies = columns.iter().map(|&i| self.strategies[i].clone()).collect();
        let mut entries = BTreeMap::new();
        for (key, count) in self.rows() {
            let projected: Key = columns.iter().map(|&i| key[i]).collect();
            *entries.entry(projected).or_insert(0) += count;
        }
        Ok(Ledger::with_entries(strategies, entries))
    }

    /// Keep only rows whose component in `column` is one of `ids`
    ///
    /// A NaN id selects rows where the component is missing.
    pub fn filter_rows(&self, column: usize, ids: &[f64]) -> Result<Ledger> {
        self.check_column(column)?;
        let ids: Vec<OrderedFloat<f64>> = ids.iter().map(|&v| OrderedFloat(v)).collect();
        Ok(self.retain_rows(|key| ids.contains(&key[column])))
    }

    /// Keep only rows whose bucket in `column` overlaps one of the ranges
    /// `[lower[i], upper[i])`
    ///
    /// Rows with a missing component in `column` never match.
    pub fn filter_rows_by_range(&self, column: usize, lower: &[f64], upper: &[f64]) -> Result<Ledger> {
        self.check_column(column)?;
        check_ranges(lower, upper)?;

        let strategy = &self.strategies[column];
        Ok(self.retain_rows(|key| {
            let component = key[column].0;
            if component.is_nan() {
                return false;
            }
            intersects_any(strategy.compute_bucket_bounds(component), lower, upper)
        }))
    }

    fn retain_rows<F: Fn(&Key) -> bool>(&self, keep: F) -> Ledger {
        let entries = self
            .rows()
            .filter(|(k, _)| keep(k))
            .map(|(k, c)| (k.clone(), c))
            .collect();
        Ledger::with_entries(self.strategies.clone(), entries)
    }
}

impl Foldable for Ledger {
    fn fold(&self, other: &Self) -> Result<Self> {
        Ledger::fold(self, other)
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ledger({}x{})", self.arity(), self.len())
    }
}

/// Persisted form of a [`Ledger`]: missing components are stored as `None`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerRecord {
    strategies: Vec<BucketingStrategy>,
    entries: Vec<LedgerRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerRow {
    key: Vec<Option<f64>>,
    count: u64,
}

impl From<Ledger> for LedgerRecord {
    fn from(ledger: Ledger) -> Self {
        let entries = ledger
            .rows()
            .map(|(key, count)| LedgerRow {
                key: key.iter().map(|v| (!v.0.is_nan()).then_some(v.0)).collect(),
                count,
            })
            .collect();
        Self {
            strategies: ledger.strategies,
            entries,
        }
    }
}

impl TryFrom<LedgerRecord> for Ledger {
    type Error = Error;

    fn try_from(record: LedgerRecord) -> Result<Self> {
        let arity = record.strategies.len();
        let mut entries = BTreeMap::new();
        for row in record.entries {
            if row.key.len() != arity {
                return Err(Error::size_mismatch(arity, row.key.len(), "ledger row"));
            }
            let key: Key = row
                .key
                .iter()
                .map(|v| OrderedFloat(v.unwrap_or(f64::NAN)))
                .collect();
            *entries.entry(key).or_insert(0) += row.count;
        }
        Ok(Ledger::with_entries(record.strategies, entries))
    }
}
