//! Pipeline-facing accumulators
//!
//! The raster pipeline drives one accumulator per partition: it calls
//! [`Accumulator::initialise`] once, [`Accumulator::update`] once per pixel
//! and finally hands the accumulated output to the orchestrator, which
//! folds the outputs of all partitions together.

use crate::config::AccumulatorConfig;
use num_traits::ToPrimitive;
use tilestat_core::{Error, Foldable, Result, SampleFilter};
use tilestat_histogram::{VectorCategoryMap, VectorHistogram, VectorStats};
use tilestat_ledger::Ledger;

/// What an accumulator needs to know about the raster it will see
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorContext {
    /// Number of bands (components) per pixel
    pub bands: usize,
    pub config: AccumulatorConfig,
}

impl AccumulatorContext {
    pub fn new(bands: usize) -> Self {
        Self::with_config(bands, AccumulatorConfig::default())
    }

    pub fn with_config(bands: usize, config: AccumulatorConfig) -> Self {
        Self { bands, config }
    }

    fn filter(&self) -> SampleFilter {
        SampleFilter::new(self.config.nodata)
    }
}

/// A per-partition aggregate fed one pixel at a time
pub trait Accumulator: Sized {
    /// The foldable aggregate this accumulator produces
    type Output: Foldable;

    /// Create an empty accumulator sized from the context
    fn initialise(context: &AccumulatorContext) -> Result<Self>;

    /// Add one pixel; `pixel` holds one sample per band
    fn update<T: ToPrimitive + Copy>(&mut self, pixel: &[T]) -> Result<()>;

    /// The aggregate accumulated so far
    fn accumulated_output(&self) -> &Self::Output;

    /// Consume the accumulator, keeping only its aggregate
    fn into_output(self) -> Self::Output;
}

/// Run an accumulator over every pixel of a partition
pub fn accumulate<'a, A, T, I>(context: &AccumulatorContext, pixels: I) -> Result<A::Output>
where
    A: Accumulator,
    T: ToPrimitive + Copy + 'a,
    I: IntoIterator<Item = &'a [T]>,
{
    let mut acc = A::initialise(context)?;
    for pixel in pixels {
        acc.update(pixel)?;
    }
    Ok(acc.into_output())
}

/// Convert a pixel into `buffer`, blanking nodata
fn convert<T: ToPrimitive + Copy>(
    filter: &SampleFilter,
    pixel: &[T],
    bands: usize,
    buffer: &mut Vec<f64>,
) -> Result<()> {
    if pixel.len() != bands {
        return Err(Error::size_mismatch(bands, pixel.len(), "pixel"));
    }
    buffer.clear();
    buffer.extend(pixel.iter().map(|&v| filter.apply(v)));
    Ok(())
}

/// Running statistics per band
#[derive(Debug, Clone)]
pub struct StatisticsAccumulator {
    filter: SampleFilter,
    buffer: Vec<f64>,
    stats: VectorStats,
}

impl Accumulator for StatisticsAccumulator {
    type Output = VectorStats;

    fn initialise(context: &AccumulatorContext) -> Result<Self> {
        log::debug!("statistics accumulator over {} bands", context.bands);
        Ok(Self {
            filter: context.filter(),
            buffer: Vec::with_capacity(context.bands),
            stats: VectorStats::new(context.bands),
        })
    }

    fn update<T: ToPrimitive + Copy>(&mut self, pixel: &[T]) -> Result<()> {
        convert(&self.filter, pixel, self.stats.len(), &mut self.buffer)?;
        self.stats.update(&self.buffer)
    }

    fn accumulated_output(&self) -> &VectorStats {
        &self.stats
    }

    fn into_output(self) -> VectorStats {
        self.stats
    }
}

/// One histogram per band
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    filter: SampleFilter,
    buffer: Vec<f64>,
    histograms: VectorHistogram,
}

impl Accumulator for HistogramAccumulator {
    type Output = VectorHistogram;

    fn initialise(context: &AccumulatorContext) -> Result<Self> {
        let strategy = context.config.strategy()?;
        log::debug!(
            "histogram accumulator over {} bands with {}",
            context.bands,
            strategy
        );
        Ok(Self {
            filter: context.filter(),
            buffer: Vec::with_capacity(context.bands),
            histograms: VectorHistogram::new(context.bands, strategy),
        })
    }

    fn update<T: ToPrimitive + Copy>(&mut self, pixel: &[T]) -> Result<()> {
        convert(&self.filter, pixel, self.histograms.len(), &mut self.buffer)?;
        self.histograms.update(&self.buffer)
    }

    fn accumulated_output(&self) -> &VectorHistogram {
        &self.histograms
    }

    fn into_output(self) -> VectorHistogram {
        self.histograms
    }
}

/// Per-band histograms grouped by the category held in one band
///
/// The category band is taken out of each pixel; the remaining bands are
/// histogrammed under that category.
#[derive(Debug, Clone)]
pub struct CategoriesAccumulator {
    filter: SampleFilter,
    buffer: Vec<f64>,
    category_band: usize,
    bands: usize,
    categories: VectorCategoryMap,
}

impl CategoriesAccumulator {
    /// Add one pixel whose category comes from a separate source
    pub fn update_with_category<C, T>(&mut self, category: C, values: &[T]) -> Result<()>
    where
        C: ToPrimitive,
        T: ToPrimitive + Copy,
    {
        let category = self.filter.apply(category);
        self.buffer.clear();
        self.buffer.extend(values.iter().map(|&v| self.filter.apply(v)));
        self.categories.update(category, &self.buffer)
    }
}

impl Accumulator for CategoriesAccumulator {
    type Output = VectorCategoryMap;

    fn initialise(context: &AccumulatorContext) -> Result<Self> {
        let category_band = context.config.category_band;
        if context.bands < 2 || category_band >= context.bands {
            return Err(Error::InvalidParameter(format!(
                "category band {category_band} needs a raster with it and at least one other band, got {} bands",
                context.bands
            )));
        }
        let strategy = context.config.strategy()?;
        log::debug!(
            "categories accumulator over {} bands, categories in band {category_band}, with {strategy}",
            context.bands
        );
        Ok(Self {
            filter: context.filter(),
            buffer: Vec::with_capacity(context.bands),
            category_band,
            bands: context.bands,
            categories: VectorCategoryMap::new(context.bands - 1, strategy),
        })
    }

    fn update<T: ToPrimitive + Copy>(&mut self, pixel: &[T]) -> Result<()> {
        if pixel.len() != self.bands {
            return Err(Error::size_mismatch(self.bands, pixel.len(), "pixel"));
        }
        let category = self.filter.apply(pixel[self.category_band]);
        self.buffer.clear();
        for (band, &v) in pixel.iter().enumerate() {
            if band != self.category_band {
                self.buffer.push(self.filter.apply(v));
            }
        }
        self.categories.update(category, &self.buffer)
    }

    fn accumulated_output(&self) -> &VectorCategoryMap {
        &self.categories
    }

    fn into_output(self) -> VectorCategoryMap {
        self.categories
    }
}

/// Co-occurrence counts of bucketed band values
#[derive(Debug, Clone)]
pub struct LedgerAccumulator {
    filter: SampleFilter,
    buffer: Vec<f64>,
    ledger: Ledger,
}

impl Accumulator for LedgerAccumulator {
    type Output = Ledger;

    fn initialise(context: &AccumulatorContext) -> Result<Self> {
        let strategies = context.config.ledger_strategies(context.bands)?;
        log::debug!(
            "ledger accumulator over {} bands with {}",
            context.bands,
            context.config.ledger_buckets
        );
        Ok(Self {
            filter: context.filter(),
            buffer: Vec::with_capacity(context.bands),
            ledger: Ledger::new(strategies),
        })
    }

    fn update<T: ToPrimitive + Copy>(&mut self, pixel: &[T]) -> Result<()> {
        convert(&self.filter, pixel, self.ledger.arity(), &mut self.buffer)?;
        self.ledger.add(&self.buffer)
    }

    fn accumulated_output(&self) -> &Ledger {
        &self.ledger
    }

    fn into_output(self) -> Ledger {
        self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context(bands: usize, config: AccumulatorConfig) -> AccumulatorContext {
        AccumulatorContext::with_config(bands, config)
    }

    #[test]
    fn test_statistics_with_nodata() {
        let config = AccumulatorConfig {
            nodata: Some(0.0),
            ..Default::default()
        };
        let pixels: Vec<[u8; 2]> = vec![[10, 0], [20, 4], [0, 6]];
        let stats = accumulate::<StatisticsAccumulator, u8, _>(
            &context(2, config),
            pixels.iter().map(|p| &p[..]),
        )
        .unwrap();

        assert_eq!(stats.get(0).unwrap().count(), 2);
        assert_relative_eq!(stats.get(0).unwrap().mean(), 15.0);
        assert_eq!(stats.get(1).unwrap().count(), 2);
        assert_eq!(stats.get(1).unwrap().min(), 4.0);
    }

    #[test]
    fn test_pixel_size_mismatch() {
        let mut acc = StatisticsAccumulator::initialise(&AccumulatorContext::new(3)).unwrap();
        assert!(matches!(acc.update(&[1.0f32, 2.0]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_histogram_accumulator() {
        let config = AccumulatorConfig {
            buckets: "regular?width=10".to_string(),
            ..Default::default()
        };
        let mut acc = HistogramAccumulator::initialise(&context(1, config)).unwrap();
        for v in [1i16, 5, 12, -3] {
            acc.update(&[v]).unwrap();
        }
        let hist = acc.accumulated_output().get(0).unwrap();
        assert_eq!(hist.len(), 3);
        assert_eq!(hist.total_count(), 4);
    }

    #[test]
    fn test_histogram_accumulator_rejects_bad_descriptor() {
        let config = AccumulatorConfig {
            buckets: "log?base=1".to_string(),
            ..Default::default()
        };
        assert!(HistogramAccumulator::initialise(&context(1, config)).is_err());
    }

    #[test]
    fn test_categories_accumulator() {
        let config = AccumulatorConfig {
            buckets: "categorical".to_string(),
            category_band: 1,
            ..Default::default()
        };
        let mut acc = CategoriesAccumulator::initialise(&context(3, config)).unwrap();
        acc.update(&[5u16, 1, 50]).unwrap();
        acc.update(&[6u16, 1, 60]).unwrap();
        acc.update(&[5u16, 2, 50]).unwrap();
        acc.update_with_category(2u8, &[7u16, 70]).unwrap();

        let cats = acc.into_output();
        assert_eq!(cats.len(), 2);
        let band0 = cats.get(0).unwrap();
        assert_eq!(band0.keys().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(band0.get(1).unwrap().total_count(), 2);
        assert_eq!(band0.get(2).unwrap().total_count(), 2);
    }

    #[test]
    fn test_categories_accumulator_needs_two_bands() {
        assert!(CategoriesAccumulator::initialise(&AccumulatorContext::new(1)).is_err());
        let config = AccumulatorConfig {
            category_band: 4,
            ..Default::default()
        };
        assert!(CategoriesAccumulator::initialise(&context(2, config)).is_err());
    }

    #[test]
    fn test_ledger_accumulator() {
        let config = AccumulatorConfig {
            ledger_buckets: "categorical:regular?width=100".to_string(),
            nodata: Some(255.0),
            ..Default::default()
        };
        let mut acc = LedgerAccumulator::initialise(&context(2, config)).unwrap();
        acc.update(&[1u8, 20]).unwrap();
        acc.update(&[1u8, 99]).unwrap();
        acc.update(&[1u8, 255]).unwrap();
        acc.update(&[255u8, 255]).unwrap();

        let ledger = acc.into_output();
        assert_eq!(ledger.total_count(), 3);
        assert_eq!(ledger.get(&[1.0, 0.0]), 2);
        assert_eq!(ledger.get(&[1.0, f64::NAN]), 1);
    }
}
