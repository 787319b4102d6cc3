// src/analysis/sampling.rs

use rand::seq::index;
use rand::Rng;

use crate::data::Dataset;
use crate::models::feature::{Feature, FEATURE_COUNT};
use crate::models::record::{CleanedRecord, Record};

/// Records drawn without replacement for one analysis run, in draw order.
#[derive(Debug, Clone)]
pub struct Sample<'a> {
    pub rows: Vec<&'a Record>,
    /// How many records matched the region filter before sampling.
    pub available: usize,
}

impl<'a> Sample<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// How one feature column was imputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnImputation {
    pub feature: Feature,
    /// Value used to fill gaps; 0.0 when the whole column was missing.
    pub median: f64,
    pub filled: usize,
    pub all_missing: bool,
}

/// A sample with every missing feature value replaced by its column median.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedSample {
    pub rows: Vec<CleanedRecord>,
    pub imputations: [ColumnImputation; FEATURE_COUNT],
}

impl CleanedSample {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one feature across all rows, in row order.
    pub fn column(&self, feature: Feature) -> Vec<f64> {
        self.rows.iter().map(|r| r.feature(feature)).collect()
    }
}

/// Draws `min(sample_size, matches)` records of `region_code` uniformly
/// without replacement. Returns `None` when nothing matches the region.
pub fn draw_sample<'a, R: Rng + ?Sized>(
    dataset: &'a Dataset,
    region_code: &str,
    sample_size: usize,
    rng: &mut R,
) -> Option<Sample<'a>> {
    let matching = dataset.records_for_region(region_code);
    if matching.is_empty() {
        return None;
    }

    let available = matching.len();
    let amount = sample_size.min(available);
    let rows = index::sample(rng, available, amount)
        .into_iter()
        .map(|i| matching[i])
        .collect();

    Some(Sample { rows, available })
}

/// Fills missing (or non-finite) feature values with the median of the
/// column's present values within `rows`. A column with no present value is
/// filled with 0.0.
pub fn impute_medians(rows: &[&Record]) -> CleanedSample {
    let imputations = Feature::ALL.map(|feature| {
        let mut present: Vec<f64> = rows
            .iter()
            .filter_map(|r| present_value(r.feature(feature)))
            .collect();
        let filled = rows.len() - present.len();
        match median(&mut present) {
            Some(median) => ColumnImputation {
                feature,
                median,
                filled,
                all_missing: false,
            },
            None => ColumnImputation {
                feature,
                median: 0.0,
                filled,
                all_missing: true,
            },
        }
    });

    let cleaned = rows
        .iter()
        .map(|record| {
            let values = Feature::ALL.map(|feature| {
                present_value(record.feature(feature))
                    .unwrap_or(imputations[feature.index()].median)
            });
            CleanedRecord::from_values(record.id.clone(), values)
        })
        .collect();

    CleanedSample {
        rows: cleaned,
        imputations,
    }
}

fn present_value(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Median of `values`, averaging the two middle values for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
