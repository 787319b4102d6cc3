// src/analysis/standardize.rs

use ndarray::{Array2, ArrayView1};

use crate::analysis::sampling::CleanedSample;
use crate::models::feature::{Feature, FEATURE_COUNT};
use crate::utils::constants::ZERO_VARIANCE_TOLERANCE;

/// Mean and standard deviation used to scale one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnScale {
    pub feature: Feature,
    pub mean: f64,
    pub std_dev: f64,
    pub zero_variance: bool,
}

/// Feature matrix scaled to zero mean and unit variance, one row per
/// cleaned record in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedMatrix {
    pub values: Array2<f64>,
    pub scales: [ColumnScale; FEATURE_COUNT],
}

impl StandardizedMatrix {
    pub fn zero_variance_features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.scales
            .iter()
            .filter(|s| s.zero_variance)
            .map(|s| s.feature)
    }
}

/// Copies the cleaned feature values into an `n x FEATURE_COUNT` matrix.
pub fn feature_matrix(sample: &CleanedSample) -> Array2<f64> {
    let mut matrix = Array2::zeros((sample.len(), FEATURE_COUNT));
    for (i, record) in sample.rows.iter().enumerate() {
        for (j, value) in record.features().iter().enumerate() {
            matrix[[i, j]] = *value;
        }
    }
    matrix
}

/// Standardizes each column with its population mean and standard deviation.
/// Columns whose deviation is effectively zero become all zeros.
pub fn standardize(sample: &CleanedSample) -> StandardizedMatrix {
    let mut values = feature_matrix(sample);

    let scales = Feature::ALL.map(|feature| column_scale(feature, values.column(feature.index())));

    for scale in scales.iter() {
        let mut column = values.column_mut(scale.feature.index());
        if scale.zero_variance {
            column.fill(0.0);
        } else {
            column.mapv_inplace(|x| (x - scale.mean) / scale.std_dev);
        }
    }

    StandardizedMatrix { values, scales }
}

/// Whether a column with this population deviation and mean is constant up to
/// rounding noise. Also treats a non-finite deviation as constant.
pub fn is_zero_variance(std_dev: f64, mean: f64) -> bool {
    !(std_dev > ZERO_VARIANCE_TOLERANCE * mean.abs().max(1.0))
}

fn column_scale(feature: Feature, column: ArrayView1<f64>) -> ColumnScale {
    let n = column.len();
    if n == 0 {
        return ColumnScale {
            feature,
            mean: 0.0,
            std_dev: 0.0,
            zero_variance: true,
        };
    }

    let mean = column.sum() / n as f64;
    let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();
    let zero_variance = is_zero_variance(std_dev, mean);

    ColumnScale {
        feature,
        mean,
        std_dev,
        zero_variance,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::analysis::sampling::impute_medians;
    use crate::models::record::Record;
    use proptest::prelude::*;

    fn record(i: usize, v: &[f64]) -> Record {
        Record {
            id: format!("P-{}", i),
            state: "OH".to_string(),
            severity: Some(v[0]),
            temperature_f: Some(v[1]),
            humidity_pct: Some(v[2]),
            visibility_mi: Some(v[3]),
            wind_speed_mph: Some(v[4]),
            precipitation_in: Some(v[5]),
        }
    }

    proptest! {
        #[test]
        fn prop_columns_are_unit_scaled_or_zero(
            rows in prop::collection::vec(prop::collection::vec(-100.0f64..100.0, FEATURE_COUNT), 2..40)
        ) {
            let records: Vec<Record> = rows.iter().enumerate().map(|(i, v)| record(i, v)).collect();
            let refs: Vec<&Record> = records.iter().collect();
            let matrix = standardize(&impute_medians(&refs));

            for scale in matrix.scales.iter() {
                let column = matrix.values.column(scale.feature.index());
                if scale.zero_variance {
                    prop_assert!(column.iter().all(|v| *v == 0.0));
                } else {
                    let n = column.len() as f64;
                    let mean = column.sum() / n;
                    let std = (column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
                    prop_assert!(mean.abs() < 1e-6);
                    prop_assert!((std - 1.0).abs() < 1e-6);
                }
            }
        }
    }
}
