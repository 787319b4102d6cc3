// src/analysis/correlation.rs

use serde::Serialize;

use crate::analysis::sampling::CleanedSample;
use crate::analysis::standardize::is_zero_variance;
use crate::models::feature::Feature;

/// Pairwise Pearson correlation between feature columns.
/// `values[i][j]` correlates `features[i]` with `features[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub features: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Correlates every pair of feature columns of the unscaled sample.
/// A column without variation correlates 0.0 with every other column and
/// 1.0 with itself.
pub fn correlation_matrix(sample: &CleanedSample) -> CorrelationMatrix {
    if sample.is_empty() {
        return CorrelationMatrix::empty();
    }

    let columns: Vec<Vec<f64>> = Feature::ALL.iter().map(|&f| sample.column(f)).collect();
    let k = columns.len();
    let mut values = vec![vec![0.0; k]; k];

    for i in 0..k {
        values[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&columns[i], &columns[j]).unwrap_or(0.0);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        features: Feature::column_names(),
        values,
    }
}

/// Pearson's r, or `None` when either input has fewer than two points or is
/// constant by the same tolerance the standardizer applies.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(ys[..n].iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let std_x = (var_x / n as f64).sqrt();
    let std_y = (var_y / n as f64).sqrt();
    if is_zero_variance(std_x, mean_x) || is_zero_variance(std_y, mean_y) {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}
