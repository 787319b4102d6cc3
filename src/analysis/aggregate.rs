// src/analysis/aggregate.rs

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analysis::hierarchical::ClusterAssignment;
use crate::analysis::sampling::CleanedSample;
use crate::models::feature::{Feature, FEATURE_COUNT};
use crate::utils::constants::SUMMARY_DECIMALS;

/// Per-cluster feature means (rounded for display) and member count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    #[serde(rename = "Cluster")]
    pub label: usize,
    #[serde(rename = "Severity")]
    pub severity: f64,
    #[serde(rename = "Temperature(F)")]
    pub temperature_f: f64,
    #[serde(rename = "Humidity(%)")]
    pub humidity_pct: f64,
    #[serde(rename = "Visibility(mi)")]
    pub visibility_mi: f64,
    #[serde(rename = "Wind_Speed(mph)")]
    pub wind_speed_mph: f64,
    #[serde(rename = "Precipitation(in)")]
    pub precipitation_in: f64,
    #[serde(rename = "Count")]
    pub count: usize,
}

impl ClusterSummary {
    fn from_means(label: usize, means: [f64; FEATURE_COUNT], count: usize) -> Self {
        Self {
            label,
            severity: means[Feature::Severity.index()],
            temperature_f: means[Feature::Temperature.index()],
            humidity_pct: means[Feature::Humidity.index()],
            visibility_mi: means[Feature::Visibility.index()],
            wind_speed_mph: means[Feature::WindSpeed.index()],
            precipitation_in: means[Feature::Precipitation.index()],
            count,
        }
    }
}

/// Rounds to `decimals` places, ties to even on the scaled value.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Groups the cleaned rows by assigned label, ascending by label.
/// `assignment.labels[i]` belongs to `sample.rows[i]`.
pub fn aggregate(sample: &CleanedSample, assignment: &ClusterAssignment) -> Vec<ClusterSummary> {
    let mut sums: BTreeMap<usize, ([f64; FEATURE_COUNT], usize)> = BTreeMap::new();

    for (record, &label) in sample.rows.iter().zip(assignment.labels.iter()) {
        let (totals, count) = sums.entry(label).or_insert(([0.0; FEATURE_COUNT], 0));
        for (total, value) in totals.iter_mut().zip(record.features()) {
            *total += value;
        }
        *count += 1;
    }

    sums.into_iter()
        .map(|(label, (totals, count))| {
            let means = totals.map(|t| round_to(t / count as f64, SUMMARY_DECIMALS));
            ClusterSummary::from_means(label, means, count)
        })
        .collect()
}
