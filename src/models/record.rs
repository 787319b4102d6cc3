// src/models/record.rs

use serde::{Deserialize, Serialize};

use crate::models::feature::{Feature, FEATURE_COUNT};

/// One crash observation as loaded from the source dataset.
/// Feature values are optional because the source has gaps.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Severity")]
    pub severity: Option<f64>,
    #[serde(rename = "Temperature(F)")]
    pub temperature_f: Option<f64>,
    #[serde(rename = "Humidity(%)")]
    pub humidity_pct: Option<f64>,
    #[serde(rename = "Visibility(mi)")]
    pub visibility_mi: Option<f64>,
    #[serde(rename = "Wind_Speed(mph)")]
    pub wind_speed_mph: Option<f64>,
    #[serde(rename = "Precipitation(in)")]
    pub precipitation_in: Option<f64>,
}

impl Record {
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Severity => self.severity,
            Feature::Temperature => self.temperature_f,
            Feature::Humidity => self.humidity_pct,
            Feature::Visibility => self.visibility_mi,
            Feature::WindSpeed => self.wind_speed_mph,
            Feature::Precipitation => self.precipitation_in,
        }
    }

    /// Raw feature values in column order, `None` where missing.
    pub fn features(&self) -> [Option<f64>; FEATURE_COUNT] {
        Feature::ALL.map(|f| self.feature(f))
    }
}

/// A sampled record after median imputation: identifier plus six present values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedRecord {
    #[serde(rename = "ID")]
    pub id: String,
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
}

impl CleanedRecord {
    pub fn from_values(id: String, values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            id,
            severity: values[Feature::Severity.index()],
            temperature_f: values[Feature::Temperature.index()],
            humidity_pct: values[Feature::Humidity.index()],
            visibility_mi: values[Feature::Visibility.index()],
            wind_speed_mph: values[Feature::WindSpeed.index()],
            precipitation_in: values[Feature::Precipitation.index()],
        }
    }

    pub fn feature(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Severity => self.severity,
            Feature::Temperature => self.temperature_f,
            Feature::Humidity => self.humidity_pct,
            Feature::Visibility => self.visibility_mi,
            Feature::WindSpeed => self.wind_speed_mph,
            Feature::Precipitation => self.precipitation_in,
        }
    }

    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        Feature::ALL.map(|f| self.feature(f))
    }
}

/// A cleaned record tagged with the cluster label it was assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteredRecord {
    #[serde(flatten)]
    pub record: CleanedRecord,
    #[serde(rename = "Cluster")]
    pub cluster: usize,
}
