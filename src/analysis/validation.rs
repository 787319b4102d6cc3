// src/analysis/validation.rs

use thiserror::Error;

use crate::models::analysis::{AnalysisRequest, ValidatedRequest};
use crate::models::region::Region;
use crate::utils::constants::{
    MAX_DISTANCE_THRESHOLD, MAX_SAMPLE_SIZE, MIN_DISTANCE_THRESHOLD, MIN_SAMPLE_SIZE,
};

/// Why a request was rejected before any computation ran.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample size {value} is outside the accepted range {min}..={max}")]
    SampleSizeOutOfRange { value: usize, min: usize, max: usize },
    #[error("distance threshold {value} is outside the accepted range {min}..={max}")]
    DistanceThresholdOutOfRange { value: f64, min: f64, max: f64 },
    #[error("unknown region code '{0}'")]
    UnknownRegion(String),
}

impl AnalysisRequest {
    /// Checks the region code and numeric bounds. Bounds are inclusive and
    /// a non-finite threshold is out of range.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        if !(MIN_SAMPLE_SIZE..=MAX_SAMPLE_SIZE).contains(&self.sample_size) {
            return Err(ValidationError::SampleSizeOutOfRange {
                value: self.sample_size,
                min: MIN_SAMPLE_SIZE,
                max: MAX_SAMPLE_SIZE,
            });
        }

        let threshold = self.distance_threshold;
        if !threshold.is_finite()
            || !(MIN_DISTANCE_THRESHOLD..=MAX_DISTANCE_THRESHOLD).contains(&threshold)
        {
            return Err(ValidationError::DistanceThresholdOutOfRange {
                value: threshold,
                min: MIN_DISTANCE_THRESHOLD,
                max: MAX_DISTANCE_THRESHOLD,
            });
        }

        let region = Region::from_code(&self.state)
            .ok_or_else(|| ValidationError::UnknownRegion(self.state.clone()))?;

        Ok(ValidatedRequest {
            region,
            sample_size: self.sample_size,
            distance_threshold: threshold,
        })
    }
}
