// src/models/analysis.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::analysis::aggregate::ClusterSummary;
use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::hierarchical::Linkage;
use crate::analysis::linkage::LinkageMatrix;
use crate::models::record::{CleanedRecord, ClusteredRecord};
use crate::models::region::Region;
use crate::utils::constants::{DEFAULT_DISTANCE_THRESHOLD, DEFAULT_SAMPLE_SIZE};

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

fn default_distance_threshold() -> f64 {
    DEFAULT_DISTANCE_THRESHOLD
}

/// Caller-supplied analysis parameters, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Two-letter region code.
    pub state: String,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,
}

impl AnalysisRequest {
    pub fn new(state: impl Into<String>, sample_size: usize, distance_threshold: f64) -> Self {
        Self {
            state: state.into(),
            sample_size,
            distance_threshold,
        }
    }
}

/// A request that passed validation. Only constructed by `AnalysisRequest::validate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedRequest {
    pub region: Region,
    pub sample_size: usize,
    pub distance_threshold: f64,
}

/// Bookkeeping attached to every analysis result, including the empty one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRunInfo {
    pub run_id: String,
    pub generated_at: NaiveDateTime,
    pub region: String,
    pub requested_sample_size: usize,
    pub effective_sample_size: usize,
    pub distance_threshold: f64,
    pub linkage: Linkage,
    pub dataset_fingerprint: Option<String>,
    pub dataset_loaded_at: NaiveDateTime,
}

/// Everything a presentation layer needs to render the analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub run_info: AnalysisRunInfo,
    pub correlation: CorrelationMatrix,
    pub linkage: LinkageMatrix,
    pub cluster_averages: Vec<ClusterSummary>,
    pub clustered_sample: Vec<ClusteredRecord>,
    pub raw_sample: Vec<CleanedRecord>,
    pub n_clusters: usize,
}

impl AnalysisResult {
    /// The result returned when no record matches the region filter.
    pub fn empty(run_info: AnalysisRunInfo) -> Self {
        Self {
            run_info,
            correlation: CorrelationMatrix::empty(),
            linkage: LinkageMatrix::default(),
            cluster_averages: Vec::new(),
            clustered_sample: Vec::new(),
            raw_sample: Vec::new(),
            n_clusters: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.n_clusters == 0 && self.correlation.is_empty() && self.linkage.is_empty()
    }
}
