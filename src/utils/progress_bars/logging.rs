// src/utils/progress_bars/logging.rs - Phase logging helpers for a single analysis run
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::feature::Feature;

#[derive(Clone)]
pub struct AnalysisLogger {
    region_code: String,
    start_time: Instant,
}

impl AnalysisLogger {
    pub fn new(region_code: &str) -> Self {
        Self {
            region_code: region_code.to_string(),
            start_time: Instant::now(),
        }
    }

    fn elapsed_secs(&self) -> f32 {
        self.start_time.elapsed().as_secs_f32()
    }

    pub fn log_start(&self, run_id: &str, sample_size: usize, distance_threshold: f64) {
        info!(
            "[{}] 🚀 Starting clustering analysis (run ID: {}, sample size: {}, threshold: {})",
            self.region_code, run_id, sample_size, distance_threshold
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let msg = if let Some(details) = details {
            format!(
                "[{}] 🔄 Phase: {} - {} [+{:.1}s]",
                self.region_code,
                phase,
                details,
                self.elapsed_secs()
            )
        } else {
            format!(
                "[{}] 🔄 Phase: {} [+{:.1}s]",
                self.region_code,
                phase,
                self.elapsed_secs()
            )
        };
        info!("{}", msg);
    }

    pub fn log_no_matches(&self) {
        info!(
            "[{}] ✨ No records match this region - returning empty result",
            self.region_code
        );
    }

    pub fn log_sample_drawn(&self, drawn: usize, available: usize, requested: usize) {
        info!(
            "[{}] 📊 Sampled {} of {} matching records (requested {})",
            self.region_code, drawn, available, requested
        );
    }

    pub fn log_imputation(&self, feature: Feature, median: f64, filled: usize) {
        if filled > 0 {
            debug!(
                "[{}] 🩹 Filled {} missing {} values with median {:.3}",
                self.region_code,
                filled,
                feature.column_name(),
                median
            );
        }
    }

    pub fn log_all_missing(&self, feature: Feature) {
        warn!(
            "[{}] ⚠️  Every sampled {} value is missing; imputing 0.0",
            self.region_code,
            feature.column_name()
        );
    }

    pub fn log_zero_variance(&self, feature: Feature) {
        warn!(
            "[{}] ⚠️  {} has zero variance in this sample; standardized values set to 0.0",
            self.region_code,
            feature.column_name()
        );
    }

    pub fn log_clustering(&self, merges: usize, clusters: usize) {
        info!(
            "[{}] 🌳 Built hierarchy with {} merges → {} clusters at threshold",
            self.region_code, merges, clusters
        );
    }

    pub fn log_completion(&self, clusters: usize, rows: usize) {
        info!(
            "[{}] 🎉 COMPLETED: {} clusters over {} records in {:.2?}",
            self.region_code,
            clusters,
            rows,
            self.start_time.elapsed()
        );
    }
}
