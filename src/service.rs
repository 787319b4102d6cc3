// src/service.rs - Shared entry point for running analyses against one loaded dataset

use anyhow::{anyhow, Context};
use futures::future::join_all;
use log::{info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::analysis::pipeline::{run_clustering_analysis, PipelineOptions};
use crate::analysis::validation::ValidationError;
use crate::data::Dataset;
use crate::models::analysis::AnalysisRequest;
use crate::models::analysis::AnalysisResult;
use crate::models::region::Region;
use crate::utils::config::AnalysisConfig;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid analysis request: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn is_invalid(&self) -> bool {
        matches!(self, AnalysisError::Invalid(_))
    }
}

/// Holds the dataset read-only and runs independent analyses over it.
/// Each analysis owns its sample and intermediate buffers.
#[derive(Clone)]
pub struct ClusteringService {
    dataset: Arc<Dataset>,
    config: AnalysisConfig,
}

impl ClusteringService {
    pub fn new(dataset: Arc<Dataset>, config: AnalysisConfig) -> Self {
        Self { dataset, config }
    }

    /// Loads the dataset named by `config.data_path`.
    pub fn load(config: AnalysisConfig) -> anyhow::Result<Self> {
        let dataset = Dataset::load(&config.data_path).with_context(|| {
            format!("Failed to load dataset from {}", config.data_path.display())
        })?;
        Ok(Self::new(Arc::new(dataset), config))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn regions(&self) -> &'static [Region] {
        Region::all()
    }

    /// Every selectable region paired with how many records it has.
    pub fn region_counts(&self) -> Vec<(Region, usize)> {
        Region::all()
            .iter()
            .map(|region| (*region, self.dataset.count_for_region(region.code)))
            .collect()
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_rng(request, &mut rand::thread_rng())
    }

    /// Same as `analyze` with a caller-supplied random source, for reproducible samples.
    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        request: &AnalysisRequest,
        rng: &mut R,
    ) -> Result<AnalysisResult, AnalysisError> {
        let validated = request.validate()?;
        let options = PipelineOptions::from(&self.config);
        let result = run_clustering_analysis(&self.dataset, &validated, &options, rng)?;
        Ok(result)
    }

    /// Runs one analysis on the blocking pool so the caller's runtime stays responsive.
    pub async fn analyze_async(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let validated = request.validate()?;
        let options = PipelineOptions::from(&self.config);
        let dataset = Arc::clone(&self.dataset);

        let result = tokio::task::spawn_blocking(move || {
            run_clustering_analysis(&dataset, &validated, &options, &mut rand::thread_rng())
        })
        .await
        .map_err(|e| anyhow!("Analysis task for {} did not complete: {}", request.state, e))??;

        Ok(result)
    }

    /// Runs several analyses with at most `max_concurrent_analyses` in flight.
    /// Results come back in request order.
    pub async fn analyze_batch(
        &self,
        requests: Vec<AnalysisRequest>,
    ) -> Vec<Result<AnalysisResult, AnalysisError>> {
        let start = Instant::now();
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_analyses.max(1)));
        info!(
            "🚀 Running {} analyses with up to {} in parallel",
            total, self.config.max_concurrent_analyses
        );

        let tasks = requests.into_iter().map(|request| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| anyhow!("Analysis semaphore closed: {}", e))?;
                self.analyze_async(request).await
            }
        });
        let results = join_all(tasks).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!("⚠️ {} of {} analyses failed", failed, total);
        }
        info!(
            "✅ Batch of {} analyses finished in {:.2?}",
            total,
            start.elapsed()
        );
        results
    }
}
