// src/analysis/pipeline.rs - End-to-end clustering analysis for one request

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::analysis::aggregate::aggregate;
use crate::analysis::correlation::correlation_matrix;
use crate::analysis::hierarchical::{cluster, Linkage};
use crate::analysis::linkage::reconstruct;
use crate::analysis::sampling::{draw_sample, impute_medians};
use crate::analysis::standardize::standardize;
use crate::data::Dataset;
use crate::models::analysis::{AnalysisResult, AnalysisRunInfo, ValidatedRequest};
use crate::models::record::ClusteredRecord;
use crate::utils::config::AnalysisConfig;
use crate::utils::constants::DEFAULT_PREVIEW_ROWS;
use crate::utils::progress_bars::logging::AnalysisLogger;

/// Per-run knobs that do not come from the request itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub linkage: Linkage,
    pub preview_rows: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            linkage: Linkage::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl From<&AnalysisConfig> for PipelineOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            linkage: config.linkage,
            preview_rows: config.preview_rows,
        }
    }
}

/// Samples, cleans, standardizes and clusters the records of one region,
/// and packages everything a presentation layer needs.
///
/// A region without records yields `AnalysisResult::empty`; the only error
/// is an inconsistent merge history, which indicates a bug in the clusterer.
pub fn run_clustering_analysis<R: Rng + ?Sized>(
    dataset: &Dataset,
    request: &ValidatedRequest,
    options: &PipelineOptions,
    rng: &mut R,
) -> Result<AnalysisResult> {
    let run_id = Uuid::new_v4().to_string();
    let region_code = request.region.code;
    let logger = AnalysisLogger::new(region_code);
    logger.log_start(&run_id, request.sample_size, request.distance_threshold);

    let mut run_info = AnalysisRunInfo {
        run_id,
        generated_at: Utc::now().naive_utc(),
        region: region_code.to_string(),
        requested_sample_size: request.sample_size,
        effective_sample_size: 0,
        distance_threshold: request.distance_threshold,
        linkage: options.linkage,
        dataset_fingerprint: dataset.fingerprint().map(str::to_string),
        dataset_loaded_at: dataset.loaded_at(),
    };

    let sample = match draw_sample(dataset, region_code, request.sample_size, rng) {
        Some(sample) => sample,
        None => {
            logger.log_no_matches();
            return Ok(AnalysisResult::empty(run_info));
        }
    };
    logger.log_sample_drawn(sample.len(), sample.available, request.sample_size);
    run_info.effective_sample_size = sample.len();

    logger.log_phase("Imputation", None);
    let cleaned = impute_medians(&sample.rows);
    for column in cleaned.imputations.iter() {
        if column.all_missing {
            logger.log_all_missing(column.feature);
        } else {
            logger.log_imputation(column.feature, column.median, column.filled);
        }
    }

    let raw_sample = cleaned
        .rows
        .iter()
        .take(options.preview_rows)
        .cloned()
        .collect();
    let correlation = correlation_matrix(&cleaned);

    logger.log_phase("Standardization", None);
    let standardized = standardize(&cleaned);
    for feature in standardized.zero_variance_features() {
        logger.log_zero_variance(feature);
    }

    logger.log_phase("Hierarchical clustering", Some(options.linkage.to_string().as_str()));
    let outcome = cluster(
        standardized.values.view(),
        request.distance_threshold,
        options.linkage,
    );
    let linkage = reconstruct(cleaned.len(), &outcome.hierarchy.merges)
        .context("Failed to reconstruct linkage matrix from merge history")?;
    logger.log_clustering(linkage.len(), outcome.assignment.n_clusters);

    let cluster_averages = aggregate(&cleaned, &outcome.assignment);
    let clustered_sample = cleaned
        .rows
        .iter()
        .zip(outcome.assignment.labels.iter())
        .take(options.preview_rows)
        .map(|(record, &cluster)| ClusteredRecord {
            record: record.clone(),
            cluster,
        })
        .collect();

    let n_clusters = cluster_averages.len();
    logger.log_completion(n_clusters, cleaned.len());

    Ok(AnalysisResult {
        run_info,
        correlation,
        linkage,
        cluster_averages,
        clustered_sample,
        raw_sample,
        n_clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::FEATURE_COUNT;
    use crate::models::record::Record;
    use crate::models::region::Region;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn record(id: &str, state: &str, v: f64) -> Record {
        Record {
            id: id.to_string(),
            state: state.to_string(),
            severity: Some(v),
            temperature_f: Some(v),
            humidity_pct: Some(v),
            visibility_mi: Some(v),
            wind_speed_mph: Some(v),
            precipitation_in: Some(v),
        }
    }

    fn request(code: &str, sample_size: usize, distance_threshold: f64) -> ValidatedRequest {
        ValidatedRequest {
            region: Region::from_code(code).unwrap(),
            sample_size,
            distance_threshold,
        }
    }

    fn run(dataset: &Dataset, req: &ValidatedRequest, seed: u64) -> AnalysisResult {
        let mut rng = StdRng::seed_from_u64(seed);
        run_clustering_analysis(dataset, req, &PipelineOptions::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_region_without_records_returns_empty_result() {
        let dataset = Dataset::from_records(vec![record("A-1", "OH", 1.0)]);
        let result = run(&dataset, &request("TX", 500, 10.0), 1);

        assert_eq!(result.n_clusters, 0);
        assert!(result.correlation.is_empty());
        assert!(result.linkage.is_empty());
        assert!(result.cluster_averages.is_empty());
        assert!(result.clustered_sample.is_empty());
        assert!(result.raw_sample.is_empty());
        assert_eq!(result.run_info.effective_sample_size, 0);
        assert_eq!(result.run_info.region, "TX");
        assert_eq!(result.run_info.dataset_loaded_at, dataset.loaded_at());
        assert!(result.is_empty());
    }

    #[test]
    fn test_identical_rows_form_one_cluster() {
        let records = (0..100).map(|i| record(&format!("A-{}", i), "CA", 3.0)).collect();
        let dataset = Dataset::from_records(records);
        let result = run(&dataset, &request("CA", 100, 0.0), 9);

        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.cluster_averages[0].count, 100);
        assert_eq!(result.cluster_averages[0].severity, 3.0);
        assert_eq!(result.linkage.len(), 99);
        assert!(result.linkage.rows.iter().all(|row| row.distance == 0.0));
        assert_eq!(result.linkage.rows[98].leaf_count, 100);
    }

    #[test]
    fn test_two_separated_pairs() {
        let dataset = Dataset::from_records(vec![
            record("A-0", "OH", 0.0),
            record("A-1", "OH", 0.1),
            record("B-0", "OH", 10.0),
            record("B-1", "OH", 10.1),
        ]);

        for seed in 0..5 {
            let result = run(&dataset, &request("OH", 100, 5.0), seed);
            assert_eq!(result.n_clusters, 2);
            assert!(result.cluster_averages.iter().all(|s| s.count == 2));

            let labels: HashMap<&str, usize> = result
                .clustered_sample
                .iter()
                .map(|r| (r.record.id.as_str(), r.cluster))
                .collect();
            assert_eq!(labels["A-0"], labels["A-1"]);
            assert_eq!(labels["B-0"], labels["B-1"]);
            assert_ne!(labels["A-0"], labels["B-0"]);
        }
    }

    #[test]
    fn test_previews_are_capped_and_counts_cover_sample() {
        let records = (0..150)
            .map(|i| record(&format!("A-{}", i), "WA", (i % 7) as f64))
            .collect();
        let dataset = Dataset::from_records(records);
        let result = run(&dataset, &request("WA", 1000, 2.0), 4);

        assert_eq!(result.run_info.effective_sample_size, 150);
        assert_eq!(result.raw_sample.len(), 100);
        assert_eq!(result.clustered_sample.len(), 100);
        assert_eq!(result.linkage.len(), 149);
        assert_eq!(
            result.cluster_averages.iter().map(|s| s.count).sum::<usize>(),
            150
        );
        assert_eq!(result.n_clusters, result.cluster_averages.len());
        assert_eq!(result.correlation.values.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_higher_threshold_never_adds_clusters() {
        let records = (0..120)
            .map(|i| record(&format!("A-{}", i), "NY", ((i * 37) % 101) as f64))
            .collect();
        let dataset = Dataset::from_records(records);

        // Same seed, same sample: only the threshold differs.
        let mut previous = usize::MAX;
        for threshold in [0.0, 0.1, 0.5, 1.0, 3.0, 10.0, 100.0] {
            let result = run(&dataset, &request("NY", 120, threshold), 11);
            assert!(result.n_clusters <= previous);
            previous = result.n_clusters;
        }
        assert_eq!(previous, 1);
    }

    #[test]
    fn test_result_serializes_with_expected_keys() {
        let records = (0..10).map(|i| record(&format!("A-{}", i), "CO", i as f64)).collect();
        let dataset = Dataset::from_records(records);
        let result = run(&dataset, &request("CO", 100, 1.0), 2);

        let value = serde_json::to_value(&result).unwrap();
        for key in [
            "run_info",
            "correlation",
            "linkage",
            "cluster_averages",
            "clustered_sample",
            "raw_sample",
            "n_clusters",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["linkage"].as_array().unwrap().len(), 9);
        assert_eq!(value["linkage"][0].as_array().unwrap().len(), 4);
        assert!(value["clustered_sample"][0].get("Cluster").is_some());
        assert!(value["raw_sample"][0].get("Cluster").is_none());
        assert_eq!(value["run_info"]["linkage"], "ward");
        assert!(value["run_info"]["dataset_loaded_at"].is_string());
        assert!(result.run_info.dataset_loaded_at <= result.run_info.generated_at);
    }
}
