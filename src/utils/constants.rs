// src/utils/constants.rs

/// Inclusive bounds for the number of records drawn per analysis.
/// Clustering is quadratic in this value, so the upper bound caps latency and memory.
pub const MIN_SAMPLE_SIZE: usize = 100;
pub const MAX_SAMPLE_SIZE: usize = 10_000;
pub const DEFAULT_SAMPLE_SIZE: usize = 1_000;

/// Inclusive bounds for the label-cutting distance threshold.
pub const MIN_DISTANCE_THRESHOLD: f64 = 0.0;
pub const MAX_DISTANCE_THRESHOLD: f64 = 100.0;
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 20.0;

/// Maximum rows returned in each sample preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

/// Decimal places kept for per-cluster feature means.
pub const SUMMARY_DECIMALS: i32 = 2;

/// Relative tolerance under which a column's standard deviation counts as zero.
pub const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

pub const DEFAULT_DATA_PATH: &str = "data/crash_data_prepped.csv";
