// src/utils/config.rs

use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::analysis::hierarchical::Linkage;
use crate::utils::constants::{DEFAULT_DATA_PATH, DEFAULT_PREVIEW_ROWS};

/// Process-wide analysis settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// CSV file holding the crash dataset
    pub data_path: PathBuf,
    /// Linkage criterion used by the hierarchical clusterer
    pub linkage: Linkage,
    /// Maximum rows in the raw and clustered sample previews
    pub preview_rows: usize,
    /// Upper bound on analyses running at the same time
    pub max_concurrent_analyses: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            linkage: Linkage::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            max_concurrent_analyses: num_cpus::get().max(1),
        }
    }
}

impl AnalysisConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset keys take
    /// their defaults; unparsable ones are reported and also take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_path = lookup("CRASH_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let linkage = parse_or_default(&lookup, "CLUSTER_LINKAGE", defaults.linkage);
        let preview_rows = parse_or_default(&lookup, "PREVIEW_ROWS", defaults.preview_rows);
        let max_concurrent_analyses = parse_or_default(
            &lookup,
            "MAX_CONCURRENT_ANALYSES",
            defaults.max_concurrent_analyses,
        )
        .max(1);

        let config = Self {
            data_path,
            linkage,
            preview_rows,
            max_concurrent_analyses,
        };
        debug!("Analysis config: {:?}", config);
        config
    }

    /// Log the current configuration
    pub fn log_config(&self) {
        info!("📁 Crash data path: {}", self.data_path.display());
        info!("🌳 Linkage criterion: {}", self.linkage);
        info!("👀 Sample preview rows: {}", self.preview_rows);
        info!("⚙️  Max concurrent analyses: {}", self.max_concurrent_analyses);
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "Ignoring invalid value {:?} for {}; using default {:?}",
                    raw, key, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.linkage, Linkage::Ward);
        assert_eq!(config.preview_rows, 100);
        assert!(config.max_concurrent_analyses >= 1);
    }

    #[test]
    fn test_values_from_lookup() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[
            ("CRASH_DATA_PATH", "/tmp/crashes.csv"),
            ("CLUSTER_LINKAGE", "average"),
            ("PREVIEW_ROWS", "25"),
            ("MAX_CONCURRENT_ANALYSES", "3"),
        ]));
        assert_eq!(config.data_path, PathBuf::from("/tmp/crashes.csv"));
        assert_eq!(config.linkage, Linkage::Average);
        assert_eq!(config.preview_rows, 25);
        assert_eq!(config.max_concurrent_analyses, 3);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[
            ("CLUSTER_LINKAGE", "centroid"),
            ("PREVIEW_ROWS", "many"),
            ("MAX_CONCURRENT_ANALYSES", "0"),
        ]));
        assert_eq!(config.linkage, Linkage::Ward);
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
        assert_eq!(config.max_concurrent_analyses, 1);
    }
}
