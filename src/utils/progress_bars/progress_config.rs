// src/utils/progress_bars/progress_config.rs

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::env;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} [{elapsed_precise}] {msg}";

/// Configuration for progress tracking in the command-line tool
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Refresh rate for spinners in milliseconds
    pub refresh_rate_ms: u64,
    /// Whether to log memory usage after the dataset loads
    pub show_memory: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_rate_ms: 100,
            show_memory: true,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            refresh_rate_ms: env::var("PROGRESS_REFRESH_RATE_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            show_memory: env::var("PROGRESS_SHOW_MEMORY")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// Create a MultiProgress instance if progress is enabled, None otherwise
    pub fn create_multi_progress(&self) -> Option<MultiProgress> {
        if self.enabled {
            Some(MultiProgress::new())
        } else {
            None
        }
    }

    /// Check if memory usage should be shown
    pub fn should_show_memory(&self) -> bool {
        self.enabled && self.show_memory
    }

    /// Adds a ticking spinner to `multi_progress`, if there is one.
    pub fn add_spinner(
        &self,
        multi_progress: Option<&MultiProgress>,
        message: &str,
    ) -> Option<ProgressBar> {
        let mp = multi_progress?;
        let pb = mp.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(self.refresh_rate_ms));
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert!(config.enabled);
        assert_eq!(config.refresh_rate_ms, 100);
        assert!(config.show_memory);
    }

    #[test]
    fn test_multi_progress_creation() {
        let mut config = ProgressConfig::default();

        config.enabled = true;
        assert!(config.create_multi_progress().is_some());

        config.enabled = false;
        assert!(config.create_multi_progress().is_none());
    }

    #[test]
    fn test_should_show_memory() {
        let mut config = ProgressConfig::default();
        assert!(config.should_show_memory());

        config.show_memory = false;
        assert!(!config.should_show_memory());

        config.show_memory = true;
        config.enabled = false;
        assert!(!config.should_show_memory());
    }

    #[test]
    fn test_spinner_only_created_with_multi_progress() {
        let config = ProgressConfig::default();
        assert!(config.add_spinner(None, "loading").is_none());

        let mp = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let pb = config.add_spinner(Some(&mp), "loading").unwrap();
        assert_eq!(pb.message(), "loading");
        pb.finish_and_clear();
    }
}
