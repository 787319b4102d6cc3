// src/utils/env.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const ENV_PATHS: [&str; 3] = [".env", ".env.local", "../.env"];

/// Where the process environment came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSource {
    File(PathBuf),
    System,
}

/// Loads the first `.env` file found. Variables already present in the
/// process environment are left untouched.
///
/// Runs before the logger exists, so the outcome is returned for the caller
/// to log.
pub fn load_env() -> Result<EnvSource> {
    load_env_from(&ENV_PATHS)
}

pub fn load_env_from<P: AsRef<Path>>(paths: &[P]) -> Result<EnvSource> {
    for path in paths.iter().map(AsRef::as_ref) {
        if path.exists() {
            dotenv::from_path(path)
                .with_context(|| format!("Failed to load environment from {}", path.display()))?;
            return Ok(EnvSource::File(path.to_path_buf()));
        }
    }
    Ok(EnvSource::System)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.env");
        let present = dir.path().join("present.env");
        let mut file = std::fs::File::create(&present).unwrap();
        writeln!(file, "CRASH_CLUSTERING_ENV_TEST=from_file").unwrap();

        let source = load_env_from(&[missing, present.clone()]).unwrap();
        assert_eq!(source, EnvSource::File(present));
        assert_eq!(
            std::env::var("CRASH_CLUSTERING_ENV_TEST").unwrap(),
            "from_file"
        );
    }

    #[test]
    fn test_no_file_falls_back_to_system() {
        let dir = tempfile::tempdir().unwrap();
        let source = load_env_from(&[dir.path().join(".env")]).unwrap();
        assert_eq!(source, EnvSource::System);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.env");
        std::fs::write(&broken, "NOT A VALID LINE WITH 'unterminated\n").unwrap();

        let err = load_env_from(&[broken]).unwrap_err();
        assert!(err.to_string().contains("Failed to load environment"));
    }
}
