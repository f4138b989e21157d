//! Configuration loading and validation.
//!
//! - Loading `training.json`
//! - Resolution order (CLI > env > XDG > defaults)
//! - Semantic validation
//! - Provenance (source path and content hash) for reports

pub mod training;
pub mod validation;

pub use training::TrainingConfig;
pub use validation::{validate_training, ValidationError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "hmm";

/// Environment variable naming a config directory.
pub const CONFIG_DIR_ENV: &str = "HMM_CONFIG_DIR";

const TRAINING_FILE: &str = "training.json";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl From<ConfigError> for hmm_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(e) => hmm_common::Error::InvalidSettings(e.to_string()),
            other => hmm_common::Error::Config(other.to_string()),
        }
    }
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub training: TrainingConfig,
    /// File the settings came from (None if using defaults).
    pub training_path: Option<PathBuf>,
    /// Hash of the file content (None if using defaults).
    pub training_hash: Option<String>,
    /// The config directory used for resolution.
    pub config_dir: PathBuf,
}

impl ResolvedConfig {
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            training_path: self.training_path.clone(),
            training_hash: self.training_hash.clone(),
            schema_version: self.training.schema_version.clone(),
            config_dir: self.config_dir.clone(),
        }
    }
}

/// Config provenance embedded in command output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub training_path: Option<PathBuf>,
    pub training_hash: Option<String>,
    pub schema_version: String,
    pub config_dir: PathBuf,
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config directory (highest priority).
    pub config_dir: Option<PathBuf>,
    /// Explicit `training.json` path; must exist.
    pub training_path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit options (`--config`)
/// 2. `HMM_CONFIG_DIR`
/// 3. XDG config home (`~/.config/hmm/`)
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let config_dir = resolve_config_dir(options);

    let (training, training_path, training_hash) =
        load_training(&config_dir, options.training_path.as_deref())?;

    validate_training(&training)?;

    Ok(ResolvedConfig {
        training,
        training_path,
        training_hash,
        config_dir,
    })
}

fn resolve_config_dir(options: &ConfigOptions) -> PathBuf {
    if let Some(dir) = &options.config_dir {
        return dir.clone();
    }

    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    let xdg_config = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });

    xdg_config.join(CONFIG_DIR_NAME)
}

type Loaded = (TrainingConfig, Option<PathBuf>, Option<String>);

fn load_training(config_dir: &Path, explicit_path: Option<&Path>) -> Result<Loaded, ConfigError> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let (training, hash) = load_training_from_file(path)?;
        return Ok((training, Some(path.to_path_buf()), Some(hash)));
    }

    let default_path = config_dir.join(TRAINING_FILE);
    if default_path.exists() {
        let (training, hash) = load_training_from_file(&default_path)?;
        return Ok((training, Some(default_path), Some(hash)));
    }

    Ok((TrainingConfig::default(), None, None))
}

fn load_training_from_file(path: &Path) -> Result<(TrainingConfig, String), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let hash = compute_hash(&content);

    let training: TrainingConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    if training.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::VersionMismatch {
            expected: CONFIG_SCHEMA_VERSION.to_string(),
            actual: training.schema_version.clone(),
        });
    }

    Ok((training, hash))
}

/// Content fingerprint; identifies a config file, not a security hash.
fn compute_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Options pointing at an empty directory, independent of the environment.
    fn options_in(dir: &Path) -> ConfigOptions {
        ConfigOptions {
            config_dir: Some(dir.to_path_buf()),
            training_path: None,
        }
    }

    #[test]
    fn test_defaults_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&options_in(dir.path())).unwrap();
        assert_eq!(config.training, TrainingConfig::default());
        assert!(config.training_path.is_none());
        assert!(config.training_hash.is_none());
        assert_eq!(config.config_dir, dir.path());
    }

    #[test]
    fn test_file_in_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("training.json"),
            r#"{"schema_version":"1.0.0","max_iterations":7,"tolerance":0.001}"#,
        )
        .unwrap();

        let config = load_config(&options_in(dir.path())).unwrap();
        assert_eq!(config.training.max_iterations, 7);
        assert_eq!(config.training.tolerance, 0.001);
        assert_eq!(config.training_path, Some(dir.path().join("training.json")));
        assert_eq!(config.training_hash.as_ref().map(String::len), Some(16));
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("training.json"), r#"{"max_iterations":7}"#).unwrap();
        let explicit = dir.path().join("other.json");
        fs::write(&explicit, r#"{"max_iterations":3}"#).unwrap();

        let options = ConfigOptions {
            config_dir: Some(dir.path().to_path_buf()),
            training_path: Some(explicit.clone()),
        };
        let config = load_config(&options).unwrap();
        assert_eq!(config.training.max_iterations, 3);
        assert_eq!(config.snapshot().training_path, Some(explicit));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let options = ConfigOptions {
            config_dir: Some(dir.path().to_path_buf()),
            training_path: Some(dir.path().join("missing.json")),
        };
        assert!(matches!(
            load_config(&options),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_parse_and_version_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training.json");

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config(&options_in(dir.path())),
            Err(ConfigError::ParseError { .. })
        ));

        fs::write(&path, r#"{"schema_version":"9.9.9"}"#).unwrap();
        assert!(matches!(
            load_config(&options_in(dir.path())),
            Err(ConfigError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_semantic_validation_runs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("training.json"), r#"{"tolerance":-1.0}"#).unwrap();
        let err = load_config(&options_in(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        let unified: hmm_common::Error = err.into();
        assert!(matches!(unified, hmm_common::Error::InvalidSettings(_)));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(compute_hash("abc"), compute_hash("abc"));
        assert_ne!(compute_hash("abc"), compute_hash("abd"));
    }
}
