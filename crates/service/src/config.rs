//! Service configuration loaded from TOML.
//!
//! Every section and key is optional; omitted values take the defaults shown
//! below.
//!
//! # Example
//!
//! ```toml
//! [dataset]
//! count = 250
//! seed = 42
//!
//! [network]
//! latency_ms = 300
//! fail_rate = 0.05
//!
//! [workflow]
//! model = "branching"   # or "linear"
//!
//! [pagination]
//! default_limit = 20
//! ```

use std::path::{Path, PathBuf};

use findoc_core::{WorkflowModel, DEFAULT_LIMIT};
use serde::{Deserialize, Serialize};

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub dataset: DatasetConfig,
    pub network: NetworkConfig,
    pub workflow: WorkflowConfig,
    pub pagination: PaginationConfig,
}

/// `[dataset]`: the read-only seed set built at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    pub count: usize,
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            count: 250,
            seed: 42,
        }
    }
}

/// `[network]`: simulated latency and failure injection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Mean simulated latency; each call waits this ±20%.
    pub latency_ms: u64,
    /// Probability in `0.0..=1.0` that a call fails before doing any work.
    pub fail_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub model: WorkflowModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size used when a list call passes no limit. Clamped like any
    /// other limit.
    pub default_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("network.fail_rate must be within 0..=1, got {0}")]
    FailRate(f64),
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.network.fail_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::FailRate(rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.dataset.count, 250);
        assert_eq!(config.dataset.seed, 42);
        assert_eq!(config.network.latency_ms, 0);
        assert_eq!(config.workflow.model, WorkflowModel::Branching);
        assert_eq!(config.pagination.default_limit, 20);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [network]
            latency_ms = 300

            [workflow]
            model = "linear"
            "#,
        )
        .unwrap();
        assert_eq!(config.network.latency_ms, 300);
        assert_eq!(config.network.fail_rate, 0.0);
        assert_eq!(config.workflow.model, WorkflowModel::Linear);
        assert_eq!(config.dataset, DatasetConfig::default());
    }

    #[test]
    fn fail_rate_out_of_range_rejected() {
        let err = ServiceConfig::from_toml_str("[network]\nfail_rate = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::FailRate(r) if r == 1.5));
        assert!(err.to_string().contains("0..=1"));
    }

    #[test]
    fn unknown_keys_and_models_rejected() {
        assert!(matches!(
            ServiceConfig::from_toml_str("[dataset]\ncuont = 3\n"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("[workflow]\nmodel = \"spiral\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("findoc.toml");
        std::fs::write(&path, "[dataset]\ncount = 12\nseed = 7\n").unwrap();
        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.dataset, DatasetConfig { count: 12, seed: 7 });

        let missing = dir.path().join("absent.toml");
        let err = ServiceConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
