use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::module::default_metrics_path;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// A golden-file suite: one metric set and the fixture pairs to run it on.
///
/// ```toml
/// module = "prometheus"
/// metricset = "collector"
///
/// [[cases]]
/// metrics_file = "fixtures/node.txt"
/// expected_file = "fixtures/node.expected.json"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SuiteConfig {
    pub module: String,
    pub metricset: String,
    #[serde(default)]
    pub update_expected: bool,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    pub cases: Vec<CaseConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseConfig {
    pub metrics_file: PathBuf,
    pub expected_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl SuiteConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: SuiteConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a manifest from disk. Relative fixture paths resolve against the
    /// manifest's own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml(&input)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        for case in &mut self.cases {
            if case.metrics_file.is_relative() {
                case.metrics_file = base.join(&case.metrics_file);
            }
            if case.expected_file.is_relative() {
                case.expected_file = base.join(&case.expected_file);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module.trim().is_empty() {
            return Err(ConfigError::Validation("module name is empty".into()));
        }
        if self.metricset.trim().is_empty() {
            return Err(ConfigError::Validation("metricset name is empty".into()));
        }
        if self.cases.is_empty() {
            return Err(ConfigError::Validation("at least one case is required".into()));
        }

        // Two cases sharing an expected file would overwrite each other on update
        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(&case.expected_file) {
                return Err(ConfigError::Validation(format!(
                    "expected_file '{}' is used by more than one case",
                    case.expected_file.display()
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
