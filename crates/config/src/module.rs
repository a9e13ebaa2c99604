use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Setup for one module instance: which metric sets to run against which hosts.
///
/// Built once per test case and handed to the fetcher by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub module: String,
    pub metricsets: Vec<String>,
    pub hosts: Vec<String>,
    /// Path appended to hosts that carry no path of their own.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub(crate) fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ModuleConfig {
    /// One module, one metric set, one host.
    pub fn single(module: &str, metricset: &str, host: &str) -> Self {
        Self {
            module: module.to_string(),
            metricsets: vec![metricset.to_string()],
            hosts: vec![host.to_string()],
            metrics_path: default_metrics_path(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module.trim().is_empty() {
            return Err(ConfigError::Validation("module name is empty".into()));
        }

        if self.metricsets.is_empty() {
            return Err(ConfigError::Validation(format!(
                "module '{}': at least one metricset is required",
                self.module
            )));
        }
        if let Some(pos) = self.metricsets.iter().position(|m| m.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "module '{}': metricset #{} is empty",
                self.module,
                pos + 1
            )));
        }

        if self.hosts.is_empty() {
            return Err(ConfigError::Validation(format!(
                "module '{}': at least one host is required",
                self.module
            )));
        }
        if let Some(pos) = self.hosts.iter().position(|h| h.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "module '{}': host #{} is empty",
                self.module,
                pos + 1
            )));
        }

        if !self.metrics_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "metrics_path must start with '/', got '{}'",
                self.metrics_path
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation("timeout_secs must be positive".into()));
        }

        Ok(())
    }
}
