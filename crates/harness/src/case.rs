use std::path::PathBuf;

use serde::Serialize;

use mbgolden_config::CaseConfig;

/// Environment variable that switches a run into regeneration mode.
pub const UPDATE_ENV: &str = "MBGOLDEN_UPDATE_EXPECTED";

/// One raw payload and the events it is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub metrics_file: PathBuf,
    pub expected_file: PathBuf,
}

impl TestCase {
    pub fn new(metrics_file: impl Into<PathBuf>, expected_file: impl Into<PathBuf>) -> Self {
        Self {
            metrics_file: metrics_file.into(),
            expected_file: expected_file.into(),
        }
    }

    /// Pair a raw payload with `<metrics_file>.expected.json` beside it.
    pub fn beside(metrics_file: impl Into<PathBuf>) -> Self {
        let metrics_file = metrics_file.into();
        let mut expected = metrics_file.clone().into_os_string();
        expected.push(".expected.json");
        Self {
            metrics_file,
            expected_file: PathBuf::from(expected),
        }
    }
}

impl From<CaseConfig> for TestCase {
    fn from(case: CaseConfig) -> Self {
        Self {
            metrics_file: case.metrics_file,
            expected_file: case.expected_file,
        }
    }
}

/// Whether a run compares against expected fixtures or rewrites them first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    #[default]
    Compare,
    /// Overwrite every expected fixture with the fresh output, then compare.
    Regenerate,
}

impl UpdateMode {
    /// Read [`UPDATE_ENV`]. `1`, `true` and `yes` (any case) enable
    /// regeneration; anything else, or unset, compares.
    pub fn from_env() -> Self {
        Self::from_flag(std::env::var(UPDATE_ENV).ok().as_deref())
    }

    pub fn from_flag(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => Self::Regenerate,
            _ => Self::Compare,
        }
    }

    pub fn from_bool(regenerate: bool) -> Self {
        if regenerate {
            Self::Regenerate
        } else {
            Self::Compare
        }
    }

    pub fn is_regenerate(self) -> bool {
        self == Self::Regenerate
    }
}
