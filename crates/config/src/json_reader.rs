// JSON reader settings
// Consumed by the log decoding stage; carried here as a plain record.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How raw JSON lines are decoded into event fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonReaderConfig {
    /// Field that holds the raw text to decode.
    pub message_key: String,
    /// Field the decoded object is placed under.
    #[serde(rename = "target", alias = "target_key")]
    pub target_key: String,
    /// Merge decoded keys into the top level instead of `target`.
    pub keys_under_root: bool,
    /// Let decoded keys overwrite existing fields on collision.
    pub overwrite_keys: bool,
    /// Annotate the event with an error key when decoding fails.
    pub add_error_key: bool,
}

impl JsonReaderConfig {
    /// Every combination of options is accepted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}
