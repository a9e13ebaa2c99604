// Configuration loading

pub mod error;
pub mod json_reader;
pub mod module;
pub mod suite;

pub use error::ConfigError;
pub use json_reader::JsonReaderConfig;
pub use module::ModuleConfig;
pub use suite::{CaseConfig, SuiteConfig};
