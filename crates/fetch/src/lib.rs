//! Metric set fetchers: the collection side the harness drives.
//!
//! A [`MetricSet`] performs one collection cycle against one host and
//! reports every event and every non-fatal error to a
//! [`CapturingReporter`]. The [`Registry`] resolves `(module, metricset)`
//! names to factories and runs a [`ModuleConfig`] end to end.
//!
//! [`ModuleConfig`]: mbgolden_config::ModuleConfig

mod error;
mod http;
mod metricset;
pub mod prometheus;
mod registry;
mod reporter;

pub use error::FetchError;
pub use http::{host_url, HttpBody, HttpClient};
pub use metricset::{HostContext, MetricSet};
pub use registry::{Factory, Registry};
pub use reporter::{CapturingReporter, FetchOutput};
