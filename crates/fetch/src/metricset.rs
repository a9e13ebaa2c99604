use mbgolden_config::ModuleConfig;

use crate::reporter::CapturingReporter;

/// What a factory needs to build a metric set for one host.
#[derive(Debug, Clone, Copy)]
pub struct HostContext<'a> {
    pub config: &'a ModuleConfig,
    pub metricset: &'a str,
    pub host: &'a str,
}

/// One metric set bound to one host.
///
/// `fetch` runs exactly one collection cycle. Per-item problems go to
/// `reporter.error` and the cycle carries on; nothing is returned early.
pub trait MetricSet {
    fn fetch(&self, reporter: &mut CapturingReporter);
}
