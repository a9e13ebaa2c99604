use std::collections::BTreeMap;

use mbgolden_config::ModuleConfig;

use crate::error::FetchError;
use crate::metricset::{HostContext, MetricSet};
use crate::prometheus;
use crate::reporter::{CapturingReporter, FetchOutput};

/// Builds a metric set for one host.
pub type Factory =
    Box<dyn Fn(&HostContext<'_>) -> Result<Box<dyn MetricSet>, FetchError> + Send + Sync>;

/// `(module, metricset)` → factory.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<(String, String), Factory>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in metric sets.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            prometheus::MODULE,
            prometheus::collector::METRICSET,
            prometheus::collector::factory,
        );
        registry
    }

    /// Register (or replace) a factory.
    pub fn register<F>(&mut self, module: &str, metricset: &str, factory: F)
    where
        F: Fn(&HostContext<'_>) -> Result<Box<dyn MetricSet>, FetchError> + Send + Sync + 'static,
    {
        self.factories
            .insert((module.to_string(), metricset.to_string()), Box::new(factory));
    }

    pub fn contains(&self, module: &str, metricset: &str) -> bool {
        self.factories
            .contains_key(&(module.to_string(), metricset.to_string()))
    }

    /// Registered names as `module/metricset`, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories
            .keys()
            .map(|(module, metricset)| format!("{module}/{metricset}"))
            .collect()
    }

    /// Run one collection cycle for every metricset × host in `config`.
    ///
    /// Errors never abort the cycle: a host whose metric set cannot be built
    /// is reported and the remaining hosts still run.
    pub fn fetch(&self, config: ModuleConfig) -> FetchOutput {
        let mut reporter = CapturingReporter::new();

        if let Err(e) = config.validate() {
            reporter.error(FetchError::Config(e.to_string()));
            return reporter.into_output();
        }

        for metricset in &config.metricsets {
            let key = (config.module.clone(), metricset.clone());
            let Some(factory) = self.factories.get(&key) else {
                reporter.error(FetchError::UnknownMetricSet {
                    module: config.module.clone(),
                    metricset: metricset.clone(),
                });
                continue;
            };

            for host in &config.hosts {
                let ctx = HostContext {
                    config: &config,
                    metricset,
                    host,
                };
                match factory(&ctx) {
                    Ok(ms) => {
                        log::debug!("Fetching {}/{} from {}", config.module, metricset, host);
                        ms.fetch(&mut reporter);
                    }
                    Err(e) => reporter.error(e),
                }
            }
        }

        reporter.into_output()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("metricsets", &self.names()).finish()
    }
}
