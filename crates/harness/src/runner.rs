//! Per-case orchestration.
//!
//! Each case walks `load_raw → serve → fetch → (regenerate) → load_expected →
//! compare → report`. A failure ends the case at its stage; the stub endpoint
//! is stopped before the next case starts, whatever the outcome. Cases never
//! affect each other.

use mbgolden_config::ModuleConfig;
use mbgolden_fetch::Registry;
use mbgolden_io::FixtureStore;
use mbgolden_recon::{compute_summary, match_events};

use crate::case::{TestCase, UpdateMode};
use crate::report::{CaseFailure, CaseReport, SuiteReport};
use crate::stub::StubEndpoint;

/// Runs golden cases for one metric set.
#[derive(Debug)]
pub struct Runner<'r> {
    registry: &'r Registry,
    store: FixtureStore,
    mode: UpdateMode,
    metrics_path: Option<String>,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            store: FixtureStore::default(),
            mode: UpdateMode::Compare,
            metrics_path: None,
        }
    }

    pub fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolve relative fixture paths through `store`.
    pub fn with_store(mut self, store: FixtureStore) -> Self {
        self.store = store;
        self
    }

    /// Request path handed to the metric set. The stub answers any path.
    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Run every case in order.
    pub fn run(&self, module: &str, metricset: &str, cases: &[TestCase]) -> SuiteReport {
        let reports = cases
            .iter()
            .map(|case| self.run_case(module, metricset, case))
            .collect();
        SuiteReport::new(module, metricset, self.mode, reports)
    }

    /// Run a single case to completion.
    pub fn run_case(&self, module: &str, metricset: &str, case: &TestCase) -> CaseReport {
        log::info!(
            "Running {}/{} on {}",
            module,
            metricset,
            case.metrics_file.display()
        );

        let report = self.execute(module, metricset, case, CaseReport::new(case));
        if let Some(failure) = &report.failure {
            log::warn!(
                "Case {} failed at {}: {}",
                case.metrics_file.display(),
                failure.stage(),
                failure
            );
        }
        report
    }

    fn execute(
        &self,
        module: &str,
        metricset: &str,
        case: &TestCase,
        mut report: CaseReport,
    ) -> CaseReport {
        let raw = match self.store.load_raw(&case.metrics_file) {
            Ok(raw) => raw,
            Err(e) => return report.fail(CaseFailure::LoadRaw(e)),
        };

        // The stub lives exactly as long as the fetch; stopping it here
        // releases the port on every path out of this block.
        let output = {
            let mut stub = match StubEndpoint::start(raw) {
                Ok(stub) => stub,
                Err(e) => return report.fail(CaseFailure::Serve(e.to_string())),
            };
            let config = self.module_config(module, metricset, &stub.url());
            let output = self.registry.fetch(config);
            stub.stop();
            output
        };

        if !output.is_ok() {
            return report.fail(CaseFailure::Fetch(output.errors));
        }
        let actual = output.events;

        if self.mode.is_regenerate() {
            if let Err(e) = self.store.save_expected(&case.expected_file, &actual) {
                return report.fail(CaseFailure::Regenerate(e));
            }
            report.regenerated = true;
        }

        let expected = match self.store.load_expected(&case.expected_file) {
            Ok(expected) => expected,
            Err(e) => return report.fail(CaseFailure::LoadExpected(e)),
        };

        let matched = match_events(&actual, &expected);
        report.summary = Some(compute_summary(&matched));
        if !matched.is_clean() {
            return report.fail(CaseFailure::Mismatch {
                unexpected: matched.unexpected,
                missing: matched.missing,
            });
        }

        report.pass()
    }

    fn module_config(&self, module: &str, metricset: &str, host: &str) -> ModuleConfig {
        let config = ModuleConfig::single(module, metricset, host);
        match &self.metrics_path {
            Some(path) => config.with_metrics_path(path.clone()),
            None => config,
        }
    }
}

/// Run `cases` against `module/metricset` as resolved by `registry`.
pub fn run_cases(
    registry: &Registry,
    module: &str,
    metricset: &str,
    cases: &[TestCase],
    mode: UpdateMode,
) -> SuiteReport {
    Runner::new(registry).with_mode(mode).run(module, metricset, cases)
}

/// Test-runner entry point: built-in metric sets, mode from
/// `MBGOLDEN_UPDATE_EXPECTED`, panics with the itemized report on failure.
///
/// ```no_run
/// use mbgolden_harness::{test_metric_set, TestCase};
///
/// test_metric_set("prometheus", "collector", &[TestCase::beside("_meta/test/node_exporter.txt")]);
/// ```
pub fn test_metric_set(module: &str, metricset: &str, cases: &[TestCase]) {
    let registry = Registry::with_defaults();
    run_cases(&registry, module, metricset, cases, UpdateMode::from_env()).assert_passed();
}
