//! `mbgolden-harness`: golden-file tests for metric sets.
//!
//! For every [`TestCase`] the harness serves the raw payload from a local
//! [`StubEndpoint`], runs one collection cycle of the metric set against it,
//! and compares the produced events with the expected fixture as multisets.
//! In [`UpdateMode::Regenerate`] the expected fixture is rewritten from the
//! fresh output first, then compared like any other run.

mod case;
mod report;
mod runner;
mod stub;

pub use case::{TestCase, UpdateMode, UPDATE_ENV};
pub use report::{CaseFailure, CaseReport, CaseStage, SuiteReport};
pub use runner::{run_cases, test_metric_set, Runner};
pub use stub::{StubEndpoint, CONTENT_TYPE};
