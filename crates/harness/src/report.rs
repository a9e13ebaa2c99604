//! Per-case outcomes and the suite report built from them.
//!
//! Failures are always itemized: fetch errors one per line, mismatched
//! events printed in full. The JSON shape (`--json`) is:
//!
//! ```json
//! {
//!   "module": "prometheus",
//!   "metricset": "collector",
//!   "mode": "compare",
//!   "passed": false,
//!   "cases": [
//!     {
//!       "metrics_file": "...",
//!       "expected_file": "...",
//!       "passed": false,
//!       "regenerated": false,
//!       "summary": { "actual": 2, "expected": 2, "matched": 1, "unexpected": 1, "missing": 1 },
//!       "failure": { "stage": "compare", "errors": [], "unexpected": [...], "missing": [...] }
//!     }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use mbgolden_core::Event;
use mbgolden_fetch::FetchError;
use mbgolden_io::FixtureError;
use mbgolden_recon::MatchSummary;

use crate::case::{TestCase, UpdateMode};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Where a case is in its run. Stages execute in declaration order;
/// `Regenerate` only in [`UpdateMode::Regenerate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStage {
    LoadRaw,
    Serve,
    Fetch,
    Regenerate,
    LoadExpected,
    Compare,
}

impl CaseStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStage::LoadRaw => "load_raw",
            CaseStage::Serve => "serve",
            CaseStage::Fetch => "fetch",
            CaseStage::Regenerate => "regenerate",
            CaseStage::LoadExpected => "load_expected",
            CaseStage::Compare => "compare",
        }
    }
}

impl fmt::Display for CaseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Why a case failed. Every variant ends the case at its stage.
#[derive(Debug)]
pub enum CaseFailure {
    LoadRaw(FixtureError),
    /// The stub endpoint could not be started.
    Serve(String),
    /// The collection cycle reported errors; nothing was compared.
    Fetch(Vec<FetchError>),
    Regenerate(FixtureError),
    LoadExpected(FixtureError),
    Mismatch {
        /// Produced but not expected, in output order.
        unexpected: Vec<Event>,
        /// Expected but not produced, in fixture order.
        missing: Vec<Event>,
    },
}

impl CaseFailure {
    pub fn stage(&self) -> CaseStage {
        match self {
            CaseFailure::LoadRaw(_) => CaseStage::LoadRaw,
            CaseFailure::Serve(_) => CaseStage::Serve,
            CaseFailure::Fetch(_) => CaseStage::Fetch,
            CaseFailure::Regenerate(_) => CaseStage::Regenerate,
            CaseFailure::LoadExpected(_) => CaseStage::LoadExpected,
            CaseFailure::Mismatch { .. } => CaseStage::Compare,
        }
    }

    /// One message per underlying error. Empty for mismatches, which carry
    /// events instead.
    pub fn messages(&self) -> Vec<String> {
        match self {
            CaseFailure::LoadRaw(e) | CaseFailure::Regenerate(e) | CaseFailure::LoadExpected(e) => {
                vec![e.to_string()]
            }
            CaseFailure::Serve(msg) => vec![msg.clone()],
            CaseFailure::Fetch(errors) => errors.iter().map(ToString::to_string).collect(),
            CaseFailure::Mismatch { .. } => Vec::new(),
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, CaseFailure::Mismatch { .. })
    }
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseFailure::LoadRaw(e) => write!(f, "cannot load raw metrics: {}", e),
            CaseFailure::Serve(msg) => write!(f, "cannot start stub endpoint: {}", msg),
            CaseFailure::Fetch(errors) => {
                write!(f, "fetch reported {} error(s):", errors.len())?;
                for e in errors {
                    write!(f, "\n  - {}", e)?;
                }
                Ok(())
            }
            CaseFailure::Regenerate(e) => write!(f, "cannot update expected events: {}", e),
            CaseFailure::LoadExpected(e) => write!(f, "cannot load expected events: {}", e),
            CaseFailure::Mismatch { unexpected, missing } => {
                write!(
                    f,
                    "events differ: {} unexpected, {} missing",
                    unexpected.len(),
                    missing.len()
                )?;
                for event in unexpected {
                    write!(f, "\nunexpected output produced:\n{}", event)?;
                }
                for event in missing {
                    write!(f, "\nexpected output missing:\n{}", event)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CaseFailure {}

#[derive(Serialize)]
struct FailureRepr<'a> {
    stage: CaseStage,
    errors: Vec<String>,
    unexpected: &'a [Event],
    missing: &'a [Event],
}

impl Serialize for CaseFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (unexpected, missing): (&[Event], &[Event]) = match self {
            CaseFailure::Mismatch { unexpected, missing } => {
                (unexpected.as_slice(), missing.as_slice())
            }
            _ => (&[][..], &[][..]),
        };
        FailureRepr {
            stage: self.stage(),
            errors: self.messages(),
            unexpected,
            missing,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Case report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub metrics_file: PathBuf,
    pub expected_file: PathBuf,
    pub passed: bool,
    /// The expected fixture was rewritten during this case.
    pub regenerated: bool,
    /// Present once the comparison ran.
    pub summary: Option<MatchSummary>,
    pub failure: Option<CaseFailure>,
}

impl CaseReport {
    pub(crate) fn new(case: &TestCase) -> Self {
        Self {
            metrics_file: case.metrics_file.clone(),
            expected_file: case.expected_file.clone(),
            passed: false,
            regenerated: false,
            summary: None,
            failure: None,
        }
    }

    pub(crate) fn fail(mut self, failure: CaseFailure) -> Self {
        self.passed = false;
        self.failure = Some(failure);
        self
    }

    pub(crate) fn pass(mut self) -> Self {
        self.passed = true;
        self.failure = None;
        self
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "ok" } else { "FAILED" };
        write!(f, "{} ... {}", self.metrics_file.display(), status)?;
        if self.regenerated {
            write!(f, " (updated {})", self.expected_file.display())?;
        }
        if let Some(failure) = &self.failure {
            write!(f, "\n[{}] {}", failure.stage(), failure)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Suite report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub module: String,
    pub metricset: String,
    pub mode: UpdateMode,
    pub passed: bool,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub(crate) fn new(module: &str, metricset: &str, mode: UpdateMode, cases: Vec<CaseReport>) -> Self {
        let passed = cases.iter().all(|c| c.passed);
        Self {
            module: module.to_string(),
            metricset: metricset.to_string(),
            mode,
            passed,
            cases,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Most severe failure stage across cases. Fixture faults rank above
    /// fetch faults, which rank above mismatches.
    pub fn worst_stage(&self) -> Option<CaseStage> {
        self.failures()
            .filter_map(|c| c.failure.as_ref().map(CaseFailure::stage))
            .min_by_key(|stage| match stage {
                CaseStage::LoadRaw | CaseStage::LoadExpected | CaseStage::Regenerate => 0,
                CaseStage::Serve | CaseStage::Fetch => 1,
                CaseStage::Compare => 2,
            })
    }

    /// Panic with the itemized report unless every case passed.
    pub fn assert_passed(&self) {
        if !self.passed {
            panic!("{}", self);
        }
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}/{}: {} case(s), {} failed{}",
            self.module,
            self.metricset,
            self.cases.len(),
            self.failed_count(),
            if self.mode.is_regenerate() { " (updating expected files)" } else { "" }
        )?;
        for case in &self.cases {
            writeln!(f, "{}", case)?;
        }
        Ok(())
    }
}
