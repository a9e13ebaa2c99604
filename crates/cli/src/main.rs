// mbgolden - golden-file runner for metric sets

mod exit_codes;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use mbgolden_config::SuiteConfig;
use mbgolden_core::Event;
use mbgolden_fetch::Registry;
use mbgolden_harness::{CaseStage, Runner, SuiteReport, TestCase, UpdateMode, UPDATE_ENV};
use mbgolden_io::FixtureStore;
use mbgolden_recon::{compute_summary, match_events, MatchSummary};

use exit_codes::{
    stage_exit_code, EXIT_ERROR, EXIT_FIXTURE, EXIT_MISMATCH, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "mbgolden")]
#[command(about = "Golden-file tests for metric sets: serve a raw payload, fetch, compare events")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every case listed in a suite manifest
    #[command(after_help = "\
Examples:
  mbgolden run module/prometheus/_meta/suite.toml
  mbgolden run suite.toml --update-expected
  MBGOLDEN_UPDATE_EXPECTED=1 mbgolden run suite.toml --json")]
    Run {
        /// Suite manifest (TOML)
        suite: PathBuf,

        /// Overwrite expected fixtures with the fresh output before comparing
        #[arg(long)]
        update_expected: bool,

        /// Print the report as a single JSON document
        #[arg(long)]
        json: bool,

        /// Print nothing when every case passes
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Run one case given on the command line
    Check {
        #[arg(long)]
        module: String,

        #[arg(long)]
        metricset: String,

        /// Raw payload served to the metric set
        #[arg(long)]
        metrics_file: PathBuf,

        /// Expected events (JSON array); defaults to <metrics-file>.expected.json
        #[arg(long)]
        expected_file: Option<PathBuf>,

        /// Request path handed to the metric set
        #[arg(long)]
        metrics_path: Option<String>,

        #[arg(long)]
        update_expected: bool,

        #[arg(long)]
        json: bool,

        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Compare two event files as multisets, without fetching
    Compare {
        /// Events produced
        actual: PathBuf,

        /// Events expected
        expected: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// List the built-in metric sets
    ListMetricsets,
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Run { json, .. }
            | Commands::Check { json, .. }
            | Commands::Compare { json, .. } => *json,
            Commands::ListMetricsets => false,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MBGOLDEN_COMMIT"), ")",
        "\nexpected-file format: tab-indented JSON array of events",
        "\nupdate env var: MBGOLDEN_UPDATE_EXPECTED",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.command.json();

    let result = match cli.command {
        Commands::Run {
            suite,
            update_expected,
            json,
            quiet,
        } => cmd_run(suite, update_expected, json, quiet),
        Commands::Check {
            module,
            metricset,
            metrics_file,
            expected_file,
            metrics_path,
            update_expected,
            json,
            quiet,
        } => {
            let case = match expected_file {
                Some(expected_file) => TestCase::new(metrics_file, expected_file),
                None => TestCase::beside(metrics_file),
            };
            cmd_check(&module, &metricset, case, metrics_path, update_expected, json, quiet)
        }
        Commands::Compare {
            actual,
            expected,
            json,
        } => cmd_compare(actual, expected, json),
        Commands::ListMetricsets => cmd_list_metricsets(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(err) => {
            report_error(&err, json);
            ExitCode::from(err.code)
        }
    }
}

/// Errors that never produced a report. With --json they become the one
/// document on stdout: `{"error": {"code", "message", "hint"}}`.
fn report_error(err: &CliError, json: bool) {
    // An empty message means the report already said everything
    if err.message.is_empty() {
        return;
    }
    if json {
        #[derive(Serialize)]
        struct JsonError<'a> {
            error: &'a CliError,
        }
        if let Ok(text) = serde_json::to_string_pretty(&JsonError { error: err }) {
            println!("{}", text);
            return;
        }
    }
    eprintln!("error: {}", err.message);
    if let Some(hint) = &err.hint {
        eprintln!("hint:  {}", hint);
    }
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn fixture(msg: impl Into<String>) -> Self {
        Self::new(EXIT_FIXTURE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// The flag wins; otherwise the environment decides.
fn resolve_mode(update_expected: bool) -> UpdateMode {
    if update_expected {
        UpdateMode::Regenerate
    } else {
        UpdateMode::from_env()
    }
}

// ============================================================================
// run / check
// ============================================================================

fn cmd_run(suite: PathBuf, update_expected: bool, json: bool, quiet: bool) -> Result<(), CliError> {
    let config = SuiteConfig::load(&suite).map_err(|e| {
        CliError::usage(format!("{}: {}", suite.display(), e))
            .with_hint("a suite needs module, metricset and at least one [[cases]] entry")
    })?;

    let mode = resolve_mode(update_expected || config.update_expected);
    let cases: Vec<TestCase> = config.cases.into_iter().map(TestCase::from).collect();

    let registry = Registry::with_defaults();
    let report = Runner::new(&registry)
        .with_mode(mode)
        .with_metrics_path(config.metrics_path)
        .run(&config.module, &config.metricset, &cases);

    finish(report, json, quiet)
}

fn cmd_check(
    module: &str,
    metricset: &str,
    case: TestCase,
    metrics_path: Option<String>,
    update_expected: bool,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let registry = Registry::with_defaults();
    if !registry.contains(module, metricset) {
        return Err(CliError::usage(format!("unknown metricset '{}/{}'", module, metricset))
            .with_hint("run `mbgolden list-metricsets` to see what is available"));
    }

    let mut runner = Runner::new(&registry).with_mode(resolve_mode(update_expected));
    if let Some(path) = metrics_path {
        runner = runner.with_metrics_path(path);
    }
    let report = runner.run(module, metricset, &[case]);

    finish(report, json, quiet)
}

/// Print the report and turn failures into an exit code.
fn finish(report: SuiteReport, json: bool, quiet: bool) -> Result<(), CliError> {
    if json {
        print_json(&report)?;
    } else if !(quiet && report.passed) {
        print!("{}", report);
        io::stdout().flush().map_err(|e| CliError::io(e.to_string()))?;
    }

    let Some(stage) = report.worst_stage() else {
        return Ok(());
    };

    // With --json the report on stdout is the whole answer
    let message = if json {
        String::new()
    } else {
        format!("{} of {} case(s) failed", report.failed_count(), report.cases.len())
    };
    let err = CliError::new(stage_exit_code(stage), message);

    Err(match stage {
        CaseStage::Compare => err.with_hint(format!(
            "if the new output is correct, rerun with --update-expected (or {}=1)",
            UPDATE_ENV
        )),
        _ => err,
    })
}

// ============================================================================
// compare
// ============================================================================

#[derive(Serialize)]
struct CompareReport {
    passed: bool,
    summary: MatchSummary,
    unexpected: Vec<Event>,
    missing: Vec<Event>,
}

fn cmd_compare(actual: PathBuf, expected: PathBuf, json: bool) -> Result<(), CliError> {
    let store = FixtureStore::default();
    let actual_events = store
        .load_expected(&actual)
        .map_err(|e| CliError::fixture(e.to_string()))?;
    let expected_events = store
        .load_expected(&expected)
        .map_err(|e| CliError::fixture(e.to_string()))?;

    let output = match_events(&actual_events, &expected_events);
    let report = CompareReport {
        passed: output.is_clean(),
        summary: compute_summary(&output),
        unexpected: output.unexpected,
        missing: output.missing,
    };

    if json {
        print_json(&report)?;
    } else {
        print_compare(&report).map_err(|e| CliError::io(e.to_string()))?;
    }

    if report.passed {
        Ok(())
    } else if json {
        Err(CliError::new(EXIT_MISMATCH, ""))
    } else {
        Err(CliError::new(
            EXIT_MISMATCH,
            format!(
                "{} unexpected, {} missing",
                report.summary.unexpected, report.summary.missing
            ),
        ))
    }
}

fn print_compare(report: &CompareReport) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let s = &report.summary;
    writeln!(
        out,
        "actual {}, expected {}, matched {}, unexpected {}, missing {}",
        s.actual, s.expected, s.matched, s.unexpected, s.missing
    )?;
    for event in &report.unexpected {
        writeln!(out, "unexpected output produced:\n{}", event)?;
    }
    for event in &report.missing {
        writeln!(out, "expected output missing:\n{}", event)?;
    }
    out.flush()
}

// ============================================================================
// list-metricsets
// ============================================================================

fn cmd_list_metricsets() -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for name in Registry::with_defaults().names() {
        writeln!(handle, "{}", name).map_err(|e| CliError::io(e.to_string()))?;
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("cannot encode report: {}", e)))?;
    println!("{}", text);
    Ok(())
}
