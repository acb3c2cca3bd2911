//! Command-line run configuration and the multi-suite driver.
//!
//! Used with `harness = false` test targets:
//!
//! ```text
//! cargo test --test stack_spec -- "full stack" --exclude slow -j 4
//! ```

use crate::args::ConfigMap;
use crate::error::{Error, Result};
use crate::event::{Event, EventKind};
use crate::reporter::{Reporter, RunSummary, SynchronizedReporter};
use crate::stopper::{StopFlag, Stopper};
use crate::suite::Suite;
use crate::tags::{Decision, Filter};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Configuration parsed from command-line args.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "specwright", about = "Run specwright suites", version)]
pub struct RunConfig {
    /// Only run tests whose full name contains this text (case-insensitive).
    pub filter: Option<String>,

    /// Run exactly this test, by full name, ignoring tag filters.
    #[arg(short = 't', long = "test-name", value_name = "NAME")]
    pub test_name: Option<String>,

    /// Only run tests carrying at least one of these tags.
    #[arg(long = "include", value_name = "TAG", env = "SPECWRIGHT_INCLUDE", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Never run tests carrying any of these tags.
    #[arg(long = "exclude", value_name = "TAG", env = "SPECWRIGHT_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Run tests tagged `ignored` instead of reporting them as ignored.
    #[arg(long = "include-ignored", alias = "ignored")]
    pub include_ignored: bool,

    /// List the selected tests without running them.
    #[arg(long)]
    pub list: bool,

    /// Stop scheduling tests after the first failure.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Number of suites run concurrently.
    #[arg(short = 'j', long = "jobs", default_value_t = 1, env = "SPECWRIGHT_JOBS")]
    pub jobs: usize,

    /// Entry for the config map handed to tests.
    #[arg(short = 'D', long = "config", value_name = "KEY=VALUE", value_parser = parse_config_entry)]
    pub config: Vec<(String, String)>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            filter: None,
            test_name: None,
            include: Vec::new(),
            exclude: Vec::new(),
            include_ignored: false,
            list: false,
            fail_fast: false,
            jobs: 1,
            config: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse from the process args (compatible with `cargo test -- <args>`).
    pub fn from_args() -> Self {
        Self::from_args_lenient(std::env::args())
    }

    /// Parse `args`, dropping the libtest flags cargo passes to every test
    /// binary and any other flag this runner does not know.
    ///
    /// Malformed values for known flags, `--help` and `--version` still end
    /// the process the way clap does.
    pub fn from_args_lenient<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = strip_harness_flags(args);
        loop {
            match Self::try_parse_from(args.iter()) {
                Ok(config) => return config,
                Err(err) if err.kind() == ErrorKind::UnknownArgument => {
                    let Some(pos) = unknown_position(&err, &args) else {
                        tracing::warn!(%err, "could not locate unknown argument, using defaults");
                        return Self::default();
                    };
                    tracing::debug!(arg = %args[pos], "ignoring unknown argument");
                    args.remove(pos);
                }
                Err(err) => err.exit(),
            }
        }
    }

    /// Tag and name selection for this run.
    pub fn filter(&self) -> Filter {
        let mut filter = Filter::new(self.include.iter().cloned(), self.exclude.iter().cloned());
        if !self.include_ignored {
            filter = filter.excluding_ignored();
        }
        if let Some(needle) = &self.filter {
            filter = filter.with_name_filter(needle.clone());
        }
        filter
    }

    pub fn config_map(&self) -> ConfigMap {
        self.config.iter().cloned().collect()
    }
}

fn parse_config_entry(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Libtest flags that take their value as the next argument.
const HARNESS_VALUE_FLAGS: &[&str] = &[
    "--test-threads",
    "--color",
    "--format",
    "--logfile",
    "--skip",
    "--shuffle-seed",
    "-Z",
];

fn is_harness_flag(arg: &str) -> bool {
    const FLAGS: &[&str] = &[
        "--nocapture",
        "--no-capture",
        "--show-output",
        "--quiet",
        "-q",
        "--exact",
        "--test",
        "--bench",
        "--report-time",
        "--ensure-time",
        "--shuffle",
        "--force-run-in-process",
    ];
    FLAGS.contains(&arg)
        || arg.starts_with("-Z")
        || HARNESS_VALUE_FLAGS.iter().any(|flag| {
            arg.strip_prefix(flag)
                .is_some_and(|rest| rest.starts_with('='))
        })
}

fn strip_harness_flags(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut kept = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if HARNESS_VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
        } else if !is_harness_flag(&arg) {
            kept.push(arg);
        }
    }
    kept
}

/// Index of the argument clap rejected as unknown. The program name at
/// index zero is never a candidate.
fn unknown_position(err: &clap::Error, args: &[String]) -> Option<usize> {
    let Some(ContextValue::String(invalid)) = err.get(ContextKind::InvalidArg) else {
        return None;
    };
    args.iter()
        .skip(1)
        .position(|arg| {
            arg == invalid
                || arg
                    .strip_prefix(invalid.as_str())
                    .is_some_and(|rest| rest.starts_with('='))
        })
        .map(|pos| pos + 1)
}

// ============================================================================
// Driver
// ============================================================================

/// Forwards to the caller's reporter while keeping totals, and trips the
/// stop flag on the first failure when asked to.
struct Tally<'r> {
    inner: &'r mut dyn Reporter,
    summary: RunSummary,
    stop_on_failure: Option<StopFlag>,
}

impl Tally<'_> {
    fn forward(&mut self, kind: EventKind, event: &Event) {
        self.summary.record(kind, event);
        if kind == EventKind::TestFailed {
            if let Some(flag) = &self.stop_on_failure {
                flag.request_stop();
            }
        }
        self.inner.dispatch(kind, event);
    }
}

impl Reporter for Tally<'_> {
    fn test_starting(&mut self, event: &Event) {
        self.forward(EventKind::TestStarting, event);
    }
    fn test_succeeded(&mut self, event: &Event) {
        self.forward(EventKind::TestSucceeded, event);
    }
    fn test_failed(&mut self, event: &Event) {
        self.forward(EventKind::TestFailed, event);
    }
    fn test_ignored(&mut self, event: &Event) {
        self.forward(EventKind::TestIgnored, event);
    }
    fn test_pending(&mut self, event: &Event) {
        self.forward(EventKind::TestPending, event);
    }
    fn suite_starting(&mut self, event: &Event) {
        self.forward(EventKind::SuiteStarting, event);
    }
    fn suite_completed(&mut self, event: &Event) {
        self.forward(EventKind::SuiteCompleted, event);
    }
    fn info_provided(&mut self, event: &Event) {
        self.forward(EventKind::InfoProvided, event);
    }
}

/// Run `suites` against `reporter` as `config` selects, returning the
/// totals.
///
/// With `--test-name` only the suites defining that test, directly or in a
/// nested suite, are run, and the run fails with
/// [`Error::UnknownTestName`] if none does. With `jobs > 1`
/// suites are handed to a pool of scoped worker threads; events from one
/// suite still arrive in order.
pub fn run_suites(
    suites: &[Box<dyn Suite>],
    reporter: &mut dyn Reporter,
    config: &RunConfig,
) -> Result<RunSummary> {
    let filter = config.filter();
    let config_map = config.config_map();
    let stopper = StopFlag::new();
    let target = config.test_name.as_deref();

    let selected: Vec<&dyn Suite> = match target {
        Some(name) => {
            let owners: Vec<&dyn Suite> = suites
                .iter()
                .map(|suite| suite.as_ref())
                .filter(|suite| suite.contains_test(name))
                .collect();
            if owners.is_empty() {
                return Err(Error::UnknownTestName(name.to_string()));
            }
            owners
        }
        None => suites.iter().map(|suite| suite.as_ref()).collect(),
    };

    let expected: usize = selected
        .iter()
        .map(|suite| suite.expected_test_count(&filter))
        .sum();
    tracing::debug!(suites = selected.len(), expected, jobs = config.jobs, "run starting");

    let mut tally = Tally {
        inner: reporter,
        summary: RunSummary::default(),
        stop_on_failure: config.fail_fast.then(|| stopper.clone()),
    };

    if config.jobs <= 1 || selected.len() <= 1 {
        for suite in &selected {
            if stopper.stop_requested() {
                break;
            }
            suite.run(target, &mut tally, &stopper, &filter, &config_map)?;
        }
    } else {
        let shared = SynchronizedReporter::new(tally);
        let next = AtomicUsize::new(0);
        let errors = Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for _ in 0..config.jobs.min(selected.len()) {
                scope.spawn(|| {
                    let mut handle = &shared;
                    while let Some(suite) = selected.get(next.fetch_add(1, Ordering::SeqCst)) {
                        if stopper.stop_requested() {
                            break;
                        }
                        if let Err(err) = suite.run(target, &mut handle, &stopper, &filter, &config_map) {
                            tracing::warn!(suite = suite.suite_name(), %err, "suite aborted");
                            stopper.request_stop();
                            errors
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(err);
                        }
                    }
                });
            }
        });
        tally = shared.into_inner();
        let errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }
    }

    tracing::debug!(run = tally.summary.total_run(), failed = tally.summary.failed, "run finished");
    Ok(tally.summary)
}

/// Write the full name of every test `config` selects, one per line.
/// Ignored tests are marked.
pub fn list_tests(
    suites: &[Box<dyn Suite>],
    config: &RunConfig,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let filter = config.filter();
    for suite in suites {
        list_suite(suite.as_ref(), config, &filter, out)?;
    }
    Ok(())
}

fn list_suite(
    suite: &dyn Suite,
    config: &RunConfig,
    filter: &Filter,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    let tags = suite.tags();
    for name in suite.test_names() {
        if let Some(target) = &config.test_name {
            if &name != target {
                continue;
            }
        }
        match filter.decide(&name, tags.get(&name)) {
            Decision::Run => writeln!(out, "{name}")?,
            Decision::Ignore => writeln!(out, "{name} (ignored)")?,
            Decision::Skip => {}
        }
    }
    for nested in suite.nested_suites() {
        list_suite(nested.as_ref(), config, filter, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> RunConfig {
        RunConfig::from_args_lenient(
            std::iter::once("specwright")
                .chain(args.iter().copied())
                .map(String::from),
        )
    }

    #[test]
    fn parses_selection_flags() {
        let config = parse(&["stack", "--include", "fast,db", "--exclude", "slow", "-j", "4"]);
        assert_eq!(config.filter.as_deref(), Some("stack"));
        assert_eq!(config.include, vec!["fast", "db"]);
        assert_eq!(config.exclude, vec!["slow"]);
        assert_eq!(config.jobs, 4);
        assert!(!config.include_ignored);
    }

    #[test]
    fn tolerates_libtest_flags() {
        let config = parse(&["--nocapture", "--test-threads=1", "--ignored", "-q"]);
        assert!(config.include_ignored);
        assert_eq!(config.filter, None);
    }

    #[test]
    fn libtest_flags_with_separate_values_are_dropped() {
        let config = parse(&[
            "--test-threads",
            "1",
            "--skip",
            "slow_case",
            "--format",
            "pretty",
            "--color",
            "always",
            "stack",
        ]);
        assert_eq!(config.filter.as_deref(), Some("stack"));
        assert_eq!(config, RunConfig { filter: Some("stack".into()), ..RunConfig::default() });
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let config = parse(&["--frobnicate", "--exclude", "slow", "-x"]);
        assert_eq!(config.exclude, vec!["slow"]);
        assert_eq!(config.filter, None);
    }

    #[test]
    fn config_entries_become_a_map() {
        let config = parse(&["-D", "db=postgres", "--config", "retries=3"]);
        let map = config.config_map();
        assert_eq!(map.get("db").map(String::as_str), Some("postgres"));
        assert_eq!(map.get("retries").map(String::as_str), Some("3"));
        assert!(RunConfig::try_parse_from(["specwright", "-D", "novalue"]).is_err());
    }

    #[test]
    fn default_filter_reports_ignored_tests() {
        let config = RunConfig::default();
        let ignored = ["ignored".to_string()].into_iter().collect();
        assert_eq!(config.filter().decide("x", Some(&ignored)), Decision::Ignore);

        let config = RunConfig {
            include_ignored: true,
            ..RunConfig::default()
        };
        assert_eq!(config.filter().decide("x", Some(&ignored)), Decision::Run);
    }
}
