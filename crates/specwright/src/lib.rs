//! # specwright: suites, specs and a reporter-driven test engine
//!
//! Tests are registered into a suite, selected by tags or name, run one at
//! a time inside a failure boundary, and reported as a stream of events.
//! Two suite styles are provided:
//!
//! - [`FunSuite`]: a flat list of named tests in registration order.
//! - [`Spec`]: nested `describe` scopes, shared behaviors and hooks, with
//!   example names like `"A Stack should pop the last pushed value"`.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use specwright::{Spec, Suite};
//!
//! fn main() {
//!     specwright::run(|| {
//!         let spec = Spec::build("StackSpec", |ctx| {
//!             ctx.describe("A Stack", |ctx| {
//!                 ctx.it("pop the last pushed value", || {
//!                     let mut stack = vec![1, 2];
//!                     assert_eq!(stack.pop(), Some(2));
//!                 });
//!                 ctx.it("talk to the database", || {}).tags(&["db"]);
//!             });
//!         })?;
//!         Ok(vec![Box::new(spec) as Box<dyn Suite>])
//!     });
//! }
//! ```
//!
//! ## Features
//!
//! - `macros` (default): the `spec!` and `spec_main!` macros
//! - `googletest`: re-exports `googletest` matchers via `specwright::matchers`

mod args;
mod console;
mod context;
mod error;
mod event;
mod fun_suite;
mod outcome;
pub mod property;
pub mod registry;
mod reporter;
pub mod runner;
mod spec;
mod stopper;
mod suite;
mod tags;
mod tree;

pub use args::{ConfigMap, Informer, TestArgs, TestBody};
pub use console::ConsoleReporter;
pub use context::{Context, ExampleHandle, HookKind};
pub use error::{Error, Result};
pub use event::{Event, EventBuilder, EventKind, RerunSpec};
pub use fun_suite::FunSuite;
pub use outcome::{pending, Outcome, TestFailure};
pub use reporter::{DispatchReporter, RecordingReporter, Reporter, RunSummary, SynchronizedReporter};
pub use runner::RunConfig;
pub use spec::Spec;
pub use stopper::{NeverStop, StopFlag, Stopper};
pub use suite::Suite;
pub use tags::{should_run, Decision, Filter, IGNORED_TAG};

#[cfg(feature = "macros")]
pub use specwright_macros::{spec, spec_main};

/// Re-export of the [`googletest`] crate. Available with the `googletest` feature.
#[cfg(feature = "googletest")]
pub use googletest;

/// Composable matchers re-exported from [`googletest::prelude`].
#[cfg(feature = "googletest")]
pub mod matchers {
    pub use googletest::prelude::*;
}

/// Entry point for a `harness = false` test binary.
///
/// Parses [`RunConfig`] from the process args, builds the suites, runs them
/// with a [`ConsoleReporter`] and exits non-zero if any test failed or the
/// suites could not be built.
pub fn run(build: impl FnOnce() -> Result<Vec<Box<dyn Suite>>>) {
    let config = RunConfig::from_args();

    let suites = match build() {
        Ok(suites) => suites,
        Err(err) => {
            eprintln!("specwright: could not build suites: {err}");
            std::process::exit(1);
        }
    };

    if config.list {
        if let Err(err) = runner::list_tests(&suites, &config, &mut std::io::stdout().lock()) {
            eprintln!("specwright: could not list tests: {err}");
            std::process::exit(1);
        }
        return;
    }

    let mut console = ConsoleReporter::new();
    let start = std::time::Instant::now();
    let result = runner::run_suites(&suites, &mut console, &config);
    console.print_summary(start.elapsed());

    match result {
        Ok(summary) if summary.all_passed() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("specwright: run aborted: {err}");
            std::process::exit(1);
        }
    }
}
