//! The `Suite` trait and the per-test execution loop shared by every suite
//! style.

use crate::args::{ConfigMap, Informer, TestArgs, TestBody};
use crate::error::{Error, Result};
use crate::event::{Event, EventBuilder, RerunSpec};
use crate::outcome::{invoke, Outcome};
use crate::reporter::Reporter;
use crate::stopper::Stopper;
use crate::tags::{Decision, Filter};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;

/// A named collection of tests that can be run against a reporter.
///
/// Implementors supply test discovery and single-test execution; the
/// selection loop ([`run_tests`](Self::run_tests)) and the suite lifecycle
/// ([`run`](Self::run)) are provided.
pub trait Suite: Send + Sync {
    fn suite_name(&self) -> &str;

    /// Test names in execution order.
    fn test_names(&self) -> Vec<String>;

    /// Tags of every test that has any.
    fn tags(&self) -> BTreeMap<String, BTreeSet<String>>;

    /// Run exactly one test, regardless of its tags.
    ///
    /// Fails with [`Error::UnknownTestName`] if the suite has no such test.
    fn run_test(
        &self,
        name: &str,
        reporter: &mut dyn Reporter,
        stopper: &dyn Stopper,
        config: &ConfigMap,
    ) -> Result<()>;

    /// Suites run after this one's own tests.
    fn nested_suites(&self) -> &[Box<dyn Suite>] {
        &[]
    }

    /// Whether this suite or any suite nested in it defines `name`.
    fn contains_test(&self, name: &str) -> bool {
        self.test_names().iter().any(|n| n == name)
            || self
                .nested_suites()
                .iter()
                .any(|nested| nested.contains_test(name))
    }

    /// Number of tests a run with `filter` will execute, nested suites
    /// included. Ignored tests are not counted.
    fn expected_test_count(&self, filter: &Filter) -> usize {
        let tags = self.tags();
        let own = self
            .test_names()
            .iter()
            .filter(|name| filter.decide(name, tags.get(*name)) == Decision::Run)
            .count();
        own + self
            .nested_suites()
            .iter()
            .map(|nested| nested.expected_test_count(filter))
            .sum::<usize>()
    }

    /// Run `target` alone if given, otherwise every test selected by
    /// `filter`, oldest-registered first.
    ///
    /// The stopper is polled before each test; once it fires no further
    /// tests are started and no events are emitted for them.
    fn run_tests(
        &self,
        target: Option<&str>,
        reporter: &mut dyn Reporter,
        stopper: &dyn Stopper,
        filter: &Filter,
        config: &ConfigMap,
    ) -> Result<()> {
        if let Some(name) = target {
            return self.run_test(name, reporter, stopper, config);
        }

        let tags = self.tags();
        for name in self.test_names() {
            if stopper.stop_requested() {
                tracing::debug!(suite = self.suite_name(), "stopping before '{name}'");
                break;
            }
            match filter.decide(&name, tags.get(&name)) {
                Decision::Run => self.run_test(&name, reporter, stopper, config)?,
                Decision::Ignore => report_ignored(self.suite_name(), &name, reporter)?,
                Decision::Skip => {}
            }
        }
        Ok(())
    }

    /// Run this suite and then its nested suites, bracketed by
    /// `suite_starting` and `suite_completed`.
    ///
    /// With a `target` only the suites that define it, here or at any depth
    /// below, are entered; the test itself runs once in its owning suite.
    fn run(
        &self,
        target: Option<&str>,
        reporter: &mut dyn Reporter,
        stopper: &dyn Stopper,
        filter: &Filter,
        config: &ConfigMap,
    ) -> Result<()> {
        if let Some(name) = target {
            if !self.contains_test(name) {
                return Err(unknown_test(name));
            }
        }

        let name = self.suite_name();
        let start = Instant::now();
        tracing::debug!(suite = name, "suite starting");
        reporter.suite_starting(&suite_event(name).build()?);

        match target {
            Some(test) => {
                if self.test_names().iter().any(|n| n == test) {
                    self.run_test(test, reporter, stopper, config)?;
                }
                for nested in self.nested_suites() {
                    if nested.contains_test(test) {
                        nested.run(target, reporter, stopper, filter, config)?;
                    }
                }
            }
            None => {
                self.run_tests(None, reporter, stopper, filter, config)?;
                for nested in self.nested_suites() {
                    if stopper.stop_requested() {
                        break;
                    }
                    nested.run(None, reporter, stopper, filter, config)?;
                }
            }
        }

        reporter.suite_completed(&suite_event(name).duration(start.elapsed()).build()?);
        tracing::debug!(suite = name, elapsed = ?start.elapsed(), "suite completed");
        Ok(())
    }
}

impl fmt::Debug for dyn Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.suite_name())
            .finish_non_exhaustive()
    }
}

/// Run one test body inside the failure boundary, emitting `test_starting`
/// followed by exactly one terminal event.
pub(crate) fn execute_test(
    suite_name: &str,
    name: &str,
    body: &TestBody,
    reporter: &mut dyn Reporter,
    config: &ConfigMap,
) -> Result<Outcome> {
    let starting = test_event(suite_name, name, name).build()?;
    reporter.test_starting(&starting);

    let informer = Informer::new();
    let start = Instant::now();
    let outcome = invoke(|| {
        body.call(&TestArgs {
            config,
            informer: &informer,
        })
    });
    let elapsed = start.elapsed();

    match &outcome {
        Outcome::Succeeded => {
            reporter.test_succeeded(&test_event(suite_name, name, name).duration(elapsed).build()?);
        }
        Outcome::Failed(cause) => {
            let event = test_event(suite_name, name, cause.message())
                .cause(cause.clone())
                .rerun(RerunSpec::test(suite_name, name))
                .duration(elapsed)
                .build()?;
            reporter.test_failed(&event);
        }
        Outcome::Pending => {
            let event = test_event(suite_name, name, name)
                .rerun(RerunSpec::test(suite_name, name))
                .duration(elapsed)
                .build()?;
            reporter.test_pending(&event);
        }
    }

    for message in informer.take() {
        reporter.info_provided(&test_event(suite_name, name, message).build()?);
    }

    Ok(outcome)
}

pub(crate) fn report_ignored(
    suite_name: &str,
    name: &str,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    let event = test_event(suite_name, name, name)
        .rerun(RerunSpec::test(suite_name, name))
        .build()?;
    reporter.test_ignored(&event);
    Ok(())
}

pub(crate) fn unknown_test(name: &str) -> Error {
    Error::UnknownTestName(name.to_string())
}

fn test_event(suite_name: &str, name: &str, message: impl Into<String>) -> EventBuilder {
    Event::now(name, message).suite_name(suite_name)
}

fn suite_event(suite_name: &str) -> EventBuilder {
    Event::now(suite_name, suite_name)
        .suite_name(suite_name)
        .rerun(RerunSpec::suite(suite_name))
}
