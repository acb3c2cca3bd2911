//! The reporter boundary and the reporters shipped with the crate.
//!
//! The engine pushes events into a [`Reporter`]; it never reads anything
//! back. Calls for one suite arrive sequentially, possibly from different
//! threads, so reporters must be `Send` but need not be `Sync`.

use crate::event::{Event, EventKind};
use std::sync::{Mutex, PoisonError};

/// Sink for test-lifecycle events.
pub trait Reporter: Send {
    fn test_starting(&mut self, event: &Event);
    fn test_succeeded(&mut self, event: &Event);
    fn test_failed(&mut self, event: &Event);
    fn test_ignored(&mut self, event: &Event);
    fn test_pending(&mut self, event: &Event);

    fn suite_starting(&mut self, _event: &Event) {}
    fn suite_completed(&mut self, _event: &Event) {}
    fn info_provided(&mut self, _event: &Event) {}

    /// Deliver `event` through the callback matching `kind`.
    fn dispatch(&mut self, kind: EventKind, event: &Event) {
        match kind {
            EventKind::TestStarting => self.test_starting(event),
            EventKind::TestSucceeded => self.test_succeeded(event),
            EventKind::TestFailed => self.test_failed(event),
            EventKind::TestIgnored => self.test_ignored(event),
            EventKind::TestPending => self.test_pending(event),
            EventKind::InfoProvided => self.info_provided(event),
            EventKind::SuiteStarting => self.suite_starting(event),
            EventKind::SuiteCompleted => self.suite_completed(event),
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn test_starting(&mut self, event: &Event) {
        (**self).test_starting(event);
    }
    fn test_succeeded(&mut self, event: &Event) {
        (**self).test_succeeded(event);
    }
    fn test_failed(&mut self, event: &Event) {
        (**self).test_failed(event);
    }
    fn test_ignored(&mut self, event: &Event) {
        (**self).test_ignored(event);
    }
    fn test_pending(&mut self, event: &Event) {
        (**self).test_pending(event);
    }
    fn suite_starting(&mut self, event: &Event) {
        (**self).suite_starting(event);
    }
    fn suite_completed(&mut self, event: &Event) {
        (**self).suite_completed(event);
    }
    fn info_provided(&mut self, event: &Event) {
        (**self).info_provided(event);
    }
}

// ============================================================================
// RecordingReporter
// ============================================================================

/// Keeps every event it receives, in arrival order.
///
/// Useful for adapters that translate events for another framework after a
/// run, and for asserting on event sequences in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Vec<(EventKind, Event)>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[(EventKind, Event)] {
        &self.events
    }

    /// Event kinds in arrival order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.iter().map(|(kind, _)| *kind).collect()
    }

    /// Names of all events of the given kind, in arrival order.
    pub fn names(&self, kind: EventKind) -> Vec<String> {
        self.events
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, e)| e.name().to_string())
            .collect()
    }

    /// Kinds of all test events about the named test.
    pub fn kinds_for(&self, name: &str) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|(k, e)| {
                e.name() == name
                    && !matches!(k, EventKind::SuiteStarting | EventKind::SuiteCompleted)
            })
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn first(&self, kind: EventKind, name: &str) -> Option<&Event> {
        self.events
            .iter()
            .find(|(k, e)| *k == kind && e.name() == name)
            .map(|(_, e)| e)
    }

    fn record(&mut self, kind: EventKind, event: &Event) {
        self.events.push((kind, event.clone()));
    }
}

impl Reporter for RecordingReporter {
    fn test_starting(&mut self, event: &Event) {
        self.record(EventKind::TestStarting, event);
    }
    fn test_succeeded(&mut self, event: &Event) {
        self.record(EventKind::TestSucceeded, event);
    }
    fn test_failed(&mut self, event: &Event) {
        self.record(EventKind::TestFailed, event);
    }
    fn test_ignored(&mut self, event: &Event) {
        self.record(EventKind::TestIgnored, event);
    }
    fn test_pending(&mut self, event: &Event) {
        self.record(EventKind::TestPending, event);
    }
    fn suite_starting(&mut self, event: &Event) {
        self.record(EventKind::SuiteStarting, event);
    }
    fn suite_completed(&mut self, event: &Event) {
        self.record(EventKind::SuiteCompleted, event);
    }
    fn info_provided(&mut self, event: &Event) {
        self.record(EventKind::InfoProvided, event);
    }
}

// ============================================================================
// DispatchReporter
// ============================================================================

/// Forwards every event to each wrapped reporter, in order.
#[derive(Default)]
pub struct DispatchReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl DispatchReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        DispatchReporter { reporters }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn into_inner(self) -> Vec<Box<dyn Reporter>> {
        self.reporters
    }
}

impl Reporter for DispatchReporter {
    fn test_starting(&mut self, event: &Event) {
        self.dispatch(EventKind::TestStarting, event);
    }
    fn test_succeeded(&mut self, event: &Event) {
        self.dispatch(EventKind::TestSucceeded, event);
    }
    fn test_failed(&mut self, event: &Event) {
        self.dispatch(EventKind::TestFailed, event);
    }
    fn test_ignored(&mut self, event: &Event) {
        self.dispatch(EventKind::TestIgnored, event);
    }
    fn test_pending(&mut self, event: &Event) {
        self.dispatch(EventKind::TestPending, event);
    }
    fn suite_starting(&mut self, event: &Event) {
        self.dispatch(EventKind::SuiteStarting, event);
    }
    fn suite_completed(&mut self, event: &Event) {
        self.dispatch(EventKind::SuiteCompleted, event);
    }
    fn info_provided(&mut self, event: &Event) {
        self.dispatch(EventKind::InfoProvided, event);
    }

    fn dispatch(&mut self, kind: EventKind, event: &Event) {
        for reporter in &mut self.reporters {
            reporter.dispatch(kind, event);
        }
    }
}

// ============================================================================
// SynchronizedReporter
// ============================================================================

/// Lets suites running on different worker threads share one reporter.
///
/// Each event is delivered while holding a lock, so the wrapped reporter
/// still sees strictly sequential calls.
pub struct SynchronizedReporter<R> {
    inner: Mutex<R>,
}

impl<R: Reporter> SynchronizedReporter<R> {
    pub fn new(inner: R) -> Self {
        SynchronizedReporter {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, kind: EventKind, event: &Event) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dispatch(kind, event);
    }
}

impl<R: Reporter> Reporter for &SynchronizedReporter<R> {
    fn test_starting(&mut self, event: &Event) {
        self.deliver(EventKind::TestStarting, event);
    }
    fn test_succeeded(&mut self, event: &Event) {
        self.deliver(EventKind::TestSucceeded, event);
    }
    fn test_failed(&mut self, event: &Event) {
        self.deliver(EventKind::TestFailed, event);
    }
    fn test_ignored(&mut self, event: &Event) {
        self.deliver(EventKind::TestIgnored, event);
    }
    fn test_pending(&mut self, event: &Event) {
        self.deliver(EventKind::TestPending, event);
    }
    fn suite_starting(&mut self, event: &Event) {
        self.deliver(EventKind::SuiteStarting, event);
    }
    fn suite_completed(&mut self, event: &Event) {
        self.deliver(EventKind::SuiteCompleted, event);
    }
    fn info_provided(&mut self, event: &Event) {
        self.deliver(EventKind::InfoProvided, event);
    }
}

// ============================================================================
// RunSummary
// ============================================================================

/// Totals over one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub ignored: usize,
    pub pending: usize,
    /// `"<test name>: <message>"` for each failure, in report order.
    pub failures: Vec<String>,
}

impl RunSummary {
    pub fn record(&mut self, kind: EventKind, event: &Event) {
        match kind {
            EventKind::TestSucceeded => self.succeeded += 1,
            EventKind::TestFailed => {
                self.failed += 1;
                self.failures
                    .push(format!("{}: {}", event.name(), event.message()));
            }
            EventKind::TestIgnored => self.ignored += 1,
            EventKind::TestPending => self.pending += 1,
            _ => {}
        }
    }

    pub fn total_run(&self) -> usize {
        self.succeeded + self.failed + self.pending
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
