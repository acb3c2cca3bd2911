//! Report events: one immutable value per test-lifecycle occurrence.

use crate::error::{Error, Result};
use crate::outcome::TestFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Enough information for an external runner to re-invoke a single test.
///
/// The engine only builds and attaches these; it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunSpec {
    pub suite: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
}

impl RerunSpec {
    pub fn test(suite: impl Into<String>, test_name: impl Into<String>) -> Self {
        RerunSpec {
            suite: suite.into(),
            test_name: Some(test_name.into()),
        }
    }

    pub fn suite(suite: impl Into<String>) -> Self {
        RerunSpec {
            suite: suite.into(),
            test_name: None,
        }
    }
}

/// The reporter callback an event was delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TestStarting,
    TestSucceeded,
    TestFailed,
    TestIgnored,
    TestPending,
    InfoProvided,
    SuiteStarting,
    SuiteCompleted,
}

impl EventKind {
    /// Whether this kind ends a test (exactly one per executed test).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventKind::TestSucceeded | EventKind::TestFailed | EventKind::TestPending
        )
    }
}

/// A single lifecycle occurrence.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    message: String,
    suite_name: Option<String>,
    cause: Option<Arc<TestFailure>>,
    rerun: Option<RerunSpec>,
    thread_name: String,
    timestamp: DateTime<Utc>,
    duration: Option<Duration>,
}

impl Event {
    pub fn builder() -> EventBuilder {
        EventBuilder::default()
    }

    /// Builder pre-filled with the calling thread's name and the current time.
    pub fn now(name: impl Into<String>, message: impl Into<String>) -> EventBuilder {
        Event::builder()
            .name(name)
            .message(message)
            .thread_name(current_thread_name())
            .timestamp(Utc::now())
    }

    /// Name of the test or suite this event is about.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suite_name(&self) -> Option<&str> {
        self.suite_name.as_deref()
    }

    pub fn cause(&self) -> Option<&TestFailure> {
        self.cause.as_deref()
    }

    pub fn rerun(&self) -> Option<&RerunSpec> {
        self.rerun.as_ref()
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

/// Builder for [`Event`]. `name`, `message`, `thread_name` and `timestamp`
/// are required; [`build`](Self::build) rejects an event missing any of them.
#[derive(Debug, Default)]
pub struct EventBuilder {
    name: Option<String>,
    message: Option<String>,
    suite_name: Option<String>,
    cause: Option<Arc<TestFailure>>,
    rerun: Option<RerunSpec>,
    thread_name: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    duration: Option<Duration>,
}

impl EventBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn suite_name(mut self, suite_name: impl Into<String>) -> Self {
        self.suite_name = Some(suite_name.into());
        self
    }

    pub fn cause(mut self, cause: Arc<TestFailure>) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn rerun(mut self, rerun: RerunSpec) -> Self {
        self.rerun = Some(rerun);
        self
    }

    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn build(self) -> Result<Event> {
        Ok(Event {
            name: self.name.ok_or(Error::MissingEventField("name"))?,
            message: self.message.ok_or(Error::MissingEventField("message"))?,
            suite_name: self.suite_name,
            cause: self.cause,
            rerun: self.rerun,
            thread_name: self
                .thread_name
                .ok_or(Error::MissingEventField("thread_name"))?,
            timestamp: self.timestamp.ok_or(Error::MissingEventField("timestamp"))?,
            duration: self.duration,
        })
    }
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_fills_thread_and_timestamp() {
        let before = Utc::now();
        let event = Event::now("adds", "adds").build().unwrap();
        assert_eq!(event.name(), "adds");
        assert!(!event.thread_name().is_empty());
        assert!(event.timestamp() >= before);
        assert!(event.cause().is_none());
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let err = Event::builder()
            .message("m")
            .thread_name("main")
            .timestamp(Utc::now())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingEventField("name")));

        let err = Event::builder()
            .name("n")
            .message("m")
            .thread_name("main")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingEventField("timestamp")));
    }

    #[test]
    fn rerun_spec_serializes_without_absent_test_name() {
        let json = serde_json::to_string(&RerunSpec::suite("StackSpec")).unwrap();
        assert_eq!(json, r#"{"suite":"StackSpec"}"#);

        let spec: RerunSpec =
            serde_json::from_str(r#"{"suite":"StackSpec","test_name":"pops"}"#).unwrap();
        assert_eq!(spec, RerunSpec::test("StackSpec", "pops"));
    }

    #[test]
    fn terminal_kinds() {
        assert!(EventKind::TestFailed.is_terminal());
        assert!(EventKind::TestPending.is_terminal());
        assert!(!EventKind::TestStarting.is_terminal());
        assert!(!EventKind::TestIgnored.is_terminal());
    }
}
