//! The per-test failure boundary.
//!
//! Test bodies signal failure the way ordinary Rust tests do: by panicking
//! (usually through `assert!`). [`invoke`] catches the unwind and classifies
//! it, so one failing test can never abort the tests that follow it.

use std::any::Any;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The cause attached to a `test_failed` event.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TestFailure {
    message: String,
}

impl TestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        TestFailure {
            message: message.into(),
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        TestFailure::new(panic_message(payload))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a single test invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(Arc<TestFailure>),
    /// The body called [`pending`].
    Pending,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Marker payload used by [`pending`].
struct PendingSignal;

/// Mark the running test as pending and return from its body immediately.
///
/// The test is reported through `test_pending` rather than as a success or
/// a failure.
///
/// ```rust,no_run
/// # fn main() -> specwright::Result<()> {
/// let suite = specwright::FunSuite::new("Parser");
/// suite.test("handles unicode escapes", || {
///     specwright::pending();
/// })?;
/// # Ok(()) }
/// ```
pub fn pending() -> ! {
    // resume_unwind skips the panic hook, so nothing is printed.
    resume_unwind(Box::new(PendingSignal))
}

/// Run `body` inside the failure boundary.
pub(crate) fn invoke(body: impl FnOnce()) -> Outcome {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(()) => Outcome::Succeeded,
        Err(payload) if payload.is::<PendingSignal>() => Outcome::Pending,
        Err(payload) => Outcome::Failed(Arc::new(TestFailure::from_panic(payload.as_ref()))),
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(failure) = payload.downcast_ref::<TestFailure>() {
        failure.message().to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_completion_succeeds() {
        assert_eq!(invoke(|| {}), Outcome::Succeeded);
    }

    #[test]
    fn assertion_failure_carries_its_message() {
        let outcome = invoke(|| assert_eq!(1 + 1, 3, "arithmetic is broken"));
        match outcome {
            Outcome::Failed(cause) => assert!(cause.message().contains("arithmetic is broken")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn string_payloads_are_used_verbatim() {
        let outcome = invoke(|| panic!("{}", String::from("owned message")));
        assert_eq!(
            outcome,
            Outcome::Failed(Arc::new(TestFailure::new("owned message")))
        );
    }

    #[test]
    fn opaque_payloads_fall_back_to_a_generic_message() {
        let outcome = invoke(|| std::panic::panic_any(42_u8));
        assert_eq!(
            outcome,
            Outcome::Failed(Arc::new(TestFailure::new("unknown panic")))
        );
    }

    #[test]
    fn pending_is_not_a_failure() {
        let outcome = invoke(|| pending());
        assert_eq!(outcome, Outcome::Pending);
        assert!(!outcome.is_failure());
    }
}
