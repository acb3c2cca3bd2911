//! Test bodies and the arguments passed to them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-run configuration handed to every test that asks for it.
pub type ConfigMap = BTreeMap<String, String>;

/// Collects informational messages from a running test.
///
/// Messages are delivered to the reporter as `info_provided` events right
/// after the test's terminal event.
#[derive(Debug, Default)]
pub struct Informer {
    messages: Mutex<Vec<String>>,
}

impl Informer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// What a test body taking arguments receives.
pub struct TestArgs<'a> {
    pub config: &'a ConfigMap,
    pub informer: &'a Informer,
}

impl TestArgs<'_> {
    /// Shorthand for `self.informer.info(message)`.
    pub fn info(&self, message: impl Into<String>) {
        self.informer.info(message);
    }
}

/// An invocable test body.
#[derive(Clone)]
pub enum TestBody {
    Plain(Arc<dyn Fn() + Send + Sync>),
    WithArgs(Arc<dyn Fn(&TestArgs<'_>) + Send + Sync>),
}

impl TestBody {
    pub fn plain(f: impl Fn() + Send + Sync + 'static) -> Self {
        TestBody::Plain(Arc::new(f))
    }

    pub fn with_args(f: impl Fn(&TestArgs<'_>) + Send + Sync + 'static) -> Self {
        TestBody::WithArgs(Arc::new(f))
    }

    pub(crate) fn call(&self, args: &TestArgs<'_>) {
        match self {
            TestBody::Plain(f) => f(),
            TestBody::WithArgs(f) => f(args),
        }
    }
}

impl fmt::Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestBody::Plain(_) => f.write_str("TestBody::Plain"),
            TestBody::WithArgs(_) => f.write_str("TestBody::WithArgs"),
        }
    }
}
