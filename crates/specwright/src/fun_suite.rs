//! Function-style suites: a flat list of named tests.

use crate::args::{ConfigMap, TestArgs, TestBody};
use crate::error::Result;
use crate::registry::Registry;
use crate::reporter::Reporter;
use crate::stopper::Stopper;
use crate::suite::{execute_test, unknown_test, Suite};
use std::collections::{BTreeMap, BTreeSet};

/// A suite of named tests, run in the order they were registered.
///
/// ```rust
/// # fn main() -> specwright::Result<()> {
/// use specwright::{FunSuite, Suite};
///
/// let suite = FunSuite::new("StackSuite");
/// suite.test("push then pop returns the pushed value", || {
///     let mut stack = vec![1];
///     assert_eq!(stack.pop(), Some(1));
/// })?;
/// suite.tagged_test("pop on empty returns None", &["fast"], || {
///     assert_eq!(Vec::<i32>::new().pop(), None);
/// })?;
///
/// assert_eq!(suite.test_names().len(), 2);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct FunSuite {
    name: String,
    registry: Registry,
    nested: Vec<Box<dyn Suite>>,
}

impl FunSuite {
    pub fn new(name: impl Into<String>) -> Self {
        FunSuite {
            name: name.into(),
            registry: Registry::new(),
            nested: Vec::new(),
        }
    }

    pub fn test(&self, name: &str, body: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.registry.register(name, TestBody::plain(body), &[])
    }

    pub fn tagged_test(
        &self,
        name: &str,
        tags: &[&str],
        body: impl Fn() + Send + Sync + 'static,
    ) -> Result<()> {
        self.registry.register(name, TestBody::plain(body), tags)
    }

    /// Register a test whose body receives the run's [`ConfigMap`] and an
    /// informer.
    pub fn test_with_args(
        &self,
        name: &str,
        tags: &[&str],
        body: impl Fn(&TestArgs<'_>) + Send + Sync + 'static,
    ) -> Result<()> {
        self.registry.register(name, TestBody::with_args(body), tags)
    }

    /// Register a test that is reported as ignored instead of being run.
    pub fn ignore(&self, name: &str, body: impl Fn() + Send + Sync + 'static) -> Result<()> {
        self.registry.register_ignored(name, TestBody::plain(body), &[])
    }

    /// Run `nested` after this suite's own tests.
    pub fn nest(&mut self, nested: Box<dyn Suite>) {
        self.nested.push(nested);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Suite for FunSuite {
    fn suite_name(&self) -> &str {
        &self.name
    }

    fn test_names(&self) -> Vec<String> {
        self.registry.test_names()
    }

    fn tags(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.registry.tags_by_test_name()
    }

    fn run_test(
        &self,
        name: &str,
        reporter: &mut dyn Reporter,
        _stopper: &dyn Stopper,
        config: &ConfigMap,
    ) -> Result<()> {
        let bundle = self.registry.snapshot();
        let body = bundle.body(name).ok_or_else(|| unknown_test(name))?;
        execute_test(&self.name, name, body, reporter, config)?;
        Ok(())
    }

    fn nested_suites(&self) -> &[Box<dyn Suite>] {
        &self.nested
    }
}
