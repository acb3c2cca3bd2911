//! The registry behind function-style suites.
//!
//! State lives in an immutable [`Bundle`]. Every registration derives a new
//! bundle from the current one and publishes it with a single
//! compare-and-swap, so readers always see a complete snapshot without
//! taking a lock. Registration is expected to happen on one thread while a
//! suite is being built; losing the swap means that expectation was broken,
//! and the registration fails with [`Error::ConcurrentRegistration`]
//! instead of being retried.

use crate::args::TestBody;
use crate::error::{Error, Result};
use crate::tags::IGNORED_TAG;
use arc_swap::ArcSwap;
use rpds::{HashTrieMapSync, ListSync};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Immutable snapshot of registered tests.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Newest first.
    names: ListSync<String>,
    tests: HashTrieMapSync<String, TestBody>,
    /// Only tests with at least one tag appear here.
    tags: HashTrieMapSync<String, BTreeSet<String>>,
}

impl Bundle {
    fn empty() -> Self {
        Bundle {
            names: ListSync::new_sync(),
            tests: HashTrieMapSync::new_sync(),
            tags: HashTrieMapSync::new_sync(),
        }
    }

    /// Derive a bundle with one more test.
    fn with_test(&self, name: &str, body: TestBody, tags: BTreeSet<String>) -> Result<Bundle> {
        if self.tests.contains_key(name) {
            return Err(Error::DuplicateTestName(name.to_string()));
        }
        let tags = if tags.is_empty() {
            self.tags.clone()
        } else {
            self.tags.insert(name.to_string(), tags)
        };
        Ok(Bundle {
            names: self.names.push_front(name.to_string()),
            tests: self.tests.insert(name.to_string(), body),
            tags,
        })
    }

    /// Test names in registration order, oldest first.
    pub fn test_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut names: Vec<String> = self
            .names
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();
        names.reverse();
        names
    }

    pub fn tags_by_test_name(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.tags
            .iter()
            .map(|(name, tags)| (name.clone(), tags.clone()))
            .collect()
    }

    pub fn tags_for(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.tags.get(name)
    }

    pub fn body(&self, name: &str) -> Option<&TestBody> {
        self.tests.get(name)
    }

    pub fn len(&self) -> usize {
        self.tests.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Thread-safe registry of named tests.
#[derive(Debug)]
pub struct Registry {
    bundle: ArcSwap<Bundle>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            bundle: ArcSwap::from_pointee(Bundle::empty()),
        }
    }

    /// The current bundle. Later registrations do not affect it.
    pub fn snapshot(&self) -> Arc<Bundle> {
        self.bundle.load_full()
    }

    /// Register a test.
    ///
    /// Fails with [`Error::DuplicateTestName`] if `name` is taken; the
    /// registry is left unchanged in that case.
    pub fn register(&self, name: &str, body: TestBody, tags: &[&str]) -> Result<()> {
        let current = self.snapshot();
        let next = current.with_test(name, body, to_tag_set(tags))?;
        self.publish(&current, next, name)
    }

    /// Register a test carrying the implicit [`IGNORED_TAG`] alongside `tags`.
    pub fn register_ignored(&self, name: &str, body: TestBody, tags: &[&str]) -> Result<()> {
        let current = self.snapshot();
        let mut tags = to_tag_set(tags);
        tags.insert(IGNORED_TAG.to_string());
        let next = current.with_test(name, body, tags)?;
        self.publish(&current, next, name)
    }

    pub fn test_names(&self) -> Vec<String> {
        self.snapshot().test_names()
    }

    pub fn tags_by_test_name(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.snapshot().tags_by_test_name()
    }

    /// Swap in `next` if the registry still holds `expected`.
    fn publish(&self, expected: &Arc<Bundle>, next: Bundle, name: &str) -> Result<()> {
        let previous = self.bundle.compare_and_swap(expected, Arc::new(next));
        if Arc::ptr_eq(&*previous, expected) {
            tracing::debug!(test = name, "registered test");
            Ok(())
        } else {
            Err(Error::ConcurrentRegistration(name.to_string()))
        }
    }
}

fn to_tag_set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop() -> TestBody {
        TestBody::plain(|| {})
    }

    #[test]
    fn names_come_back_in_registration_order() {
        let registry = Registry::new();
        for name in ["push", "pop", "peek", "is empty"] {
            registry.register(name, noop(), &[]).unwrap();
        }
        assert_eq!(registry.test_names(), vec!["push", "pop", "peek", "is empty"]);
    }

    #[test]
    fn duplicate_names_are_rejected_without_changing_the_bundle() {
        let registry = Registry::new();
        registry.register("push", noop(), &["fast"]).unwrap();
        let before = registry.snapshot();

        let err = registry.register("push", noop(), &[]).unwrap_err();
        assert!(matches!(err, Error::DuplicateTestName(ref n) if n == "push"));
        assert_eq!(registry.snapshot().len(), 1);
        assert!(Arc::ptr_eq(&before, &registry.snapshot()));
    }

    #[test]
    fn only_non_empty_tag_sets_are_recorded() {
        let registry = Registry::new();
        registry.register("plain", noop(), &[]).unwrap();
        registry.register("tagged", noop(), &["slow", "db"]).unwrap();

        let tags = registry.tags_by_test_name();
        assert_eq!(tags.len(), 1);
        assert_eq!(
            tags["tagged"],
            ["db", "slow"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<String>>()
        );
    }

    #[test]
    fn ignored_registration_adds_the_implicit_tag() {
        let registry = Registry::new();
        registry.register_ignored("later", noop(), &["slow"]).unwrap();
        let snapshot = registry.snapshot();
        let tags = snapshot.tags_for("later").unwrap();
        assert!(tags.contains(IGNORED_TAG));
        assert!(tags.contains("slow"));
        assert!(snapshot.body("later").is_some());
    }

    #[test]
    fn publishing_from_a_stale_bundle_fails() {
        let registry = Registry::new();
        let stale = registry.snapshot();
        registry.register("first", noop(), &[]).unwrap();

        let next = stale.with_test("second", noop(), BTreeSet::new()).unwrap();
        let err = registry.publish(&stale, next, "second").unwrap_err();
        assert!(matches!(err, Error::ConcurrentRegistration(ref n) if n == "second"));
        assert_eq!(registry.test_names(), vec!["first"]);
    }

    #[test]
    fn snapshots_are_unaffected_by_later_registrations() {
        let registry = Registry::new();
        registry.register("a", noop(), &[]).unwrap();
        let snapshot = registry.snapshot();
        registry.register("b", noop(), &[]).unwrap();
        assert_eq!(snapshot.test_names(), vec!["a"]);
        assert_eq!(registry.test_names(), vec!["a", "b"]);
    }
}
