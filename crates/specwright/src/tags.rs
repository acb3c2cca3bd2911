//! Tag-based test selection.

use std::collections::BTreeSet;

/// Implicit tag carried by every test registered as ignored.
pub const IGNORED_TAG: &str = "ignored";

/// Decide whether a test with `test_tags` runs under the given include and
/// exclude sets.
///
/// With an empty `include`, every test not tagged with anything in
/// `exclude` runs. With a non-empty `include`, a test must also carry at
/// least one of the included tags.
pub fn should_run(
    test_tags: &BTreeSet<String>,
    include: &BTreeSet<String>,
    exclude: &BTreeSet<String>,
) -> bool {
    if !include.is_empty() && test_tags.is_disjoint(include) {
        return false;
    }
    test_tags.is_disjoint(exclude)
}

/// What the run loop does with one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run,
    /// Report through `test_ignored` without running the body.
    Ignore,
    /// Leave out entirely; no events.
    Skip,
}

/// Selection applied by a run: include/exclude tags plus an optional
/// case-insensitive substring over full test names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
    name_contains: Option<String>,
}

impl Default for Filter {
    /// Runs everything except tests tagged [`IGNORED_TAG`], which are
    /// reported as ignored.
    fn default() -> Self {
        Filter::new(Vec::<String>::new(), [IGNORED_TAG])
    }
}

impl Filter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Filter {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
            name_contains: None,
        }
    }

    /// A filter that selects every test, ignored ones included.
    pub fn everything() -> Self {
        Filter::new(Vec::<String>::new(), Vec::<String>::new())
    }

    /// Add [`IGNORED_TAG`] to the exclude set.
    pub fn excluding_ignored(mut self) -> Self {
        self.exclude.insert(IGNORED_TAG.to_string());
        self
    }

    pub fn with_name_filter(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into().to_lowercase());
        self
    }

    pub fn include(&self) -> &BTreeSet<String> {
        &self.include
    }

    pub fn exclude(&self) -> &BTreeSet<String> {
        &self.exclude
    }

    /// Decide what to do with the named test.
    ///
    /// A test tagged [`IGNORED_TAG`] that would otherwise be selected is
    /// reported as ignored when the exclude set contains [`IGNORED_TAG`].
    pub fn decide(&self, name: &str, tags: Option<&BTreeSet<String>>) -> Decision {
        if let Some(needle) = &self.name_contains {
            if !name.to_lowercase().contains(needle.as_str()) {
                return Decision::Skip;
            }
        }

        let empty = BTreeSet::new();
        let tags = tags.unwrap_or(&empty);

        if should_run(tags, &self.include, &self.exclude) {
            return Decision::Run;
        }

        if tags.contains(IGNORED_TAG) && self.exclude.contains(IGNORED_TAG) {
            let mut without_ignored = tags.clone();
            without_ignored.remove(IGNORED_TAG);
            let mut exclude = self.exclude.clone();
            exclude.remove(IGNORED_TAG);
            if should_run(&without_ignored, &self.include, &exclude) {
                return Decision::Ignore;
            }
        }

        Decision::Skip
    }
}
