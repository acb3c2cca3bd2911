//! Closure-based spec DSL: `Context` and `ExampleHandle`.

use crate::args::{TestArgs, TestBody};
use crate::error::{Error, Result};
use crate::tags::IGNORED_TAG;
use crate::tree::{BranchId, BranchKind, Example, Hook, Node, SpecTree, ROOT};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// The four per-scope lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeEach,
    AfterEach,
    BeforeAll,
    AfterAll,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::BeforeEach => "before_each",
            HookKind::AfterEach => "after_each",
            HookKind::BeforeAll => "before_all",
            HookKind::AfterAll => "after_all",
        })
    }
}

// ============================================================================
// Context: the builder handed to spec closures
// ============================================================================

/// Builds a spec tree while a [`Spec`](crate::Spec) is being constructed.
///
/// Each nested block receives the same `Context`; the scope it targets is
/// pushed before the block runs and popped when it returns.
///
/// # Example
/// ```rust
/// # fn main() -> specwright::Result<()> {
/// let spec = specwright::Spec::build("StackSpec", |ctx| {
///     ctx.describe("A Stack", |ctx| {
///         ctx.it("pop the last pushed value", || {
///             let mut stack = vec![1, 2];
///             assert_eq!(stack.pop(), Some(2));
///         });
///     });
/// })?;
/// # let _ = spec;
/// # Ok(()) }
/// ```
pub struct Context {
    tree: SpecTree,
    stack: Vec<BranchId>,
    errors: Vec<Error>,
}

impl Context {
    pub(crate) fn new() -> Self {
        Context {
            tree: SpecTree::new(),
            stack: vec![ROOT],
            errors: Vec::new(),
        }
    }

    // ---- Describe / Context / When -------------------------------------------

    /// Open a nested scope. Its name prefixes the names of the examples
    /// inside it.
    pub fn describe(&mut self, name: &str, body: impl FnOnce(&mut Context)) {
        self.scope(BranchKind::Description(name.to_string()), body);
    }

    pub fn context(&mut self, name: &str, body: impl FnOnce(&mut Context)) {
        self.describe(name, body);
    }

    pub fn when(&mut self, name: &str, body: impl FnOnce(&mut Context)) {
        self.describe(name, body);
    }

    // ---- Shared behaviors ----------------------------------------------------

    /// Define a reusable group of examples. It only runs where
    /// [`behaves_like`](Self::behaves_like) invokes it.
    pub fn share(&mut self, name: &str, body: impl FnOnce(&mut Context)) {
        self.scope(BranchKind::SharedBehavior(name.to_string()), body);
    }

    /// Run the shared behavior `name` here, as if its examples were written
    /// in place.
    ///
    /// The definition may appear anywhere in this scope or an enclosing one,
    /// before or after the invocation.
    pub fn behaves_like(&mut self, name: &str) {
        let current = self.current();
        self.tree.push_node(
            current,
            Node::SharedBehaviorInvocation {
                name: name.to_string(),
                target: None,
            },
        );
    }

    // ---- It / Specify / Ignore -----------------------------------------------

    /// Add an example. Returns an [`ExampleHandle`] for optional tags.
    ///
    /// ```rust
    /// # fn main() -> specwright::Result<()> {
    /// # specwright::Spec::build("s", |ctx| {
    /// ctx.it("works", || { assert!(true); });
    ///
    /// ctx.it("talks to the database", || { /* ... */ })
    ///     .tags(&["db", "slow"]);
    /// # })?;
    /// # Ok(()) }
    /// ```
    pub fn it(&mut self, text: &str, body: impl Fn() + Send + Sync + 'static) -> ExampleHandle<'_> {
        self.add_example(text, TestBody::plain(body), false)
    }

    pub fn specify(
        &mut self,
        text: &str,
        body: impl Fn() + Send + Sync + 'static,
    ) -> ExampleHandle<'_> {
        self.it(text, body)
    }

    /// Add an example whose body receives the run's config map and an
    /// informer.
    pub fn it_with_args(
        &mut self,
        text: &str,
        body: impl Fn(&TestArgs<'_>) + Send + Sync + 'static,
    ) -> ExampleHandle<'_> {
        self.add_example(text, TestBody::with_args(body), false)
    }

    /// Add an example that is reported as ignored instead of being run.
    pub fn ignore(
        &mut self,
        text: &str,
        body: impl Fn() + Send + Sync + 'static,
    ) -> ExampleHandle<'_> {
        self.add_example(text, TestBody::plain(body), true)
    }

    // ---- Hooks ---------------------------------------------------------------

    /// Runs before every example owned by the current scope. At most one
    /// per scope.
    pub fn before_each(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.set_hook(HookKind::BeforeEach, Arc::new(hook));
    }

    /// Runs after every example owned by the current scope, whether the
    /// example passed or failed. At most one per scope.
    pub fn after_each(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.set_hook(HookKind::AfterEach, Arc::new(hook));
    }

    pub fn before_all(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.set_hook(HookKind::BeforeAll, Arc::new(hook));
    }

    pub fn after_all(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.set_hook(HookKind::AfterAll, Arc::new(hook));
    }

    // ---- Internals -----------------------------------------------------------

    fn scope(&mut self, kind: BranchKind, body: impl FnOnce(&mut Context)) {
        let parent = self.current();
        let id = self.tree.add_branch(parent, kind);
        self.stack.push(id);
        body(self);
        self.stack.pop();
    }

    fn add_example(&mut self, text: &str, body: TestBody, ignored: bool) -> ExampleHandle<'_> {
        let branch = self.current();
        let mut tags = BTreeSet::new();
        if ignored {
            tags.insert(IGNORED_TAG.to_string());
        }
        let index = self.tree.push_node(
            branch,
            Node::Example(Example {
                text: text.to_string(),
                tags,
                body,
            }),
        );
        ExampleHandle {
            tree: &mut self.tree,
            branch,
            index,
        }
    }

    fn set_hook(&mut self, kind: HookKind, hook: Hook) {
        let current = self.current();
        let branch = self.tree.branch_mut(current);
        let slot = branch.hooks.slot_mut(kind);
        if slot.is_some() {
            let scope = branch.display_name();
            self.errors.push(Error::MultipleHook { hook: kind, scope });
        } else {
            *slot = Some(hook);
        }
    }

    fn current(&self) -> BranchId {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    /// Hand over the finished tree, or the first error recorded while
    /// building it.
    pub(crate) fn finish(self) -> Result<SpecTree> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.tree),
        }
    }
}

// ============================================================================
// ExampleHandle: fluent decorators for a just-added example
// ============================================================================

/// Returned by [`Context::it`] and friends.
pub struct ExampleHandle<'a> {
    tree: &'a mut SpecTree,
    branch: BranchId,
    index: usize,
}

impl ExampleHandle<'_> {
    /// Attach tags for include/exclude filtering.
    pub fn tags(self, tags: &[&str]) -> Self {
        if let Some(example) = self.tree.example_mut(self.branch, self.index) {
            example.tags.extend(tags.iter().map(|t| t.to_string()));
        }
        self
    }
}
