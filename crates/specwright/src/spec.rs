//! Describe/it style suites built from a spec tree.

use crate::args::ConfigMap;
use crate::context::{Context, HookKind};
use crate::error::{Error, Result};
use crate::outcome::panic_message;
use crate::reporter::Reporter;
use crate::stopper::Stopper;
use crate::suite::{execute_test, report_ignored, unknown_test, Suite};
use crate::tags::{Decision, Filter};
use crate::tree::{BranchId, Example, IndexedExample, Node, SpecTree, ROOT};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A suite of examples organised in nested scopes.
///
/// Example names are the enclosing description names joined by spaces,
/// then `" should "`, then the example text: an example `"pop"` inside
/// `describe("A Stack")` is reported as `"A Stack should pop"`. Outside any
/// description the name is `"It should <text>"`.
///
/// ```rust
/// # fn main() -> specwright::Result<()> {
/// use specwright::{Spec, Suite};
///
/// let spec = Spec::build("StackSpec", |ctx| {
///     ctx.share("a non-empty stack", |ctx| {
///         ctx.it("return the top item on peek", || {});
///     });
///     ctx.describe("A full stack", |ctx| {
///         ctx.it("refuse a push", || {});
///         ctx.behaves_like("a non-empty stack");
///     });
/// })?;
///
/// assert_eq!(
///     spec.test_names(),
///     vec![
///         "A full stack should refuse a push",
///         "A full stack should return the top item on peek",
///     ]
/// );
/// # Ok(()) }
/// ```
pub struct Spec {
    name: String,
    tree: SpecTree,
    index: Vec<IndexedExample>,
    nested: Vec<Box<dyn Suite>>,
}

/// Whether traversal should keep scheduling examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stopped,
}

struct RunState<'r> {
    reporter: &'r mut dyn Reporter,
    stopper: &'r dyn Stopper,
    filter: &'r Filter,
    config: &'r ConfigMap,
}

impl Spec {
    /// Build a spec by running `body` against a fresh [`Context`].
    ///
    /// Fails if a scope was given two hooks of one kind, a `behaves_like`
    /// cannot be resolved, a shared behavior invokes itself, or two
    /// examples end up with the same full name.
    pub fn build(name: impl Into<String>, body: impl FnOnce(&mut Context)) -> Result<Spec> {
        let name = name.into();
        let mut ctx = Context::new();
        body(&mut ctx);

        let mut tree = ctx.finish()?;
        tree.resolve_invocations()?;
        let index = tree.examples()?;

        let mut seen = HashSet::new();
        if let Some(dup) = index.iter().find(|e| !seen.insert(e.full_name.as_str())) {
            return Err(Error::DuplicateTestName(dup.full_name.clone()));
        }

        tracing::debug!(suite = %name, examples = index.len(), "built spec");
        Ok(Spec {
            name,
            tree,
            index,
            nested: Vec::new(),
        })
    }

    /// Run `nested` after this spec's own examples.
    pub fn nest(&mut self, nested: Box<dyn Suite>) {
        self.nested.push(nested);
    }

    fn indexed_example(&self, indexed: &IndexedExample) -> Result<&Example> {
        self.tree
            .example(indexed.branch, indexed.index)
            .ok_or_else(|| unknown_test(&indexed.full_name))
    }

    fn run_branch<'a>(
        &'a self,
        id: BranchId,
        prefix: &mut Vec<&'a str>,
        run: &mut RunState<'_>,
    ) -> Result<Flow> {
        let branch = self.tree.branch(id);
        let bracketed = self.tree.count_runnable(id, prefix, run.filter)? > 0;
        if bracketed {
            self.run_hook(id, HookKind::BeforeAll)?;
        }

        let mut flow = Flow::Continue;
        for node in &branch.children {
            match node {
                Node::Example(example) => {
                    let name = crate::tree::full_name(prefix, &example.text);
                    match run.filter.decide(&name, Some(&example.tags)) {
                        Decision::Run => {
                            if run.stopper.stop_requested() {
                                tracing::debug!(suite = %self.name, "stopping before '{name}'");
                                flow = Flow::Stopped;
                            } else {
                                self.run_example(id, example, &name, run.reporter, run.config)?;
                            }
                        }
                        Decision::Ignore => report_ignored(&self.name, &name, run.reporter)?,
                        Decision::Skip => {}
                    }
                }
                Node::Description(child) => {
                    prefix.extend(self.tree.fragment(*child));
                    flow = self.run_branch(*child, prefix, run)?;
                    prefix.pop();
                }
                Node::SharedBehaviorDefinition(_) => {}
                Node::SharedBehaviorInvocation { name, target } => {
                    let target = target.ok_or_else(|| Error::NoSuchSharedBehavior(name.clone()))?;
                    flow = self.run_branch(target, prefix, run)?;
                }
            }
            if flow == Flow::Stopped {
                break;
            }
        }

        if bracketed {
            self.run_hook(id, HookKind::AfterAll)?;
        }
        Ok(flow)
    }

    /// `before_each`, the example inside the failure boundary, then
    /// `after_each`. The hooks of the example's own scope apply.
    fn run_example(
        &self,
        owner: BranchId,
        example: &Example,
        name: &str,
        reporter: &mut dyn Reporter,
        config: &ConfigMap,
    ) -> Result<()> {
        self.run_hook(owner, HookKind::BeforeEach)?;
        execute_test(&self.name, name, &example.body, reporter, config)?;
        self.run_hook(owner, HookKind::AfterEach)
    }

    /// Hooks are outside the per-test failure boundary: a panicking hook
    /// aborts the run.
    fn run_hook(&self, id: BranchId, kind: HookKind) -> Result<()> {
        let branch = self.tree.branch(id);
        let Some(hook) = branch.hooks.get(kind) else {
            return Ok(());
        };
        catch_unwind(AssertUnwindSafe(|| hook())).map_err(|payload| {
            let scope = branch.display_name();
            let message = panic_message(payload.as_ref());
            tracing::warn!(suite = %self.name, %scope, hook = %kind, "hook failed: {message}");
            Error::HookFailed {
                hook: kind,
                scope,
                message,
            }
        })
    }
}

impl Suite for Spec {
    fn suite_name(&self) -> &str {
        &self.name
    }

    fn test_names(&self) -> Vec<String> {
        self.index.iter().map(|e| e.full_name.clone()).collect()
    }

    fn tags(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.index
            .iter()
            .filter_map(|indexed| {
                let example = self.tree.example(indexed.branch, indexed.index)?;
                (!example.tags.is_empty())
                    .then(|| (indexed.full_name.clone(), example.tags.clone()))
            })
            .collect()
    }

    /// Counts example leaves by walking the tree; shared behaviors count
    /// once per invocation and never on their own.
    fn expected_test_count(&self, filter: &Filter) -> usize {
        let own = self
            .tree
            .count_runnable(ROOT, &mut Vec::new(), filter)
            .unwrap_or(0);
        own + self
            .nested
            .iter()
            .map(|nested| nested.expected_test_count(filter))
            .sum::<usize>()
    }

    fn run_test(
        &self,
        name: &str,
        reporter: &mut dyn Reporter,
        _stopper: &dyn Stopper,
        config: &ConfigMap,
    ) -> Result<()> {
        let indexed = self
            .index
            .iter()
            .find(|e| e.full_name == name)
            .ok_or_else(|| unknown_test(name))?;
        let example = self.indexed_example(indexed)?;

        // Same brackets a full run would give this example.
        for &scope in &indexed.scopes {
            self.run_hook(scope, HookKind::BeforeAll)?;
        }
        self.run_example(indexed.branch, example, name, reporter, config)?;
        for &scope in indexed.scopes.iter().rev() {
            self.run_hook(scope, HookKind::AfterAll)?;
        }
        Ok(())
    }

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
        let mut run = RunState {
            reporter,
            stopper,
            filter,
            config,
        };
        self.run_branch(ROOT, &mut Vec::new(), &mut run)?;
        Ok(())
    }

    fn nested_suites(&self) -> &[Box<dyn Suite>] {
        &self.nested
    }
}

impl std::fmt::Debug for Spec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spec")
            .field("name", &self.name)
            .field("examples", &self.index.len())
            .field("nested", &self.nested)
            .finish()
    }
}
