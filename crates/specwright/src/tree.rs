//! The spec tree: branches, example leaves and shared behaviors.
//!
//! Branches live in an arena indexed by [`BranchId`]; each one remembers
//! its parent so `behaves_like` references can be resolved by walking
//! outwards through enclosing scopes.

use crate::args::TestBody;
use crate::context::HookKind;
use crate::error::{Error, Result};
use crate::tags::{Decision, Filter};
use std::collections::BTreeSet;
use std::sync::Arc;

pub(crate) type BranchId = usize;
pub(crate) type Hook = Arc<dyn Fn() + Send + Sync>;

pub(crate) const ROOT: BranchId = 0;

pub(crate) enum BranchKind {
    Root,
    Description(String),
    SharedBehavior(String),
}

#[derive(Default)]
pub(crate) struct Hooks {
    before_each: Option<Hook>,
    after_each: Option<Hook>,
    before_all: Option<Hook>,
    after_all: Option<Hook>,
}

impl Hooks {
    pub(crate) fn get(&self, kind: HookKind) -> Option<&Hook> {
        match kind {
            HookKind::BeforeEach => self.before_each.as_ref(),
            HookKind::AfterEach => self.after_each.as_ref(),
            HookKind::BeforeAll => self.before_all.as_ref(),
            HookKind::AfterAll => self.after_all.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: HookKind) -> &mut Option<Hook> {
        match kind {
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
            HookKind::BeforeAll => &mut self.before_all,
            HookKind::AfterAll => &mut self.after_all,
        }
    }
}

pub(crate) struct Branch {
    pub(crate) kind: BranchKind,
    pub(crate) parent: Option<BranchId>,
    pub(crate) children: Vec<Node>,
    pub(crate) hooks: Hooks,
}

impl Branch {
    /// Human-readable scope name for error messages.
    pub(crate) fn display_name(&self) -> String {
        match &self.kind {
            BranchKind::Root => "(root)".to_string(),
            BranchKind::Description(name) => name.clone(),
            BranchKind::SharedBehavior(name) => format!("shared behavior '{name}'"),
        }
    }
}

pub(crate) struct Example {
    pub(crate) text: String,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) body: TestBody,
}

pub(crate) enum Node {
    Example(Example),
    Description(BranchId),
    /// Traversed only through an invocation.
    SharedBehaviorDefinition(BranchId),
    /// `target` is filled in when the tree is finalized.
    SharedBehaviorInvocation {
        name: String,
        target: Option<BranchId>,
    },
}

/// An example as reached by traversal from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexedExample {
    pub(crate) full_name: String,
    pub(crate) branch: BranchId,
    pub(crate) index: usize,
    /// Branches entered on the way here, outermost first, ending with
    /// `branch`. Inlined shared behaviors appear at their invocation site.
    pub(crate) scopes: Vec<BranchId>,
}

/// Reported name of an example: `"<prefix> should <text>"`, or
/// `"It should <text>"` outside any description.
pub(crate) fn full_name(prefix: &[&str], text: &str) -> String {
    if prefix.is_empty() {
        format!("It should {text}")
    } else {
        format!("{} should {text}", prefix.join(" "))
    }
}

pub(crate) struct SpecTree {
    branches: Vec<Branch>,
}

impl SpecTree {
    pub(crate) fn new() -> Self {
        SpecTree {
            branches: vec![Branch {
                kind: BranchKind::Root,
                parent: None,
                children: Vec::new(),
                hooks: Hooks::default(),
            }],
        }
    }

    pub(crate) fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id]
    }

    pub(crate) fn branch_mut(&mut self, id: BranchId) -> &mut Branch {
        &mut self.branches[id]
    }

    /// Create a child branch of `parent` and link it in as the parent's
    /// newest child.
    pub(crate) fn add_branch(&mut self, parent: BranchId, kind: BranchKind) -> BranchId {
        let id = self.branches.len();
        let node = match kind {
            BranchKind::SharedBehavior(_) => Node::SharedBehaviorDefinition(id),
            _ => Node::Description(id),
        };
        self.branches.push(Branch {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            hooks: Hooks::default(),
        });
        self.push_node(parent, node);
        id
    }

    /// Append `node` to `branch`, returning its index among the children.
    pub(crate) fn push_node(&mut self, branch: BranchId, node: Node) -> usize {
        let children = &mut self.branches[branch].children;
        children.push(node);
        children.len() - 1
    }

    pub(crate) fn example(&self, branch: BranchId, index: usize) -> Option<&Example> {
        match self.branches.get(branch)?.children.get(index)? {
            Node::Example(example) => Some(example),
            _ => None,
        }
    }

    pub(crate) fn example_mut(&mut self, branch: BranchId, index: usize) -> Option<&mut Example> {
        match self.branches.get_mut(branch)?.children.get_mut(index)? {
            Node::Example(example) => Some(example),
            _ => None,
        }
    }

    /// Prefix fragment contributed by a branch; shared behaviors and the
    /// root contribute nothing.
    pub(crate) fn fragment(&self, id: BranchId) -> Option<&str> {
        match &self.branches[id].kind {
            BranchKind::Description(name) => Some(name),
            _ => None,
        }
    }

    /// Find the shared behavior `name` visible from `from`: its own
    /// definitions first, then each enclosing scope outwards. The closest
    /// definition wins; within one scope the first one defined wins.
    pub(crate) fn resolve(&self, from: BranchId, name: &str) -> Option<BranchId> {
        let mut current = Some(from);
        while let Some(id) = current {
            let branch = &self.branches[id];
            let found = branch.children.iter().find_map(|node| match node {
                Node::SharedBehaviorDefinition(def) => match &self.branches[*def].kind {
                    BranchKind::SharedBehavior(def_name) if def_name == name => Some(*def),
                    _ => None,
                },
                _ => None,
            });
            if found.is_some() {
                return found;
            }
            current = branch.parent;
        }
        None
    }

    /// Bind every `behaves_like` to its definition.
    pub(crate) fn resolve_invocations(&mut self) -> Result<()> {
        let mut resolved = Vec::new();
        for (id, branch) in self.branches.iter().enumerate() {
            for (index, node) in branch.children.iter().enumerate() {
                if let Node::SharedBehaviorInvocation { name, .. } = node {
                    let target = self
                        .resolve(id, name)
                        .ok_or_else(|| Error::NoSuchSharedBehavior(name.clone()))?;
                    tracing::debug!(behavior = %name, from = id, resolved = target, "resolved shared behavior");
                    resolved.push((id, index, target));
                }
            }
        }
        for (id, index, resolved_target) in resolved {
            if let Node::SharedBehaviorInvocation { target, .. } =
                &mut self.branches[id].children[index]
            {
                *target = Some(resolved_target);
            }
        }
        self.check_shared_behaviors()
    }

    /// Reject shared behaviors that invoke themselves, directly or through
    /// other shares, whether or not anything invokes them.
    fn check_shared_behaviors(&self) -> Result<()> {
        for (id, branch) in self.branches.iter().enumerate() {
            if let BranchKind::SharedBehavior(_) = branch.kind {
                self.visit(id, &mut Vec::new(), &mut vec![id], &mut |_, _| {})?;
            }
        }
        Ok(())
    }

    /// Every example reachable from the root, in execution order, with
    /// shared behaviors expanded at their invocation sites.
    pub(crate) fn examples(&self) -> Result<Vec<IndexedExample>> {
        let mut out = Vec::new();
        self.visit(ROOT, &mut Vec::new(), &mut vec![ROOT], &mut |indexed, _| {
            out.push(indexed)
        })?;
        Ok(out)
    }

    /// Examples under `id` that a run with `filter` would execute.
    pub(crate) fn count_runnable<'a>(
        &'a self,
        id: BranchId,
        prefix: &mut Vec<&'a str>,
        filter: &Filter,
    ) -> Result<usize> {
        let mut count = 0;
        self.visit(id, prefix, &mut vec![id], &mut |indexed, example| {
            if filter.decide(&indexed.full_name, Some(&example.tags)) == Decision::Run {
                count += 1;
            }
        })?;
        Ok(count)
    }

    fn visit<'a>(
        &'a self,
        id: BranchId,
        prefix: &mut Vec<&'a str>,
        path: &mut Vec<BranchId>,
        f: &mut dyn FnMut(IndexedExample, &'a Example),
    ) -> Result<()> {
        for (index, node) in self.branches[id].children.iter().enumerate() {
            match node {
                Node::Example(example) => {
                    let indexed = IndexedExample {
                        full_name: full_name(prefix, &example.text),
                        branch: id,
                        index,
                        scopes: path.clone(),
                    };
                    f(indexed, example);
                }
                Node::Description(child) => {
                    prefix.extend(self.fragment(*child));
                    path.push(*child);
                    self.visit(*child, prefix, path, f)?;
                    path.pop();
                    if self.fragment(*child).is_some() {
                        prefix.pop();
                    }
                }
                Node::SharedBehaviorDefinition(_) => {}
                Node::SharedBehaviorInvocation { name, target } => {
                    let target = target.ok_or_else(|| Error::NoSuchSharedBehavior(name.clone()))?;
                    if path.contains(&target) {
                        return Err(Error::RecursiveSharedBehavior(name.clone()));
                    }
                    path.push(target);
                    self.visit(target, prefix, path, f)?;
                    path.pop();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(text: &str) -> Node {
        Node::Example(Example {
            text: text.to_string(),
            tags: BTreeSet::new(),
            body: TestBody::plain(|| {}),
        })
    }

    fn invoke(name: &str) -> Node {
        Node::SharedBehaviorInvocation {
            name: name.to_string(),
            target: None,
        }
    }

    #[test]
    fn name_templates() {
        assert_eq!(full_name(&[], "pop"), "It should pop");
        assert_eq!(full_name(&["A Stack"], "pop"), "A Stack should pop");
        assert_eq!(full_name(&["A", "B"], "C"), "A B should C");
    }

    #[test]
    fn closest_shared_behavior_wins() {
        let mut tree = SpecTree::new();
        let outer_def = tree.add_branch(ROOT, BranchKind::SharedBehavior("stack".into()));
        let scope = tree.add_branch(ROOT, BranchKind::Description("A".into()));
        let inner_def = tree.add_branch(scope, BranchKind::SharedBehavior("stack".into()));
        let nested = tree.add_branch(scope, BranchKind::Description("B".into()));

        assert_eq!(tree.resolve(nested, "stack"), Some(inner_def));
        assert_eq!(tree.resolve(ROOT, "stack"), Some(outer_def));
        assert_eq!(tree.resolve(nested, "queue"), None);
    }

    #[test]
    fn invocations_expand_in_place_with_the_invoking_prefix() {
        let mut tree = SpecTree::new();
        let def = tree.add_branch(ROOT, BranchKind::SharedBehavior("non-empty".into()));
        tree.push_node(def, example("return the top on peek"));
        let scope = tree.add_branch(ROOT, BranchKind::Description("A full stack".into()));
        tree.push_node(scope, example("refuse a push"));
        tree.push_node(scope, invoke("non-empty"));
        tree.resolve_invocations().unwrap();

        let names: Vec<String> = tree
            .examples()
            .unwrap()
            .into_iter()
            .map(|e| e.full_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "A full stack should refuse a push",
                "A full stack should return the top on peek",
            ]
        );
    }

    #[test]
    fn unresolvable_invocations_fail() {
        let mut tree = SpecTree::new();
        let scope = tree.add_branch(ROOT, BranchKind::Description("A".into()));
        tree.push_node(scope, invoke("missing"));
        assert!(matches!(
            tree.resolve_invocations(),
            Err(Error::NoSuchSharedBehavior(ref n)) if n == "missing"
        ));
    }

    #[test]
    fn self_invoking_shared_behaviors_are_rejected() {
        let mut tree = SpecTree::new();
        let def = tree.add_branch(ROOT, BranchKind::SharedBehavior("loop".into()));
        tree.push_node(def, invoke("loop"));
        tree.push_node(ROOT, invoke("loop"));
        assert!(matches!(
            tree.resolve_invocations(),
            Err(Error::RecursiveSharedBehavior(ref n)) if n == "loop"
        ));
    }

    #[test]
    fn recursion_is_rejected_even_when_nothing_invokes_the_share() {
        let mut tree = SpecTree::new();
        let ping = tree.add_branch(ROOT, BranchKind::SharedBehavior("ping".into()));
        let pong = tree.add_branch(ROOT, BranchKind::SharedBehavior("pong".into()));
        let inner = tree.add_branch(ping, BranchKind::Description("nested".into()));
        tree.push_node(inner, invoke("pong"));
        tree.push_node(pong, invoke("ping"));
        assert!(matches!(
            tree.resolve_invocations(),
            Err(Error::RecursiveSharedBehavior(_))
        ));
    }

    #[test]
    fn examples_remember_the_scopes_they_were_reached_through() {
        let mut tree = SpecTree::new();
        let def = tree.add_branch(ROOT, BranchKind::SharedBehavior("non-empty".into()));
        tree.push_node(def, example("peek"));
        let outer = tree.add_branch(ROOT, BranchKind::Description("A".into()));
        let inner = tree.add_branch(outer, BranchKind::Description("B".into()));
        tree.push_node(inner, example("pop"));
        tree.push_node(inner, invoke("non-empty"));
        tree.resolve_invocations().unwrap();

        let scopes: Vec<Vec<BranchId>> = tree
            .examples()
            .unwrap()
            .into_iter()
            .map(|e| e.scopes)
            .collect();
        assert_eq!(
            scopes,
            vec![vec![ROOT, outer, inner], vec![ROOT, outer, inner, def]]
        );
    }
}
