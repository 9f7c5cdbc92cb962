//! Permission gate: removes elements the session may not use.
//!
//! A view is a declarative tree of [`ViewNode`]s, each optionally carrying a
//! [`Requirement`]. [`PermissionGate::mount`] evaluates every requirement once,
//! against the shared session as it is at mount time, and drops failing nodes
//! together with their children. The mounted view is a snapshot: later
//! permission changes do not re-run the gate.

use jinkops_auth::{Requirement, Session, SessionState, has_permission};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Section,
    Text,
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewNode {
    pub kind: NodeKind,
    pub label: String,
    pub requires: Requirement,
    pub children: Vec<ViewNode>,
}

impl ViewNode {
    fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            requires: Requirement::Unrestricted,
            children: Vec::new(),
        }
    }

    pub fn section(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Section, label)
    }

    pub fn text(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, label)
    }

    pub fn action(label: impl Into<String>, requires: impl Into<Requirement>) -> Self {
        Self::new(NodeKind::Action, label).requires(requires)
    }

    pub fn requires(mut self, requires: impl Into<Requirement>) -> Self {
        self.requires = requires.into();
        self
    }

    pub fn child(mut self, child: ViewNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ViewNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Depth-first labels of every node in the tree.
    pub fn labels(&self) -> Vec<&str> {
        let mut out = vec![self.label.as_str()];
        for child in &self.children {
            out.extend(child.labels());
        }
        out
    }

    pub fn find(&self, label: &str) -> Option<&ViewNode> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(label))
    }
}

/// Result of mounting a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedView {
    root: Option<ViewNode>,
    removed: Vec<String>,
}

impl MountedView {
    /// `None` when the root itself was removed.
    pub fn root(&self) -> Option<&ViewNode> {
        self.root.as_ref()
    }

    /// Labels of removed nodes (subtree roots only).
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn contains(&self, label: &str) -> bool {
        self.root.as_ref().is_some_and(|r| r.find(label).is_some())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(root) = &self.root {
            render_node(root, 0, &mut out);
        }
        out
    }
}

fn render_node(node: &ViewNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node.kind {
        NodeKind::Section | NodeKind::Text => out.push_str(&format!("{indent}{}\n", node.label)),
        NodeKind::Action => out.push_str(&format!("{indent}[{}]\n", node.label)),
    }
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

#[derive(Debug, Clone)]
pub struct PermissionGate {
    session: Session,
}

impl PermissionGate {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn mount(&self, view: ViewNode) -> MountedView {
        let mut removed = Vec::new();
        let root = self.session.read(|state| prune(view, state, &mut removed));
        if !removed.is_empty() {
            tracing::debug!(removed = ?removed, "gate removed elements");
        }
        MountedView { root, removed }
    }
}

fn prune(node: ViewNode, state: &SessionState, removed: &mut Vec<String>) -> Option<ViewNode> {
    if !has_permission(state, &node.requires) {
        removed.push(node.label);
        return None;
    }
    let ViewNode {
        kind,
        label,
        requires,
        children,
    } = node;
    let children = children
        .into_iter()
        .filter_map(|c| prune(c, state, removed))
        .collect();
    Some(ViewNode {
        kind,
        label,
        requires,
        children,
    })
}
