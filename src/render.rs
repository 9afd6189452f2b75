//! Arena-backed model of the host's live render structure.
//!
//! The host (a mapping library) owns its DOM/SVG tree; this module models
//! that tree so annotation trees can be realized into it and spliced out
//! again. Node identity is a generational arena index, which gives the
//! reference-equality guarantee detachment restore relies on: the same
//! `NodeId` observed before annotation is valid again after restore.
//!
//! Re-parenting is an explicit, reversible operation: [`RenderTree::adopt`]
//! records where the node came from and [`RenderTree::restore`] puts it
//! back, so rollback on cancellation is mechanical.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::errors::{AnnotationError, AnnotationResult};

/// Stable handle to one render node.
pub type NodeId = Index;

/// One element in the host render structure.
#[derive(Debug)]
pub struct RenderNode {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl RenderNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Record of one reversible re-parenting.
#[derive(Debug, Clone, Copy)]
pub struct AdoptHandle {
    pub node: NodeId,
    pub previous_parent: Option<NodeId>,
    pub previous_position: usize,
}

/// The simulated host render tree.
#[derive(Debug, Default)]
pub struct RenderTree {
    arena: Arena<RenderNode>,
    root: Option<NodeId>,
}

impl RenderTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Create a detached element. The first node created becomes the root.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let idx = self.arena.insert(RenderNode {
            tag: tag.to_string(),
            attrs: Vec::new(),
            parent: None,
            children: Vec::new(),
        });
        if self.root.is_none() {
            self.root = Some(idx);
        }
        idx
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&RenderNode> {
        self.arena.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        if let Some(node) = self.arena.get_mut(id) {
            match node.attrs.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = value.to_string(),
                None => node.attrs.push((key.to_string(), value.to_string())),
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.parent)
    }

    /// Append `child` under `parent`. The child must currently be detached.
    #[instrument(level = "trace", skip(self))]
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> AnnotationResult<()> {
        if !self.arena.contains(parent) {
            return Err(AnnotationError::StaleRenderNode(parent));
        }
        if !self.arena.contains(child) {
            return Err(AnnotationError::StaleRenderNode(child));
        }
        self.detach(child);
        self.arena[child].parent = Some(parent);
        self.arena[parent].children.push(child);
        Ok(())
    }

    /// Move an existing node under a new parent, returning a handle that
    /// [`restore`](Self::restore) reverses exactly.
    #[instrument(level = "debug", skip(self))]
    pub fn adopt(&mut self, child: NodeId, new_parent: NodeId) -> AnnotationResult<AdoptHandle> {
        if !self.arena.contains(child) {
            return Err(AnnotationError::StaleRenderNode(child));
        }
        if !self.arena.contains(new_parent) {
            return Err(AnnotationError::StaleRenderNode(new_parent));
        }
        let previous_parent = self.arena[child].parent;
        let previous_position = previous_parent
            .and_then(|p| self.arena[p].children.iter().position(|&c| c == child))
            .unwrap_or(0);

        self.detach(child);
        self.arena[child].parent = Some(new_parent);
        self.arena[new_parent].children.push(child);

        Ok(AdoptHandle {
            node: child,
            previous_parent,
            previous_position,
        })
    }

    /// Undo an adoption: detach the node from its current parent and
    /// reinsert it at its recorded previous slot.
    #[instrument(level = "debug", skip(self))]
    pub fn restore(&mut self, handle: AdoptHandle) -> AnnotationResult<()> {
        if !self.arena.contains(handle.node) {
            return Err(AnnotationError::StaleRenderNode(handle.node));
        }
        self.detach(handle.node);
        match handle.previous_parent {
            Some(parent) => {
                if !self.arena.contains(parent) {
                    return Err(AnnotationError::StaleRenderNode(parent));
                }
                let position = handle.previous_position.min(self.arena[parent].children.len());
                self.arena[parent].children.insert(position, handle.node);
                self.arena[handle.node].parent = Some(parent);
            }
            None => self.arena[handle.node].parent = None,
        }
        Ok(())
    }

    /// Detach all children of `parent`, returning them in order. The nodes
    /// stay alive in the arena so a later splice-unwind can reattach them.
    #[instrument(level = "debug", skip(self))]
    pub fn detach_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = match self.arena.get_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        for &child in &children {
            self.arena[child].parent = None;
        }
        children
    }

    /// Reattach previously displaced children in their original order.
    pub fn reattach_children(&mut self, parent: NodeId, children: &[NodeId]) {
        for &child in children {
            if self.arena.contains(child) && self.arena.contains(parent) {
                self.detach(child);
                self.arena[child].parent = Some(parent);
                self.arena[parent].children.push(child);
            }
        }
    }

    /// Delete a node and its synthetic descendants. Caller must have
    /// restored any adopted host-owned node out of the subtree first.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_subtree(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.arena.get(id).and_then(|n| n.parent) {
            if let Some(parent_node) = self.arena.get_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
            self.arena[id].parent = None;
        }
    }

    /// Depth-first, left-to-right iteration from the root.
    pub fn iter(&self) -> RenderIterator<'_> {
        RenderIterator::new(self)
    }

    /// Serialize a subtree as indented markup (diagnostic output; empty
    /// elements self-close).
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, 0, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, depth: usize, out: &mut String) {
        use fmt::Write;
        let Some(node) = self.arena.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let attrs = node
            .attrs
            .iter()
            .map(|(k, v)| format!(" {}=\"{}\"", k, v))
            .collect::<String>();
        if node.children.is_empty() {
            let _ = writeln!(out, "{}<{}{}/>", indent, node.tag, attrs);
        } else {
            let _ = writeln!(out, "{}<{}{}>", indent, node.tag, attrs);
            for &child in &node.children {
                self.write_markup(child, depth + 1, out);
            }
            let _ = writeln!(out, "{}</{}>", indent, node.tag);
        }
    }
}

pub struct RenderIterator<'a> {
    tree: &'a RenderTree,
    stack: Vec<NodeId>,
}

impl<'a> RenderIterator<'a> {
    fn new(tree: &'a RenderTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root() {
            stack.push(root);
        }
        Self { tree, stack }
    }
}

impl<'a> Iterator for RenderIterator<'a> {
    type Item = (NodeId, &'a RenderNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let node = self.tree.get(current)?;
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current, node))
    }
}
