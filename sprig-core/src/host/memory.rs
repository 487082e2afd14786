//! In-memory host.
//!
//! Keeps a plain node tree and records every primitive call so that tests
//! can assert on exactly what the diff engine asked for.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::trace;

use super::{is_on, Host, HostNode};
use crate::value::{Handler, Value};

/// One recorded host primitive call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    CreateElement {
        node: HostNode,
        tag: String,
    },
    CreateText {
        node: HostNode,
        text: String,
    },
    PatchProp {
        node: HostNode,
        key: String,
        prev: Option<String>,
        next: Option<String>,
    },
    Insert {
        node: HostNode,
        parent: HostNode,
        anchor: Option<HostNode>,
    },
    Remove {
        node: HostNode,
    },
    SetElementText {
        node: HostNode,
        text: String,
    },
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        listeners: IndexMap<String, Handler>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<HostNode>,
    children: Vec<HostNode>,
}

/// A [`Host`] backed by an in-memory tree.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: HashMap<HostNode, NodeData>,
    next_id: u64,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind) -> HostNode {
        let node = HostNode::from(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            node,
            NodeData {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        node
    }

    fn element(tag: &str) -> NodeKind {
        NodeKind::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
            listeners: IndexMap::new(),
        }
    }

    /// Create a detached container to mount into. Not recorded as an op.
    pub fn create_root(&mut self) -> HostNode {
        self.alloc(Self::element("root"))
    }

    /// Every primitive call so far, in order.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// The op log as a JSON array.
    pub fn ops_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.ops)
    }

    /// Number of live nodes, including detached roots.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: HostNode) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: HostNode, name: &str) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    /// The listener bound for `event` (`"click"` for `onClick`).
    pub fn listener(&self, node: HostNode, event: &str) -> Option<Handler> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { listeners, .. } => listeners.get(event).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: HostNode) -> String {
        let mut out = String::new();
        self.write_text(node, &mut out);
        out
    }

    fn write_text(&self, node: HostNode, out: &mut String) {
        let Some(data) = self.nodes.get(&node) else {
            return;
        };
        if let NodeKind::Text(text) = &data.kind {
            out.push_str(text);
        }
        for child in &data.children {
            self.write_text(*child, out);
        }
    }

    /// Markup for the children of `node`.
    pub fn inner_html(&self, node: HostNode) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: HostNode, out: &mut String) {
        let Some(data) = self.nodes.get(&node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, attrs, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {name}=\"{value}\""));
                }
                out.push('>');
                for child in &data.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn detach(&mut self, node: HostNode) {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|data| data.parent.take()) else {
            return;
        };
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.children.retain(|child| *child != node);
        }
    }

    /// Forget `node` and its descendants. Handles to them become dangling.
    fn release(&mut self, node: HostNode) {
        let mut pending = vec![node];
        while let Some(node) = pending.pop() {
            if let Some(data) = self.nodes.remove(&node) {
                pending.extend(data.children);
            }
        }
    }
}

fn event_name(key: &str) -> String {
    key[2..].to_ascii_lowercase()
}

fn describe(value: Option<&Value>) -> Option<String> {
    value.map(ToString::to_string)
}

impl Host for MemoryHost {
    fn create_element(&mut self, tag: &str) -> HostNode {
        let node = self.alloc(Self::element(tag));
        trace!(target: "sprig::host", %node, tag, "create element");
        self.ops.push(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text(&mut self, text: &str) -> HostNode {
        let node = self.alloc(NodeKind::Text(text.to_string()));
        trace!(target: "sprig::host", %node, "create text");
        self.ops.push(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn patch_prop(&mut self, el: HostNode, key: &str, prev: Option<&Value>, next: Option<&Value>) {
        self.ops.push(HostOp::PatchProp {
            node: el,
            key: key.to_string(),
            prev: describe(prev),
            next: describe(next),
        });

        let Some(NodeData {
            kind: NodeKind::Element { attrs, listeners, .. },
            ..
        }) = self.nodes.get_mut(&el)
        else {
            return;
        };

        if is_on(key) {
            let event = event_name(key);
            match next.and_then(Value::as_handler) {
                Some(handler) => {
                    listeners.insert(event, handler.clone());
                }
                None => {
                    listeners.shift_remove(&event);
                }
            }
            return;
        }

        match next {
            None | Some(Value::Null) => {
                attrs.shift_remove(key);
            }
            Some(value) => {
                attrs.insert(key.to_string(), value.to_string());
            }
        }
    }

    fn insert(&mut self, child: HostNode, parent: HostNode, anchor: Option<HostNode>) {
        trace!(target: "sprig::host", %child, %parent, ?anchor, "insert");
        self.ops.push(HostOp::Insert {
            node: child,
            parent,
            anchor,
        });

        self.detach(child);
        let Some(data) = self.nodes.get_mut(&parent) else {
            return;
        };
        let position = anchor
            .and_then(|anchor| data.children.iter().position(|c| *c == anchor))
            .unwrap_or(data.children.len());
        data.children.insert(position, child);

        if let Some(data) = self.nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
    }

    fn remove(&mut self, child: HostNode) {
        trace!(target: "sprig::host", %child, "remove");
        self.ops.push(HostOp::Remove { node: child });
        self.detach(child);
        self.release(child);
    }

    fn set_element_text(&mut self, el: HostNode, text: &str) {
        self.ops.push(HostOp::SetElementText {
            node: el,
            text: text.to_string(),
        });

        let is_text = match self.nodes.get_mut(&el) {
            Some(NodeData {
                kind: NodeKind::Text(content),
                ..
            }) => {
                *content = text.to_string();
                true
            }
            Some(_) => false,
            None => return,
        };
        if is_text {
            return;
        }

        for child in self.children(el) {
            self.detach(child);
            self.release(child);
        }
        if !text.is_empty() {
            let node = self.alloc(NodeKind::Text(text.to_string()));
            if let Some(data) = self.nodes.get_mut(&node) {
                data.parent = Some(el);
            }
            if let Some(data) = self.nodes.get_mut(&el) {
                data.children.push(node);
            }
        }
    }

    fn parent_node(&self, node: HostNode) -> Option<HostNode> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let parent = self.parent_node(node)?;
        let siblings = &self.nodes.get(&parent)?.children;
        let position = siblings.iter().position(|child| *child == node)?;
        siblings.get(position + 1).copied()
    }
}
