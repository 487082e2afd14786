//! Host Primitives
//!
//! The diff engine never touches a platform directly. It calls the handful
//! of primitives in [`Host`], and only for actual deltas.
//!
//! [`MemoryHost`] is a complete in-memory implementation that keeps a node
//! tree and a log of every primitive call.

mod memory;

use std::fmt;

use serde::Serialize;

use crate::value::Value;

pub use memory::{HostOp, MemoryHost};

/// Opaque handle to a node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HostNode(u64);

impl HostNode {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for HostNode {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform primitives consumed by the renderer.
pub trait Host {
    fn create_element(&mut self, tag: &str) -> HostNode;

    fn create_text(&mut self, text: &str) -> HostNode;

    /// Apply a prop change.
    ///
    /// Keys of the form `on` + capitalized event name are listeners; all
    /// other keys are attributes. `next == None` means the prop was removed.
    fn patch_prop(&mut self, el: HostNode, key: &str, prev: Option<&Value>, next: Option<&Value>);

    /// Insert `child` into `parent` before `anchor`, or at the end. Moves the
    /// child if it is already attached somewhere.
    fn insert(&mut self, child: HostNode, parent: HostNode, anchor: Option<HostNode>);

    fn remove(&mut self, child: HostNode);

    fn set_element_text(&mut self, el: HostNode, text: &str);

    fn parent_node(&self, node: HostNode) -> Option<HostNode>;

    fn next_sibling(&self, node: HostNode) -> Option<HostNode>;
}

/// Whether `key` names an event listener (`onClick`, `onUpdate`, ...).
pub fn is_on(key: &str) -> bool {
    key.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}
