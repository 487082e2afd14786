//! Virtual Nodes
//!
//! A [`VNode`] describes one node of the UI tree for a single render. It is
//! created fresh on every render; patching carries the host handle and the
//! component handle of the previous tree forward into the matching new
//! nodes.
//!
//! The node type is a closed set decided at construction ([`VNodeType`]),
//! and [`ShapeFlags`] caches the classification the diff engine branches
//! on.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::component::{ComponentId, ComponentOptions};
use crate::host::HostNode;
use crate::value::Value;

bitflags! {
    /// Classification bits for a vnode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeFlags: u8 {
        const ELEMENT = 1;
        const STATEFUL_COMPONENT = 1 << 1;
        const TEXT_CHILDREN = 1 << 2;
        const ARRAY_CHILDREN = 1 << 3;
        const SLOT_CHILDREN = 1 << 4;
    }
}

/// What a vnode renders to.
#[derive(Clone)]
pub enum VNodeType {
    /// A host element with the given tag.
    Element(Rc<str>),
    /// Renders only its children; owns no host node.
    Fragment,
    /// A raw host text node.
    Text,
    Component(Rc<ComponentOptions>),
}

impl VNodeType {
    /// Type identity: tags by value, components by options identity.
    pub fn same(&self, other: &VNodeType) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Fragment, VNodeType::Fragment) => true,
            (VNodeType::Text, VNodeType::Text) => true,
            (VNodeType::Component(a), VNodeType::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "Element({tag})"),
            VNodeType::Fragment => f.write_str("Fragment"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Component(options) => write!(f, "Component({})", options.name()),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<Rc<ComponentOptions>> for VNodeType {
    fn from(options: Rc<ComponentOptions>) -> Self {
        VNodeType::Component(options)
    }
}

impl From<&Rc<ComponentOptions>> for VNodeType {
    fn from(options: &Rc<ComponentOptions>) -> Self {
        VNodeType::Component(Rc::clone(options))
    }
}

/// Attribute and event props, in insertion order.
pub type Props = IndexMap<String, Value>;

/// Build a [`Props`] map from pairs.
pub fn props<I, K, V>(entries: I) -> Props
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A slot renderer: slot props in, child nodes out.
pub type SlotFn = Rc<dyn Fn(&Props) -> Vec<VNode>>;

/// Named slot functions passed to a component as its children.
#[derive(Clone, Default)]
pub struct Slots(IndexMap<String, SlotFn>);

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot, replacing any slot of the same name.
    pub fn with<F>(mut self, name: impl Into<String>, slot: F) -> Self
    where
        F: Fn(&Props) -> Vec<VNode> + 'static,
    {
        self.0.insert(name.into(), Rc::new(slot));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SlotFn> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Children of a vnode.
#[derive(Debug, Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(Rc<str>),
    Nodes(Vec<VNode>),
    /// Slot map, meaningful for component vnodes only.
    Slots(Slots),
}

impl Children {
    pub fn as_nodes(&self) -> &[VNode] {
        match self {
            Children::Nodes(nodes) => nodes,
            _ => &[],
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<Vec<VNode>> for Children {
    fn from(nodes: Vec<VNode>) -> Self {
        Children::Nodes(nodes)
    }
}

impl From<VNode> for Children {
    fn from(node: VNode) -> Self {
        Children::Nodes(vec![node])
    }
}

impl From<Slots> for Children {
    fn from(slots: Slots) -> Self {
        Children::Slots(slots)
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

/// The reconciliation key taken from the `key` prop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VNodeKey {
    Int(i64),
    Str(Rc<str>),
}

impl VNodeKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(VNodeKey::Int(*i)),
            Value::Str(s) => Some(VNodeKey::Str(Rc::clone(s))),
            _ => None,
        }
    }
}

/// One node of a rendered tree.
#[derive(Debug, Clone)]
pub struct VNode {
    pub node_type: VNodeType,
    pub props: Option<Props>,
    pub children: Children,
    pub shape_flag: ShapeFlags,
    pub key: Option<VNodeKey>,
    /// Host handle, filled in at mount.
    pub el: Option<HostNode>,
    /// Mounted instance, for component vnodes.
    pub component: Option<ComponentId>,
}

impl VNode {
    pub fn new(node_type: VNodeType, props: Option<Props>, children: Children) -> Self {
        let mut shape_flag = match &node_type {
            VNodeType::Element(_) => ShapeFlags::ELEMENT,
            VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            VNodeType::Fragment | VNodeType::Text => ShapeFlags::empty(),
        };

        match &children {
            Children::Text(_) => shape_flag |= ShapeFlags::TEXT_CHILDREN,
            Children::Nodes(_) => shape_flag |= ShapeFlags::ARRAY_CHILDREN,
            Children::Slots(_) if shape_flag.contains(ShapeFlags::STATEFUL_COMPONENT) => {
                shape_flag |= ShapeFlags::SLOT_CHILDREN
            }
            _ => {}
        }

        let key = props
            .as_ref()
            .and_then(|props| props.get("key"))
            .and_then(VNodeKey::from_value);

        Self {
            node_type,
            props,
            children,
            shape_flag,
            key,
            el: None,
            component: None,
        }
    }

    /// Whether `other` can be patched in place of `self`: same type and key.
    pub fn same_vnode_type(&self, other: &VNode) -> bool {
        self.node_type.same(&other.node_type) && self.key == other.key
    }

    pub fn is_element(&self) -> bool {
        self.shape_flag.contains(ShapeFlags::ELEMENT)
    }

    pub fn is_component(&self) -> bool {
        self.shape_flag.contains(ShapeFlags::STATEFUL_COMPONENT)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.as_ref().and_then(|props| props.get(key))
    }
}

/// Create a vnode.
///
/// ```rust,ignore
/// let list = h("ul", props([("class", "items")]), vec![
///     h("li", props([("key", 1)]), "one"),
///     h("li", props([("key", 2)]), "two"),
/// ]);
/// ```
pub fn h(
    node_type: impl Into<VNodeType>,
    props: impl Into<Option<Props>>,
    children: impl Into<Children>,
) -> VNode {
    VNode::new(node_type.into(), props.into(), children.into())
}

/// Create a text vnode.
pub fn text(content: impl Into<String>) -> VNode {
    VNode::new(VNodeType::Text, None, Children::from(content.into()))
}

pub fn fragment(children: Vec<VNode>) -> VNode {
    VNode::new(VNodeType::Fragment, None, Children::Nodes(children))
}

/// Render the slot `name` into a fragment. A missing slot renders an empty
/// fragment.
pub fn render_slot(slots: &Slots, name: &str, slot_props: &Props) -> VNode {
    let children = slots.get(name).map(|slot| slot(slot_props)).unwrap_or_default();
    fragment(children)
}
