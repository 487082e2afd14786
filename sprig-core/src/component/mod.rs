//! Components
//!
//! A component is a render function plus an optional setup function. Each
//! mounted component vnode owns one [`ComponentInstance`], which the
//! renderer keeps in an arena and addresses by [`ComponentId`].
//!
//! # Lifecycle
//!
//! 1. Mount: props and slots are resolved from the vnode, `setup` runs once
//!    with read-only props, and the render function is bound to an effect.
//! 2. Update: state read during render schedules the render effect through
//!    the job queue; a parent passing changed props reruns it directly.
//! 3. Unmount: the render effect is stopped and the instance leaves the
//!    arena.

mod context;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::host::HostNode;
use crate::reactive::{reactive, shallow_readonly, untracked, Effect, Reactive};
use crate::scheduler::Job;
use crate::value::{Key, Object, Value};
use crate::vnode::{Children, ShapeFlags, Slots, VNode};

pub use context::{
    current_instance, inject, inject_or, provide, to_handler_key, RenderContext, SetupContext,
};

use context::CurrentInstance;

/// Handle to a mounted component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    pub fn index(&self) -> usize {
        self.0
    }
}

pub type SetupFn = Rc<dyn Fn(&Reactive, &SetupContext) -> Option<Object>>;
pub type RenderFn = Rc<dyn Fn(&RenderContext<'_>) -> VNode>;

/// Static description of a component.
#[derive(Clone)]
pub struct ComponentOptions {
    name: Option<String>,
    setup: Option<SetupFn>,
    render: RenderFn,
}

impl ComponentOptions {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&RenderContext<'_>) -> VNode + 'static,
    {
        Self {
            name: None,
            setup: None,
            render: Rc::new(render),
        }
    }

    /// Set the setup function. It receives read-only props and returns the
    /// state the render function reads by name.
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&Reactive, &SetupContext) -> Option<Object> + 'static,
    {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("name", &self.name())
            .field("setup", &self.setup.is_some())
            .finish()
    }
}

/// A mounted component.
pub struct ComponentInstance {
    id: ComponentId,
    options: Rc<ComponentOptions>,
    parent: Option<Weak<ComponentInstance>>,
    pub(crate) vnode: RefCell<VNode>,
    /// Replacement vnode staged by a parent update.
    pub(crate) next: RefCell<Option<VNode>>,
    props: Object,
    slots: RefCell<Slots>,
    setup_state: Object,
    provides: RefCell<IndexMap<String, Value>>,
    pub(crate) mounted: Cell<bool>,
    pub(crate) sub_tree: RefCell<Option<VNode>>,
    pub(crate) update: RefCell<Option<Effect>>,
    pub(crate) job: RefCell<Option<Job>>,
}

fn resolve_props(vnode: &VNode) -> impl Iterator<Item = (&str, Value)> {
    vnode
        .props
        .iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != "key")
        .map(|(key, value)| (key.as_str(), value.clone()))
}

fn resolve_slots(vnode: &VNode) -> Slots {
    match &vnode.children {
        Children::Slots(slots) if vnode.shape_flag.contains(ShapeFlags::SLOT_CHILDREN) => {
            slots.clone()
        }
        Children::Nodes(nodes) => {
            let nodes = nodes.clone();
            Slots::new().with("default", move |_| nodes.clone())
        }
        _ => Slots::new(),
    }
}

impl ComponentInstance {
    pub(crate) fn new(
        id: ComponentId,
        options: Rc<ComponentOptions>,
        vnode: &VNode,
        parent: Option<&Rc<ComponentInstance>>,
    ) -> Self {
        Self {
            id,
            options,
            parent: parent.map(Rc::downgrade),
            vnode: RefCell::new(vnode.clone()),
            next: RefCell::new(None),
            props: Object::from_entries(resolve_props(vnode)),
            slots: RefCell::new(resolve_slots(vnode)),
            setup_state: Object::new(),
            provides: RefCell::new(IndexMap::new()),
            mounted: Cell::new(false),
            sub_tree: RefCell::new(None),
            update: RefCell::new(None),
            job: RefCell::new(None),
        }
    }

    /// Run the setup function, if any, with this instance as current.
    pub(crate) fn setup(self: &Rc<Self>) {
        let Some(setup) = self.options.setup.clone() else {
            return;
        };

        let props = shallow_readonly(self.props.clone());
        let ctx = SetupContext::new(self);
        let state = {
            let _current = CurrentInstance::enter(Rc::clone(self));
            untracked(|| setup(&props, &ctx))
        };

        if let Some(state) = state {
            for key in state.keys() {
                if let Some(value) = state.get(&key) {
                    self.setup_state.insert(key, value);
                }
            }
        }
    }

    /// Call the render function.
    pub(crate) fn render(&self) -> VNode {
        let ctx = RenderContext::new(self);
        (self.options.render)(&ctx)
    }

    /// Apply a vnode staged by a parent update: props and slots are
    /// replaced in place so that closures holding them see the new values.
    pub(crate) fn update_pre_render(&self, next: VNode) {
        let next_props: IndexMap<&str, Value> = resolve_props(&next).collect();

        for key in self.props.keys() {
            let keep = matches!(&key, Key::Name(name) if next_props.contains_key(&**name));
            if !keep {
                self.props.remove(&key);
            }
        }
        for (key, value) in next_props {
            self.props.insert(Key::from(key), value);
        }

        *self.slots.borrow_mut() = resolve_slots(&next);
        *self.vnode.borrow_mut() = next;
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.options.name()
    }

    pub fn options(&self) -> &Rc<ComponentOptions> {
        &self.options
    }

    pub fn parent(&self) -> Option<Rc<ComponentInstance>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Read-only view of the resolved props.
    pub fn props(&self) -> Reactive {
        shallow_readonly(self.props.clone())
    }

    pub(crate) fn raw_props(&self) -> &Object {
        &self.props
    }

    pub fn slots(&self) -> Slots {
        self.slots.borrow().clone()
    }

    /// Tracked view of the state returned by setup.
    pub fn setup_state(&self) -> Reactive {
        reactive(self.setup_state.clone())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Host node of the rendered root.
    pub fn el(&self) -> Option<HostNode> {
        self.vnode.borrow().el
    }

    /// Number of times the render effect has run.
    pub fn render_count(&self) -> usize {
        self.update
            .borrow()
            .as_ref()
            .map_or(0, |effect| effect.run_count())
    }

    /// Rerun the render effect now.
    pub fn update(&self) {
        let effect = self.update.borrow().clone();
        if let Some(effect) = effect {
            effect.run();
        }
    }

    pub fn render_effect(&self) -> Option<Effect> {
        self.update.borrow().clone()
    }

    /// Whether the render effect is still reacting to changes.
    pub fn is_active(&self) -> bool {
        self.update
            .borrow()
            .as_ref()
            .is_some_and(|effect| effect.is_active())
    }

    pub(crate) fn provide(&self, key: impl Into<String>, value: Value) {
        self.provides.borrow_mut().insert(key.into(), value);
    }

    /// Look `key` up in the provides of the ancestors, nearest first.
    pub(crate) fn inject(&self, key: &str) -> Option<Value> {
        let mut cursor = self.parent();
        while let Some(instance) = cursor {
            if let Some(value) = instance.provides.borrow().get(key) {
                return Some(value.clone());
            }
            cursor = instance.parent();
        }
        None
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("mounted", &self.mounted.get())
            .finish()
    }
}
