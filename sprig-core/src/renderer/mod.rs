//! Renderer
//!
//! The renderer reconciles vnode trees against a [`Host`]. `patch` compares
//! a previous node with a new one and calls host primitives only for what
//! changed; the new tree inherits host handles and component handles from
//! the old one.
//!
//! # Dispatch
//!
//! | next node  | no previous node            | previous node of same type |
//! |------------|-----------------------------|----------------------------|
//! | fragment   | insert end anchor, mount    | patch children             |
//! | text       | create and insert text node | reuse node, set text       |
//! | element    | create, fill, insert        | patch children and props   |
//! | component  | create instance, render     | update if props changed    |
//!
//! A previous node of a different type or key is unmounted and the new node
//! is mounted in its place.
//!
//! A fragment owns one host node of its own: an empty text node marking
//! its end, kept in `el`. Its children are always inserted before it, so a
//! fragment keeps its place among its siblings even while it is empty.

mod keyed;

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::component::{ComponentId, ComponentInstance};
use crate::host::{Host, HostNode, MemoryHost};
use crate::reactive::{Effect, EffectOptions, WeakEffect};
use crate::scheduler::{invalidate_job, queue_job, Job};
use crate::value::Value;
use crate::vnode::{Children, Props, VNode, VNodeType};

pub use keyed::longest_increasing_subsequence;

pub(crate) struct RendererInner<H> {
    host: RefCell<H>,
    instances: RefCell<Vec<Option<Rc<ComponentInstance>>>>,
    roots: RefCell<HashMap<HostNode, VNode>>,
}

/// Reconciles vnode trees into a host.
///
/// Cloning a renderer yields another handle to the same host and instance
/// arena.
pub struct Renderer<H: Host + 'static> {
    inner: Rc<RendererInner<H>>,
}

impl<H: Host + 'static> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: Host + 'static> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Rc::new(RendererInner {
                host: RefCell::new(host),
                instances: RefCell::new(Vec::new()),
                roots: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Render `vnode` into `container`, patching against whatever was
    /// rendered there before.
    pub fn render(&self, mut vnode: VNode, container: HostNode) {
        let prev = self.inner.roots.borrow_mut().remove(&container);
        self.inner
            .patch(prev.as_ref(), &mut vnode, container, None, None);
        self.inner.roots.borrow_mut().insert(container, vnode);
    }

    /// Unmount whatever was rendered into `container`.
    pub fn unmount(&self, container: HostNode) {
        let prev = self.inner.roots.borrow_mut().remove(&container);
        if let Some(prev) = prev {
            self.inner.unmount(&prev, true);
        }
    }

    /// Patch two trees directly, without retaining anything.
    pub fn patch(
        &self,
        prev: Option<&VNode>,
        next: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        self.inner.patch(prev, next, container, None, anchor);
    }

    /// The tree last rendered into `container`.
    pub fn root(&self, container: HostNode) -> Option<VNode> {
        self.inner.roots.borrow().get(&container).cloned()
    }

    pub fn host(&self) -> Ref<'_, H> {
        self.inner.host.borrow()
    }

    pub fn host_mut(&self) -> RefMut<'_, H> {
        self.inner.host.borrow_mut()
    }

    pub fn instance(&self, id: ComponentId) -> Option<Rc<ComponentInstance>> {
        self.inner.instance(id)
    }

    /// Number of live component instances.
    pub fn instance_count(&self) -> usize {
        self.inner
            .instances
            .borrow()
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

impl Renderer<MemoryHost> {
    /// Call the listener bound to `event` on `node`. Returns whether one
    /// was bound.
    pub fn dispatch(&self, node: HostNode, event: &str, args: &[Value]) -> bool {
        let handler = self.inner.host.borrow().listener(node, event);
        match handler {
            Some(handler) => {
                handler.call(args);
                true
            }
            None => false,
        }
    }
}

impl<H: Host + 'static> RendererInner<H> {
    fn host(&self) -> RefMut<'_, H> {
        self.host.borrow_mut()
    }

    fn instance(&self, id: ComponentId) -> Option<Rc<ComponentInstance>> {
        self.instances.borrow().get(id.0).cloned().flatten()
    }

    pub(crate) fn patch(
        self: &Rc<Self>,
        prev: Option<&VNode>,
        next: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        let (prev, anchor) = match prev {
            Some(old) if !old.same_vnode_type(next) => {
                let anchor = self.next_host_node(old).or(anchor);
                self.unmount(old, true);
                (None, anchor)
            }
            other => (other, anchor),
        };

        match next.node_type.clone() {
            VNodeType::Fragment => self.process_fragment(prev, next, container, parent, anchor),
            VNodeType::Text => self.process_text(prev, next, container, anchor),
            VNodeType::Element(tag) => match prev {
                Some(old) => self.patch_element(old, next, parent),
                None => self.mount_element(&tag, next, container, parent, anchor),
            },
            VNodeType::Component(_) => match prev {
                Some(old) => self.update_component(old, next, container, parent, anchor),
                None => self.mount_component(next, container, parent, anchor),
            },
        }
    }

    fn process_fragment(
        self: &Rc<Self>,
        prev: Option<&VNode>,
        next: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        match prev {
            Some(old) => {
                next.el = old.el;
                let end = old.el.or(anchor);
                self.patch_children(old, next, container, parent, end);
            }
            None => {
                let end = {
                    let mut host = self.host();
                    let end = host.create_text("");
                    host.insert(end, container, anchor);
                    end
                };
                next.el = Some(end);
                if let Children::Nodes(children) = &mut next.children {
                    self.mount_children(children, container, parent, Some(end));
                }
            }
        }
    }

    fn process_text(
        &self,
        prev: Option<&VNode>,
        next: &mut VNode,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        let content = next.children.as_text().unwrap_or_default().to_string();
        match prev.and_then(|old| old.el.map(|el| (old, el))) {
            Some((old, el)) => {
                next.el = Some(el);
                if old.children.as_text().unwrap_or_default() != content {
                    self.host().set_element_text(el, &content);
                }
            }
            None => {
                let mut host = self.host();
                let el = host.create_text(&content);
                host.insert(el, container, anchor);
                next.el = Some(el);
            }
        }
    }

    fn mount_element(
        self: &Rc<Self>,
        tag: &str,
        vnode: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        let el = self.host().create_element(tag);
        vnode.el = Some(el);

        match &mut vnode.children {
            Children::Text(content) => self.host().set_element_text(el, content),
            Children::Nodes(children) => self.mount_children(children, el, parent, None),
            Children::None | Children::Slots(_) => {}
        }

        if let Some(props) = &vnode.props {
            let mut host = self.host();
            for (key, value) in props {
                if key != "key" {
                    host.patch_prop(el, key, None, Some(value));
                }
            }
        }

        self.host().insert(el, container, anchor);
    }

    pub(crate) fn mount_children(
        self: &Rc<Self>,
        children: &mut [VNode],
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        for child in children {
            self.patch(None, child, container, parent, anchor);
        }
    }

    fn patch_element(self: &Rc<Self>, old: &VNode, next: &mut VNode, parent: Option<ComponentId>) {
        let Some(el) = old.el else {
            return;
        };
        next.el = Some(el);

        self.patch_children(old, next, el, parent, None);
        self.patch_props(el, old.props.as_ref(), next.props.as_ref());
    }

    fn patch_children(
        self: &Rc<Self>,
        old: &VNode,
        next: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        match (&old.children, &mut next.children) {
            (Children::Nodes(old_children), Children::Text(content)) => {
                self.unmount_children(old_children);
                self.host().set_element_text(container, content);
            }
            (Children::Text(old_content), Children::Text(content)) => {
                if **old_content != **content {
                    self.host().set_element_text(container, content);
                }
            }
            (_, Children::Text(content)) => {
                self.host().set_element_text(container, content);
            }
            (Children::Text(_), Children::Nodes(children)) => {
                self.host().set_element_text(container, "");
                self.mount_children(children, container, parent, anchor);
            }
            (Children::Nodes(old_children), Children::Nodes(children)) => {
                self.patch_keyed_children(old_children, children, container, parent, anchor);
            }
            (_, Children::Nodes(children)) => {
                self.mount_children(children, container, parent, anchor);
            }
            (Children::Nodes(old_children), _) => self.unmount_children(old_children),
            (Children::Text(_), _) => self.host().set_element_text(container, ""),
            _ => {}
        }
    }

    fn patch_props(&self, el: HostNode, old: Option<&Props>, next: Option<&Props>) {
        let mut host = self.host();

        if let Some(next) = next {
            for (key, value) in next {
                if key == "key" {
                    continue;
                }
                let prev = old.and_then(|old| old.get(key));
                if prev != Some(value) {
                    host.patch_prop(el, key, prev, Some(value));
                }
            }
        }

        if let Some(old) = old {
            for (key, value) in old {
                if key != "key" && !next.is_some_and(|next| next.contains_key(key)) {
                    host.patch_prop(el, key, Some(value), None);
                }
            }
        }
    }

    fn mount_component(
        self: &Rc<Self>,
        vnode: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        let VNodeType::Component(options) = &vnode.node_type else {
            return;
        };

        let id = {
            let mut instances = self.instances.borrow_mut();
            instances.push(None);
            ComponentId(instances.len() - 1)
        };
        vnode.component = Some(id);

        let parent_instance = parent.and_then(|parent| self.instance(parent));
        let instance = Rc::new(ComponentInstance::new(
            id,
            Rc::clone(options),
            vnode,
            parent_instance.as_ref(),
        ));
        if let Some(slot) = self.instances.borrow_mut().get_mut(id.0) {
            *slot = Some(Rc::clone(&instance));
        }

        debug!(target: "sprig::renderer", component = instance.name(), id = id.0, "mount component");

        instance.setup();
        self.setup_render_effect(&instance, container, anchor);

        vnode.el = instance.el();
    }

    /// Bind the instance's render to an effect whose reruns go through the
    /// job queue, then run it once to mount the subtree.
    fn setup_render_effect(
        self: &Rc<Self>,
        instance: &Rc<ComponentInstance>,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        let handle: Rc<RefCell<Option<WeakEffect>>> = Rc::new(RefCell::new(None));

        let job = {
            let handle = Rc::clone(&handle);
            let name = instance.name().to_string();
            Job::new(move || {
                let effect = handle.borrow().as_ref().and_then(WeakEffect::upgrade);
                match effect {
                    Some(effect) if effect.is_active() => {
                        effect.run();
                    }
                    _ => debug!(
                        target: "sprig::renderer",
                        component = %name,
                        "skipping render job of stopped component"
                    ),
                }
            })
        };

        let renderer: Weak<Self> = Rc::downgrade(self);
        let target = Rc::downgrade(instance);
        let queued = job.clone();
        let effect = Effect::with_options(
            move || {
                if let (Some(renderer), Some(instance)) = (renderer.upgrade(), target.upgrade()) {
                    renderer.render_component(&instance, container, anchor);
                }
            },
            EffectOptions::new().lazy().scheduler(move || queue_job(&queued)),
        );

        *handle.borrow_mut() = Some(effect.downgrade());
        *instance.job.borrow_mut() = Some(job);
        *instance.update.borrow_mut() = Some(effect.clone());

        effect.run();
    }

    fn render_component(
        self: &Rc<Self>,
        instance: &Rc<ComponentInstance>,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        let id = instance.id();

        if !instance.is_mounted() {
            let mut sub_tree = instance.render();
            self.patch(None, &mut sub_tree, container, Some(id), anchor);

            instance.vnode.borrow_mut().el = self.first_host_node(&sub_tree);
            *instance.sub_tree.borrow_mut() = Some(sub_tree);
            instance.mounted.set(true);
            return;
        }

        let staged = instance.next.borrow_mut().take();
        if let Some(next) = staged {
            instance.update_pre_render(next);
        }

        let mut sub_tree = instance.render();
        let prev = instance.sub_tree.borrow_mut().take();

        let (container, anchor) = match prev.as_ref().and_then(|prev| self.last_host_node(prev)) {
            Some(last) => {
                let host = self.host.borrow();
                (
                    host.parent_node(last).unwrap_or(container),
                    host.next_sibling(last),
                )
            }
            None => (container, None),
        };

        self.patch(prev.as_ref(), &mut sub_tree, container, Some(id), anchor);

        instance.vnode.borrow_mut().el = self.first_host_node(&sub_tree);
        *instance.sub_tree.borrow_mut() = Some(sub_tree);
    }

    fn update_component(
        self: &Rc<Self>,
        old: &VNode,
        next: &mut VNode,
        container: HostNode,
        parent: Option<ComponentId>,
        anchor: Option<HostNode>,
    ) {
        let Some(instance) = old.component.and_then(|id| self.instance(id)) else {
            self.mount_component(next, container, parent, anchor);
            return;
        };
        next.component = Some(instance.id());

        if should_update_component(old, next) {
            debug!(target: "sprig::renderer", component = instance.name(), "props changed, updating");

            if let Some(job) = instance.job.borrow().as_ref() {
                invalidate_job(job);
            }
            *instance.next.borrow_mut() = Some(next.clone());
            instance.update();
            next.el = instance.el();
        } else {
            next.el = old.el;
            *instance.vnode.borrow_mut() = next.clone();
        }
    }

    fn unmount_children(&self, children: &[VNode]) {
        for child in children {
            self.unmount(child, true);
        }
    }

    /// Tear down `vnode`. Host nodes are removed only at the top of the
    /// torn-down subtree; component render effects are stopped throughout.
    pub(crate) fn unmount(&self, vnode: &VNode, remove: bool) {
        match &vnode.node_type {
            VNodeType::Component(_) => {
                if let Some(id) = vnode.component {
                    self.unmount_component(id, remove);
                }
            }
            VNodeType::Fragment => {
                for child in vnode.children.as_nodes() {
                    self.unmount(child, remove);
                }
                if let (true, Some(end)) = (remove, vnode.el) {
                    self.host().remove(end);
                }
            }
            VNodeType::Element(_) => {
                for child in vnode.children.as_nodes() {
                    self.unmount(child, false);
                }
                if let (true, Some(el)) = (remove, vnode.el) {
                    self.host().remove(el);
                }
            }
            VNodeType::Text => {
                if let (true, Some(el)) = (remove, vnode.el) {
                    self.host().remove(el);
                }
            }
        }
    }

    fn unmount_component(&self, id: ComponentId, remove: bool) {
        let instance = self
            .instances
            .borrow_mut()
            .get_mut(id.0)
            .and_then(Option::take);
        let Some(instance) = instance else {
            return;
        };

        debug!(target: "sprig::renderer", component = instance.name(), id = id.0, "unmount component");

        let effect = instance.update.borrow().clone();
        if let Some(effect) = effect {
            effect.stop();
        }
        if let Some(job) = instance.job.borrow_mut().take() {
            invalidate_job(&job);
        }

        let sub_tree = instance.sub_tree.borrow_mut().take();
        if let Some(sub_tree) = sub_tree {
            self.unmount(&sub_tree, remove);
        }
        instance.mounted.set(false);
    }

    /// Move the host nodes of `vnode` before `anchor`.
    pub(crate) fn move_node(&self, vnode: &VNode, container: HostNode, anchor: Option<HostNode>) {
        match &vnode.node_type {
            VNodeType::Component(_) => {
                let instance = vnode.component.and_then(|id| self.instance(id));
                if let Some(instance) = instance {
                    let sub_tree = instance.sub_tree.borrow();
                    if let Some(sub_tree) = sub_tree.as_ref() {
                        self.move_node(sub_tree, container, anchor);
                    }
                }
            }
            VNodeType::Fragment => {
                for child in vnode.children.as_nodes() {
                    self.move_node(child, container, anchor);
                }
                if let Some(end) = vnode.el {
                    self.host().insert(end, container, anchor);
                }
            }
            VNodeType::Element(_) | VNodeType::Text => {
                if let Some(el) = vnode.el {
                    self.host().insert(el, container, anchor);
                }
            }
        }
    }

    /// First host node rendered by `vnode`, descending into components
    /// and fragments.
    pub(crate) fn first_host_node(&self, vnode: &VNode) -> Option<HostNode> {
        match &vnode.node_type {
            VNodeType::Component(_) => {
                let instance = vnode.component.and_then(|id| self.instance(id))?;
                let sub_tree = instance.sub_tree.borrow();
                sub_tree.as_ref().and_then(|tree| self.first_host_node(tree))
            }
            VNodeType::Fragment => vnode
                .children
                .as_nodes()
                .iter()
                .find_map(|child| self.first_host_node(child))
                .or(vnode.el),
            VNodeType::Element(_) | VNodeType::Text => vnode.el,
        }
    }

    fn last_host_node(&self, vnode: &VNode) -> Option<HostNode> {
        match &vnode.node_type {
            VNodeType::Component(_) => {
                let instance = vnode.component.and_then(|id| self.instance(id))?;
                let sub_tree = instance.sub_tree.borrow();
                sub_tree.as_ref().and_then(|tree| self.last_host_node(tree))
            }
            VNodeType::Fragment => vnode.el.or_else(|| {
                vnode
                    .children
                    .as_nodes()
                    .iter()
                    .rev()
                    .find_map(|child| self.last_host_node(child))
            }),
            VNodeType::Element(_) | VNodeType::Text => vnode.el,
        }
    }

    /// The host node following everything `vnode` rendered.
    fn next_host_node(&self, vnode: &VNode) -> Option<HostNode> {
        let last = self.last_host_node(vnode)?;
        self.host.borrow().next_sibling(last)
    }
}

/// Shallow inequality over the new vnode's own prop keys.
fn should_update_component(prev: &VNode, next: &VNode) -> bool {
    let Some(next_props) = next.props.as_ref() else {
        return false;
    };
    next_props
        .iter()
        .any(|(key, value)| prev.prop(key) != Some(value))
}
