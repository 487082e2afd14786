//! Setup and render contexts, the current-instance stack, emit, and
//! provide/inject.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::ComponentInstance;
use crate::error::ReactiveError;
use crate::host::HostNode;
use crate::reactive::{unref, Reactive};
use crate::value::{Key, Value};
use crate::vnode::{render_slot, Props, Slots, VNode};

thread_local! {
    static CURRENT_INSTANCE: RefCell<Vec<Rc<ComponentInstance>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that makes an instance current for the extent of its setup.
pub(crate) struct CurrentInstance;

impl CurrentInstance {
    pub(crate) fn enter(instance: Rc<ComponentInstance>) -> Self {
        CURRENT_INSTANCE.with(|stack| stack.borrow_mut().push(instance));
        Self
    }
}

impl Drop for CurrentInstance {
    fn drop(&mut self) {
        CURRENT_INSTANCE.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert!(popped.is_some(), "current instance stack underflow");
        });
    }
}

/// The instance whose setup is running, if any.
pub fn current_instance() -> Option<Rc<ComponentInstance>> {
    CURRENT_INSTANCE.with(|stack| stack.borrow().last().cloned())
}

/// Provide a value to descendants of the current instance.
pub fn provide(key: impl Into<String>, value: impl Into<Value>) {
    match current_instance() {
        Some(instance) => instance.provide(key, value.into()),
        None => warn!(target: "sprig::component", "provide() can only be used inside setup()"),
    }
}

/// Look up a value provided by an ancestor of the current instance.
pub fn inject(key: &str) -> Option<Value> {
    match current_instance() {
        Some(instance) => instance.inject(key),
        None => {
            warn!(target: "sprig::component", "inject() can only be used inside setup()");
            None
        }
    }
}

pub fn inject_or(key: &str, default: impl Into<Value>) -> Value {
    inject(key).unwrap_or_else(|| default.into())
}

fn camelize(event: &str) -> String {
    let mut out = String::with_capacity(event.len());
    let mut upper = false;
    for c in event.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The prop name a listener for `event` is passed under:
/// `"add-item"` becomes `"onAddItem"`.
pub fn to_handler_key(event: &str) -> String {
    format!("on{}", capitalize(&camelize(event)))
}

fn emit_from(instance: &ComponentInstance, event: &str, args: &[Value]) {
    let key = to_handler_key(event);
    match instance.raw_props().get(&Key::from(key.as_str())) {
        Some(Value::Handler(handler)) => handler.call(args),
        _ => trace!(
            target: "sprig::component",
            component = instance.name(),
            event,
            "no listener for emitted event"
        ),
    }
}

/// Passed to a component's setup function.
#[derive(Clone)]
pub struct SetupContext {
    instance: Weak<ComponentInstance>,
}

impl SetupContext {
    pub(crate) fn new(instance: &Rc<ComponentInstance>) -> Self {
        Self {
            instance: Rc::downgrade(instance),
        }
    }

    /// Invoke the parent's listener for `event`, if it passed one.
    pub fn emit(&self, event: &str, args: &[Value]) {
        if let Some(instance) = self.instance.upgrade() {
            emit_from(&instance, event, args);
        }
    }

    pub fn provide(&self, key: impl Into<String>, value: impl Into<Value>) {
        if let Some(instance) = self.instance.upgrade() {
            instance.provide(key, value.into());
        }
    }

    pub fn inject(&self, key: &str) -> Option<Value> {
        self.instance.upgrade().and_then(|instance| instance.inject(key))
    }

    pub fn inject_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.inject(key).unwrap_or_else(|| default.into())
    }

    pub fn instance(&self) -> Option<Rc<ComponentInstance>> {
        self.instance.upgrade()
    }
}

/// Passed to a component's render function.
///
/// Names resolve against setup state first (refs are read through), then
/// props. `$props` names the read-only props view.
pub struct RenderContext<'a> {
    instance: &'a ComponentInstance,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(instance: &'a ComponentInstance) -> Self {
        Self { instance }
    }

    pub fn get(&self, name: &str) -> Value {
        let state = self.instance.setup_state();
        if state.has(name) {
            return unref(&state.get(name));
        }
        if let Some(value) = self.instance.props.get(&Key::from(name)) {
            return value;
        }
        match name {
            "$props" => Value::Reactive(self.instance.props()),
            _ => Value::Null,
        }
    }

    /// Write setup state. Writing a ref-held name assigns through the ref;
    /// props cannot be written.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let key = Key::from(name);
        let value = value.into();

        match self.instance.setup_state.get(&key) {
            Some(Value::Ref(cell)) if !matches!(value, Value::Ref(_)) => cell.set(value),
            Some(_) => self.instance.setup_state().set(name, value),
            None if self.instance.props.contains_key(&key) => {
                warn!(target: "sprig::component", "{}", ReactiveError::ReadonlyWrite { key });
            }
            None => self.instance.setup_state().set(name, value),
        }
    }

    pub fn props(&self) -> Reactive {
        self.instance.props()
    }

    pub fn slots(&self) -> Slots {
        self.instance.slots()
    }

    /// Host node of the previous render's root.
    pub fn el(&self) -> Option<HostNode> {
        self.instance.el()
    }

    pub fn render_slot(&self, name: &str, slot_props: &Props) -> VNode {
        render_slot(&self.instance.slots(), name, slot_props)
    }

    pub fn emit(&self, event: &str, args: &[Value]) {
        emit_from(self.instance, event, args);
    }

    pub fn instance(&self) -> &ComponentInstance {
        self.instance
    }
}
