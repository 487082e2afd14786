//! Sprig Core
//!
//! This crate provides the core runtime for the Sprig reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (tracked wrappers, refs, computed values, effects)
//! - A job scheduler that batches render updates into one flush
//! - A virtual node model and the diff/patch engine that reconciles it
//!   against a pluggable host
//! - Component instances whose render functions are bound to effects
//!
//! Everything runs on one thread. Reactive state lives in thread-local
//! storage, so values created on one thread must stay on it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `value`: the dynamic values that flow through wrappers, refs and props
//! - `reactive`: dependency tracking, effects, wrappers, refs and computed
//! - `scheduler`: the deduplicating job queue and microtask flush
//! - `vnode`: the virtual node model
//! - `host`: the host primitive contract and an in-memory host
//! - `renderer`: patching, keyed children reconciliation
//! - `component`: component options, instances, emit, provide/inject
//! - `app`: the root mounting entry point
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use sprig_core::prelude::*;
//!
//! let counter = Rc::new(
//!     ComponentOptions::new(|ctx| h("p", None, format!("count:{}", ctx.get("count"))))
//!         .with_setup(|_props, _ctx| {
//!             Some(Object::from_entries([("count", Value::from(Ref::new(0)))]))
//!         }),
//! );
//!
//! let mut host = MemoryHost::new();
//! let root = host.create_root();
//! let renderer = Renderer::new(host);
//! create_app(counter).mount(&renderer, root);
//! ```

pub mod app;
pub mod component;
pub mod error;
pub mod host;
pub mod reactive;
pub mod renderer;
pub mod scheduler;
pub mod value;
pub mod vnode;

pub use error::ReactiveError;

/// Commonly used items, re-exported for glob import.
pub mod prelude {
    pub use crate::app::{create_app, App};
    pub use crate::component::{
        current_instance, inject, inject_or, provide, ComponentId, ComponentInstance, ComponentOptions,
        RenderContext, SetupContext,
    };
    pub use crate::host::{Host, HostNode, HostOp, MemoryHost};
    pub use crate::reactive::{
        effect, effect_with, is_proxy, is_reactive, is_readonly, is_ref, reactive, readonly,
        shallow_readonly, stop, to_raw, unref, Computed, Effect, EffectOptions, Reactive, Ref,
        WrapMode,
    };
    pub use crate::renderer::Renderer;
    pub use crate::scheduler::{next_tick, queue_job, run_microtasks, Job};
    pub use crate::value::{Handler, Key, Object, Value};
    pub use crate::vnode::{
        fragment, h, props, render_slot, text, Children, Props, ShapeFlags, Slots, VNode,
        VNodeKey, VNodeType,
    };
}
