//! Integration Tests for Components
//!
//! These tests mount components through the in-memory host and verify that
//! state changes re-render through the job queue.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sprig_core::prelude::*;

fn setup() -> (Renderer<MemoryHost>, HostNode) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let mut host = MemoryHost::new();
    let root = host.create_root();
    (Renderer::new(host), root)
}

fn state_ref(instance: &ComponentInstance, name: &str) -> Ref {
    match instance.setup_state().get(name) {
        Value::Ref(cell) => cell,
        other => panic!("`{name}` is not a ref: {other:?}"),
    }
}

fn counter_component() -> Rc<ComponentOptions> {
    Rc::new(
        ComponentOptions::new(|ctx| h("p", None, format!("count:{}", ctx.get("count"))))
            .with_name("Counter")
            .with_setup(|_props, _ctx| {
                Some(Object::from_entries([("count", Value::from(Ref::new(0)))]))
            }),
    )
}

/// Test the basic reactive render loop.
#[test]
fn counter_renders_once_per_flush() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");

    assert_eq!(renderer.host().text_content(root), "count:0");
    assert_eq!(instance.render_count(), 1);

    let count = state_ref(&instance, "count");
    count.update(|v| Value::from(v.as_int().unwrap_or_default() + 1));

    // Deferred until the microtask checkpoint.
    assert_eq!(renderer.host().text_content(root), "count:0");
    assert!(sprig_core::scheduler::has_pending_jobs());

    run_microtasks();
    assert_eq!(renderer.host().text_content(root), "count:1");
    assert_eq!(instance.render_count(), 2);
}

/// Test that several writes in one tick produce one render.
#[test]
fn writes_are_batched() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");
    let count = state_ref(&instance, "count");

    count.set(1);
    count.set(2);
    count.set(3);
    run_microtasks();

    assert_eq!(instance.render_count(), 2);
    assert_eq!(renderer.host().text_content(root), "count:3");
}

/// Test that the update reuses the host element.
#[test]
fn rerender_patches_in_place() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");
    let el = instance.el();
    renderer.host_mut().clear_ops();

    state_ref(&instance, "count").set(7);
    run_microtasks();

    let ops = renderer.host().ops().to_vec();
    assert_eq!(
        ops,
        vec![HostOp::SetElementText {
            node: el.expect("root element"),
            text: "count:7".into(),
        }]
    );
    assert_eq!(instance.el(), el);
}

/// Test that a stopped effect whose job is already queued does not run.
#[test]
fn stopped_effect_in_queue_is_skipped() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");

    state_ref(&instance, "count").set(1);
    assert!(sprig_core::scheduler::has_pending_jobs());

    instance.render_effect().expect("render effect").stop();
    run_microtasks();

    assert_eq!(instance.render_count(), 1);
    assert_eq!(renderer.host().text_content(root), "count:0");
}

/// Test that unmounting stops the render effect.
#[test]
fn unmount_stops_render_effect() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");
    let count = state_ref(&instance, "count");
    assert_eq!(renderer.instance_count(), 1);

    renderer.unmount(root);
    assert!(!instance.is_active());
    assert_eq!(renderer.instance_count(), 0);

    count.set(5);
    run_microtasks();
    assert_eq!(instance.render_count(), 1);
    assert_eq!(renderer.host().inner_html(root), "");
}

/// Test that plain setup-state fields are tracked too.
#[test]
fn setup_state_fields_are_reactive() {
    let label = Rc::new(
        ComponentOptions::new(|ctx| h("span", None, ctx.get("label").to_string()))
            .with_setup(|_props, _ctx| Some(Object::from_entries([("label", "before")]))),
    );

    let (renderer, root) = setup();
    let instance = create_app(label).mount(&renderer, root).expect("mounted");

    instance.setup_state().set("label", "after");
    run_microtasks();
    assert_eq!(renderer.host().text_content(root), "after");
}

/// Test that a parent re-render skips children whose props are unchanged.
#[test]
fn child_updates_only_when_props_change() {
    let child_renders = Rc::new(Cell::new(0));

    let counter = child_renders.clone();
    let child = Rc::new(
        ComponentOptions::new(move |ctx| {
            counter.set(counter.get() + 1);
            h("em", None, ctx.get("msg").to_string())
        })
        .with_name("Child"),
    );

    let parent = Rc::new(
        ComponentOptions::new(move |ctx| {
            h(
                "div",
                None,
                vec![
                    text(format!("other:{}", ctx.get("other"))),
                    h(&child, props([("msg", ctx.get("msg"))]), ()),
                ],
            )
        })
        .with_name("Parent")
        .with_setup(|_props, _ctx| {
            Some(Object::from_entries([
                ("msg", Value::from(Ref::new("hi"))),
                ("other", Value::from(Ref::new(0))),
            ]))
        }),
    );

    let (renderer, root) = setup();
    let instance = create_app(parent).mount(&renderer, root).expect("mounted");
    assert_eq!(renderer.host().text_content(root), "other:0hi");
    assert_eq!(child_renders.get(), 1);

    state_ref(&instance, "other").set(1);
    run_microtasks();
    assert_eq!(instance.render_count(), 2);
    assert_eq!(child_renders.get(), 1);
    assert_eq!(renderer.host().text_content(root), "other:1hi");

    state_ref(&instance, "msg").set("bye");
    run_microtasks();
    assert_eq!(child_renders.get(), 2);
    assert_eq!(renderer.host().text_content(root), "other:1bye");
}

/// Test that a child's own queued render is folded into a forced update.
#[test]
fn forced_child_update_invalidates_queued_job() {
    let child_renders = Rc::new(Cell::new(0));
    let child_state: Rc<RefCell<Option<Ref>>> = Rc::new(RefCell::new(None));

    let (counter, slot) = (child_renders.clone(), child_state.clone());
    let child = Rc::new(
        ComponentOptions::new(move |ctx| {
            counter.set(counter.get() + 1);
            h("em", None, format!("{}/{}", ctx.get("msg"), ctx.get("local")))
        })
        .with_setup(move |_props, _ctx| {
            let local = Ref::new(0);
            *slot.borrow_mut() = Some(local.clone());
            Some(Object::from_entries([("local", Value::from(local))]))
        }),
    );

    let parent = Rc::new(
        ComponentOptions::new(move |ctx| h(&child, props([("msg", ctx.get("msg"))]), ()))
            .with_setup(|_props, _ctx| {
                Some(Object::from_entries([("msg", Value::from(Ref::new("a")))]))
            }),
    );

    let (renderer, root) = setup();
    let instance = create_app(parent).mount(&renderer, root).expect("mounted");

    let local = child_state.borrow().clone().expect("child setup ran");
    state_ref(&instance, "msg").set("b");
    local.set(1);
    run_microtasks();

    assert_eq!(renderer.host().text_content(root), "b/1");
    assert_eq!(child_renders.get(), 2);
}

/// Test emit resolves the camel-cased `on` handler prop.
#[test]
fn emit_calls_parent_listener() {
    let received = Rc::new(RefCell::new(Vec::new()));

    let child = Rc::new(
        ComponentOptions::new(|ctx| h("button", props([("onClick", ctx.get("onClick"))]), "add"))
            .with_setup(|_props, ctx| {
                let ctx = ctx.clone();
                let on_click = Handler::new(move |_| ctx.emit("add-item", &[Value::from(42)]));
                Some(Object::from_entries([("onClick", on_click)]))
            }),
    );

    let sink = received.clone();
    let on_add_item = Handler::new(move |args| sink.borrow_mut().extend(args.iter().cloned()));
    let parent = Rc::new(ComponentOptions::new(move |_ctx| {
        h(&child, props([("onAddItem", on_add_item.clone())]), ())
    }));

    let (renderer, root) = setup();
    create_app(parent).mount(&renderer, root);

    let button = renderer.host().children(root)[0];
    assert!(renderer.dispatch(button, "click", &[]));
    assert_eq!(*received.borrow(), vec![Value::from(42)]);
}

/// Test named slots receive slot props.
#[test]
fn slots_render_with_props() {
    let card = Rc::new(ComponentOptions::new(|ctx| {
        h(
            "section",
            None,
            vec![
                ctx.render_slot("header", &props([("title", "Hello")])),
                ctx.render_slot("default", &Props::new()),
                ctx.render_slot("missing", &Props::new()),
            ],
        )
    }));

    let parent = Rc::new(ComponentOptions::new(move |_ctx| {
        h(
            &card,
            None,
            Slots::new()
                .with("header", |p| {
                    vec![h("h1", None, p.get("title").cloned().unwrap_or_default().to_string())]
                })
                .with("default", |_| vec![text("body")]),
        )
    }));

    let (renderer, root) = setup();
    create_app(parent).mount(&renderer, root);
    assert_eq!(
        renderer.host().inner_html(root),
        "<section><h1>Hello</h1>body</section>"
    );
}

/// Test provide/inject across an intermediate component.
#[test]
fn inject_reads_nearest_provider() {
    let leaf = Rc::new(
        ComponentOptions::new(|ctx| text(format!("{}-{}", ctx.get("theme"), ctx.get("lang"))))
            .with_setup(|_props, ctx| {
                Some(Object::from_entries([
                    ("theme", inject_or("theme", "none")),
                    ("lang", ctx.inject_or("lang", "none")),
                ]))
            }),
    );

    let middle = Rc::new(
        ComponentOptions::new(move |_ctx| h("div", None, vec![h(&leaf, None, ())]))
            .with_setup(|_props, _ctx| {
                provide("theme", "light");
                None
            }),
    );

    let app = Rc::new(
        ComponentOptions::new(move |_ctx| h(&middle, None, ())).with_setup(|_props, ctx| {
            assert!(current_instance().is_some());
            provide("theme", "dark");
            ctx.provide("lang", "en");
            None
        }),
    );

    let (renderer, root) = setup();
    create_app(app).mount(&renderer, root);
    assert_eq!(renderer.host().text_content(root), "light-en");
    assert!(current_instance().is_none());
}

/// Test that reordering keyed components moves them without remounting.
#[test]
fn keyed_components_move_without_remount() {
    let item = Rc::new(ComponentOptions::new(|ctx| h("li", None, ctx.get("label").to_string())));

    let list = Rc::new(
        ComponentOptions::new(move |ctx| {
            let order = ctx.get("order");
            let labels = order.as_str().unwrap_or_default().to_string();
            h(
                "ul",
                None,
                labels
                    .chars()
                    .map(|c| {
                        let label = c.to_string();
                        h(&item, props([("key", label.clone()), ("label", label)]), ())
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .with_setup(|_props, _ctx| {
            Some(Object::from_entries([("order", Value::from(Ref::new("abc")))]))
        }),
    );

    let (renderer, root) = setup();
    let instance = create_app(list).mount(&renderer, root).expect("mounted");
    assert_eq!(renderer.instance_count(), 4);
    renderer.host_mut().clear_ops();

    state_ref(&instance, "order").set("cab");
    run_microtasks();

    assert_eq!(renderer.host().text_content(root), "cab");
    assert_eq!(renderer.instance_count(), 4);
    assert!(!renderer
        .host()
        .ops()
        .iter()
        .any(|op| matches!(op, HostOp::CreateElement { .. })));
}

/// Test that next_tick observes the flushed host.
#[test]
fn next_tick_sees_flushed_output() {
    let (renderer, root) = setup();
    let instance = create_app(counter_component())
        .mount(&renderer, root)
        .expect("mounted");
    let observed = Rc::new(RefCell::new(String::new()));

    state_ref(&instance, "count").set(9);
    let (reader, sink) = (renderer.clone(), observed.clone());
    next_tick(move || *sink.borrow_mut() = reader.host().text_content(root));

    run_microtasks();
    assert_eq!(*observed.borrow(), "count:9");
}

/// Test that switching a child component type unmounts the old one.
#[test]
fn conditional_child_unmounts() {
    let shown = Rc::new(ComponentOptions::new(|_| h("b", None, "on")).with_name("Shown"));

    let toggle = Rc::new(
        ComponentOptions::new(move |ctx| {
            if ctx.get("show").as_bool().unwrap_or_default() {
                h("div", None, vec![h(&shown, None, ())])
            } else {
                h("div", None, vec![text("off")])
            }
        })
        .with_setup(|_props, _ctx| {
            Some(Object::from_entries([("show", Value::from(Ref::new(true)))]))
        }),
    );

    let (renderer, root) = setup();
    let instance = create_app(toggle).mount(&renderer, root).expect("mounted");
    assert_eq!(renderer.instance_count(), 2);

    state_ref(&instance, "show").set(false);
    run_microtasks();

    assert_eq!(renderer.instance_count(), 1);
    assert_eq!(renderer.host().inner_html(root), "<div>off</div>");
}

/// Test that a child rendering nothing keeps its place among its siblings.
#[test]
fn empty_child_renders_back_in_place() {
    let child_state: Rc<RefCell<Option<Ref>>> = Rc::new(RefCell::new(None));

    let slot = child_state.clone();
    let child = Rc::new(
        ComponentOptions::new(|ctx| {
            if ctx.get("show").as_bool().unwrap_or_default() {
                h("x", None, "mid")
            } else {
                fragment(vec![])
            }
        })
        .with_setup(move |_props, _ctx| {
            let show = Ref::new(false);
            *slot.borrow_mut() = Some(show.clone());
            Some(Object::from_entries([("show", Value::from(show))]))
        }),
    );

    let parent = Rc::new(ComponentOptions::new(move |_| {
        h(
            "div",
            None,
            vec![h("a", None, "1"), h(&child, None, ()), h("p", None, "end")],
        )
    }));

    let (renderer, root) = setup();
    create_app(parent).mount(&renderer, root).expect("mounted");
    assert_eq!(renderer.host().inner_html(root), "<div><a>1</a><p>end</p></div>");

    let show = child_state.borrow().clone().expect("child setup ran");
    show.set(true);
    run_microtasks();
    assert_eq!(
        renderer.host().inner_html(root),
        "<div><a>1</a><x>mid</x><p>end</p></div>"
    );

    show.set(false);
    run_microtasks();
    show.set(true);
    run_microtasks();
    assert_eq!(
        renderer.host().inner_html(root),
        "<div><a>1</a><x>mid</x><p>end</p></div>"
    );
}

/// Test that a component whose root is a fragment grows before its sibling.
#[test]
fn fragment_root_grows_in_place() {
    let count_cell: Rc<RefCell<Option<Ref>>> = Rc::new(RefCell::new(None));

    let slot = count_cell.clone();
    let items = Rc::new(
        ComponentOptions::new(|ctx| {
            let count = ctx.get("count").as_int().unwrap_or_default();
            fragment((0..count).map(|n| h("li", None, n.to_string())).collect())
        })
        .with_setup(move |_props, _ctx| {
            let count = Ref::new(1);
            *slot.borrow_mut() = Some(count.clone());
            Some(Object::from_entries([("count", Value::from(count))]))
        }),
    );

    let list = Rc::new(ComponentOptions::new(move |_| {
        h("ul", None, vec![h(&items, None, ()), h("li", None, "last")])
    }));

    let (renderer, root) = setup();
    create_app(list).mount(&renderer, root).expect("mounted");
    assert_eq!(renderer.host().text_content(root), "0last");

    let count = count_cell.borrow().clone().expect("child setup ran");
    count.set(3);
    run_microtasks();
    assert_eq!(renderer.host().text_content(root), "012last");
}
