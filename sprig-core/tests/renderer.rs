//! Integration Tests for the Diff/Patch Engine
//!
//! These tests drive the renderer with plain element trees and assert on
//! the host operations it issues.

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

fn keyed_list<K: Into<Value> + Clone + ToString>(keys: &[K]) -> VNode {
    h(
        "ul",
        None,
        keys.iter()
            .map(|key| h("li", props([("key", key.clone())]), key.to_string()))
            .collect::<Vec<_>>(),
    )
}

fn count_ops(renderer: &Renderer<MemoryHost>, pred: impl Fn(&HostOp) -> bool) -> usize {
    renderer.host().ops().iter().filter(|op| pred(op)).count()
}

fn is_insert(op: &HostOp) -> bool {
    matches!(op, HostOp::Insert { .. })
}

fn is_create(op: &HostOp) -> bool {
    matches!(op, HostOp::CreateElement { .. } | HostOp::CreateText { .. })
}

/// Test that a rotation moves exactly one node.
#[test]
fn keyed_rotation_moves_one_node() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&["A", "B", "C"]), root);
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&["C", "A", "B"]), root);

    // 3 - LIS([3, 1, 2]).len() == 1
    assert_eq!(count_ops(&renderer, is_insert), 1);
    assert_eq!(count_ops(&renderer, is_create), 0);
    assert_eq!(renderer.host().text_content(root), "CAB");
}

/// Test that removing a prop issues one removal and leaves equal props alone.
#[test]
fn prop_removal_patches_only_the_removed_key() {
    let (renderer, root) = setup();
    renderer.render(h("div", props([("id", "a"), ("class", "red")]), ()), root);
    let el = renderer.host().children(root)[0];
    renderer.host_mut().clear_ops();

    renderer.render(h("div", props([("id", "a")]), ()), root);

    assert_eq!(
        renderer.host().ops(),
        &[HostOp::PatchProp {
            node: el,
            key: "class".into(),
            prev: Some("red".into()),
            next: None,
        }]
    );
    assert_eq!(renderer.host().attribute(el, "class"), None);
    assert_eq!(renderer.host().attribute(el, "id"), Some("a"));
}

/// Test that appending to a list mounts once at the end and moves nothing.
#[test]
fn list_append_mounts_at_end() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[1, 2]), root);
    let ul = renderer.host().children(root)[0];
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&[1, 2, 3]), root);

    let inserts: Vec<HostOp> = renderer
        .host()
        .ops()
        .iter()
        .filter(|op| is_insert(op))
        .cloned()
        .collect();
    assert_eq!(inserts.len(), 1);
    assert!(matches!(
        inserts[0],
        HostOp::Insert { parent, anchor: None, .. } if parent == ul
    ));
    assert_eq!(
        count_ops(&renderer, |op| matches!(op, HostOp::CreateElement { .. })),
        1
    );
    assert_eq!(renderer.host().text_content(root), "123");
}

/// Test that prepending anchors before the old first node.
#[test]
fn list_prepend_anchors_before_first() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[2, 3]), root);
    let ul = renderer.host().children(root)[0];
    let first = renderer.host().children(ul)[0];
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&[1, 2, 3]), root);

    assert!(renderer
        .host()
        .ops()
        .iter()
        .any(|op| matches!(op, HostOp::Insert { anchor: Some(a), .. } if *a == first)));
    assert_eq!(renderer.host().text_content(root), "123");
}

/// Test that text children swapped for an array clear the text first.
#[test]
fn text_to_array_clears_then_mounts() {
    let (renderer, root) = setup();
    renderer.render(h("div", None, "hello"), root);
    let div = renderer.host().children(root)[0];
    renderer.host_mut().clear_ops();

    renderer.render(h("div", None, vec![h("span", None, ())]), root);

    let ops = renderer.host().ops().to_vec();
    assert_eq!(
        ops[0],
        HostOp::SetElementText {
            node: div,
            text: String::new(),
        }
    );
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, HostOp::CreateElement { .. }))
            .count(),
        1
    );
    assert_eq!(renderer.host().inner_html(root), "<div><span></span></div>");
}

/// Test that array children swapped for text unmount the array first.
#[test]
fn array_to_text_unmounts_then_sets_text() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[1, 2]), root);
    renderer.host_mut().clear_ops();

    renderer.render(h("ul", None, "empty"), root);

    let ops = renderer.host().ops().to_vec();
    assert_eq!(ops.len(), 3);
    assert!(matches!(ops[0], HostOp::Remove { .. }));
    assert!(matches!(ops[1], HostOp::Remove { .. }));
    assert!(matches!(&ops[2], HostOp::SetElementText { text, .. } if text == "empty"));
}

/// Test that a reversal keeps one node in place and moves the rest.
#[test]
fn reversal_moves_all_but_one() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[1, 2, 3, 4, 5]), root);
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&[5, 4, 3, 2, 1]), root);

    assert_eq!(count_ops(&renderer, is_insert), 4);
    assert_eq!(count_ops(&renderer, is_create), 0);
    assert_eq!(renderer.host().text_content(root), "54321");
}

/// Test removal from the middle of a list.
#[test]
fn middle_removal_unmounts_only_removed() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[1, 2, 3, 4]), root);
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&[1, 4]), root);

    assert_eq!(
        count_ops(&renderer, |op| matches!(op, HostOp::Remove { .. })),
        2
    );
    assert_eq!(count_ops(&renderer, is_insert), 0);
    assert_eq!(renderer.host().text_content(root), "14");
}

/// Test a mixed reorder with removal and insertion in the middle.
#[test]
fn mixed_middle_region() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&["a", "b", "c", "d", "e", "f", "g"]), root);
    renderer.host_mut().clear_ops();

    renderer.render(keyed_list(&["a", "b", "e", "c", "d", "h", "f", "g"]), root);

    // `e` moves, `h` is mounted; `c` and `d` stay.
    assert_eq!(count_ops(&renderer, is_insert), 2);
    assert_eq!(
        count_ops(&renderer, |op| matches!(op, HostOp::CreateElement { .. })),
        1
    );
    assert_eq!(renderer.host().text_content(root), "abecdhfg");
}

/// Test that unkeyed children of the same type are patched in place.
#[test]
fn unkeyed_children_patch_in_place() {
    let (renderer, root) = setup();
    renderer.render(
        h("div", None, vec![h("p", None, "1"), h("p", None, "2")]),
        root,
    );
    renderer.host_mut().clear_ops();

    renderer.render(
        h("div", None, vec![h("p", None, "1"), h("p", None, "two"), h("p", None, "3")]),
        root,
    );

    assert_eq!(
        count_ops(&renderer, |op| matches!(op, HostOp::CreateElement { .. })),
        1
    );
    assert_eq!(renderer.host().text_content(root), "1two3");
}

/// Test that fragments reconcile their children and can be replaced.
#[test]
fn fragments_reconcile_their_children() {
    let (renderer, root) = setup();
    renderer.render(fragment(vec![text("a"), text("b")]), root);
    renderer.render(fragment(vec![text("a"), text("b"), text("c")]), root);
    assert_eq!(renderer.host().text_content(root), "abc");

    renderer.render(h("p", None, "replaced"), root);
    assert_eq!(renderer.host().inner_html(root), "<p>replaced</p>");
}

/// Test event listeners through dispatch.
#[test]
fn listeners_are_dispatched() {
    use std::cell::Cell;
    use std::rc::Rc;

    let (renderer, root) = setup();
    let clicks = Rc::new(Cell::new(0));
    let sink = clicks.clone();
    let on_click = Handler::new(move |_| sink.set(sink.get() + 1));

    renderer.render(h("button", props([("onClick", on_click)]), "go"), root);
    let button = renderer.host().children(root)[0];

    assert!(renderer.dispatch(button, "click", &[]));
    assert!(!renderer.dispatch(button, "hover", &[]));
    assert_eq!(clicks.get(), 1);
}

/// Test that the op log serializes.
#[test]
fn op_log_serializes_to_json() {
    let (renderer, root) = setup();
    renderer.render(h("div", props([("id", "x")]), ()), root);

    let json = renderer.host().ops_json().expect("serializable op log");
    assert!(json.contains(r#""op":"patch_prop""#));
    assert!(json.contains(r#""key":"id""#));
}

/// Test that a fragment followed by a sibling grows in place.
#[test]
fn fragment_grows_before_its_sibling() {
    let (renderer, root) = setup();
    renderer.render(
        h("div", None, vec![fragment(vec![h("a", None, "1")]), h("p", None, "end")]),
        root,
    );

    renderer.render(
        h(
            "div",
            None,
            vec![
                fragment(vec![h("a", None, "1"), h("b", None, "2")]),
                h("p", None, "end"),
            ],
        ),
        root,
    );
    assert_eq!(
        renderer.host().inner_html(root),
        "<div><a>1</a><b>2</b><p>end</p></div>"
    );

    renderer.render(
        h("div", None, vec![fragment(vec![]), h("p", None, "end")]),
        root,
    );
    renderer.render(
        h("div", None, vec![fragment(vec![h("i", None, "back")]), h("p", None, "end")]),
        root,
    );
    assert_eq!(
        renderer.host().inner_html(root),
        "<div><i>back</i><p>end</p></div>"
    );
}

/// Test that a keyed fragment moves all of its nodes together.
#[test]
fn keyed_fragment_moves_as_a_unit() {
    fn list(order: &[&str]) -> VNode {
        let children = order
            .iter()
            .map(|&name| match name {
                "x" => {
                    let mut group = fragment(vec![h("li", None, "a"), h("li", None, "b")]);
                    group.key = Some(VNodeKey::Str("x".into()));
                    group
                }
                other => h("li", props([("key", other)]), other.to_uppercase()),
            })
            .collect::<Vec<_>>();
        h("ul", None, children)
    }

    let (renderer, root) = setup();
    renderer.render(list(&["x", "y", "z"]), root);
    assert_eq!(
        renderer.host().inner_html(root),
        "<ul><li>a</li><li>b</li><li>Y</li><li>Z</li></ul>"
    );
    renderer.host_mut().clear_ops();

    renderer.render(list(&["y", "z", "x"]), root);
    assert_eq!(
        renderer.host().inner_html(root),
        "<ul><li>Y</li><li>Z</li><li>a</li><li>b</li></ul>"
    );
    assert_eq!(count_ops(&renderer, is_create), 0);

    renderer.render(list(&["y", "x", "z"]), root);
    assert_eq!(renderer.host().text_content(root), "YabZ");
}

/// Test that duplicate keys do not leave stale nodes behind.
#[test]
fn duplicate_keys_leave_no_orphans() {
    let (renderer, root) = setup();
    renderer.render(keyed_list(&[1, 2, 2, 3]), root);
    renderer.render(keyed_list(&[3, 2, 2, 1]), root);
    assert_eq!(renderer.host().text_content(root), "3221");

    renderer.render(keyed_list::<i32>(&[]), root);
    assert_eq!(renderer.host().inner_html(root), "<ul></ul>");
    // The container and the list itself.
    assert_eq!(renderer.host().node_count(), 2);
}
