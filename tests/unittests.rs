use egui::{Pos2, Rect, Vec2, pos2, vec2};
use uml_loom::config::settings::{AppSettings, PanButton};
use uml_loom::diagram_utils::controller::{CanvasController, CanvasEvent, EventOutcome, Selection, Viewport};
use uml_loom::diagram_utils::dnd::{self, DataTransfer, DragSource, NODE_KIND_MIME};
use uml_loom::diagram_utils::domain::{
    DomainId, DomainStore, Edge, EdgeChange, Node, NodeChange, NodeId, NodeKind, NodePayload,
    TEXT_BLOCK_PLACEHOLDER,
};
use uml_loom::diagram_utils::interaction::{self, PointerEvent, ResizeGesture, ResizeTracker};
use uml_loom::diagram_utils::navigator::{BackOutcome, DomainNavigator};

fn structural(label: &str) -> Node {
    let mut n = Node::new_default(NodeKind::Structural, Pos2::ZERO, 1);
    interaction::set_label(&mut n, label);
    n
}

// Controller with a live viewport and container, ready to accept drops
fn ready_controller() -> CanvasController {
    let mut c = CanvasController::new();
    c.handle(CanvasEvent::Init(Viewport::default()));
    c.handle(CanvasEvent::ContainerChanged(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))));
    c
}

fn drop_kind(c: &mut CanvasController, kind: NodeKind, pointer: Pos2) -> NodeId {
    let op = DragSource::start(kind);
    match c.handle(CanvasEvent::Drop { transfer: op.transfer, pointer }) {
        EventOutcome::Created(id) => id,
        other => panic!("drop should create a node, got {:?}", other),
    }
}

fn properties_of(c: &CanvasController, id: NodeId) -> Vec<String> {
    match &c.store().node(c.active_id(), id).expect("node exists").payload {
        NodePayload::Structural { properties, .. } => properties.clone(),
        NodePayload::TextBlock { .. } => panic!("expected structural node"),
    }
}

// ---- Domain model ----

#[test]
fn store_starts_with_root_only() {
    let store = DomainStore::new();
    assert_eq!(store.len(), 1);
    let root = store.domain(DomainId::Root).expect("root exists");
    assert!(root.entered_from.is_none());
    assert!(root.nodes.is_empty() && root.edges.is_empty());
}

#[test]
fn create_domain_is_idempotent() {
    let mut store = DomainStore::new();
    let owner = structural("A");
    let id = DomainId::for_node(owner.id);
    assert!(store.create_domain(id, Some(owner.id)));
    assert!(!store.create_domain(id, Some(owner.id)));
    assert_eq!(store.len(), 2);
}

#[test]
fn mutations_are_scoped_to_one_domain() {
    let mut store = DomainStore::new();
    let owner = structural("Owner");
    let owner_id = owner.id;
    store.add_node(DomainId::Root, owner);
    let child = DomainId::for_node(owner_id);
    store.create_domain(child, Some(owner_id));

    assert!(store.add_node(child, structural("Inner")));
    assert_eq!(store.domain(DomainId::Root).map(|d| d.nodes.len()), Some(1));
    assert_eq!(store.domain(child).map(|d| d.nodes.len()), Some(1));
}

#[test]
fn add_to_unknown_domain_fails() {
    let mut store = DomainStore::new();
    let missing = DomainId::for_node(NodeId::now_v7());
    assert!(!store.add_node(missing, structural("x")));
    let a = structural("a");
    let b = structural("b");
    assert!(!store.add_edge(missing, Edge::new(a.id, b.id)));
}

#[test]
fn dimension_change_is_clamped_to_kind_minimum() {
    let mut store = DomainStore::new();
    let n = Node::new_default(NodeKind::TextBlock, Pos2::ZERO, 1);
    let id = n.id;
    store.add_node(DomainId::Root, n);
    store.apply_node_changes(DomainId::Root, &[NodeChange::Dimensions { id, size: vec2(10.0, 500.0) }]);
    assert_eq!(store.node(DomainId::Root, id).map(|n| n.size), Some(vec2(300.0, 500.0)));
}

#[test]
fn removing_node_drops_incident_edges() {
    let mut store = DomainStore::new();
    let (a, b, c) = (structural("a"), structural("b"), structural("c"));
    let (ai, bi, ci) = (a.id, b.id, c.id);
    for n in [a, b, c] {
        store.add_node(DomainId::Root, n);
    }
    store.add_edge(DomainId::Root, Edge::new(ai, bi));
    store.add_edge(DomainId::Root, Edge::new(bi, ci));
    let removed = store.apply_node_changes(DomainId::Root, &[NodeChange::Remove { id: ai }]);
    assert_eq!(removed, vec![ai]);
    let root = store.domain(DomainId::Root).expect("root");
    assert_eq!(root.nodes.len(), 2);
    assert_eq!(root.edges.len(), 1);
    assert_eq!(root.edges[0].source, bi);
}

#[test]
fn removing_node_prunes_nested_domains() {
    let mut store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    let outer = structural("outer");
    let outer_id = outer.id;
    store.add_node(DomainId::Root, outer);
    nav.enter(&mut store, outer_id);
    let inner = structural("inner");
    let inner_id = inner.id;
    store.add_node(nav.active(), inner);
    nav.enter(&mut store, inner_id);
    assert_eq!(store.len(), 3);

    nav.reset();
    store.remove_node(DomainId::Root, outer_id);
    assert_eq!(store.len(), 1);
    assert!(!store.contains(DomainId::for_node(outer_id)));
    assert!(!store.contains(DomainId::for_node(inner_id)));
}

#[test]
fn edge_change_set_add_and_remove() {
    let mut store = DomainStore::new();
    let (a, b) = (structural("a"), structural("b"));
    let edge = Edge::new(a.id, b.id);
    let eid = edge.id;
    store.add_node(DomainId::Root, a);
    store.add_node(DomainId::Root, b);
    store.apply_edge_changes(DomainId::Root, &[EdgeChange::Add(edge)]);
    assert_eq!(store.domain(DomainId::Root).map(|d| d.edges.len()), Some(1));
    store.apply_edge_changes(DomainId::Root, &[EdgeChange::Remove { id: eid }]);
    assert_eq!(store.domain(DomainId::Root).map(|d| d.edges.len()), Some(0));
}

#[test]
fn domain_id_string_form() {
    assert_eq!(DomainId::Root.to_string(), "root");
    let n = structural("n");
    assert_eq!(DomainId::for_node(n.id).to_string(), format!("domain-{}", n.id));
}

// ---- Navigator ----

#[test]
fn entering_same_node_twice_creates_one_domain() {
    let mut store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    let n = structural("A");
    let id = n.id;
    store.add_node(DomainId::Root, n);

    assert!(nav.enter(&mut store, id));
    assert_eq!(nav.active(), DomainId::for_node(id));
    assert!(!nav.enter(&mut store, id));
    assert_eq!(nav.active(), DomainId::for_node(id));
    assert_eq!(store.len(), 2);
    assert_eq!(store.domain(DomainId::for_node(id)).and_then(|d| d.entered_from), Some(id));
}

#[test]
fn back_from_root_is_a_noop() {
    let store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    for _ in 0..5 {
        assert_eq!(nav.back(&store), BackOutcome::AtRoot);
        assert_eq!(nav.active(), DomainId::Root);
    }
}

#[test]
fn enter_then_back_round_trips() {
    let mut store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    let outer = structural("outer");
    let outer_id = outer.id;
    store.add_node(DomainId::Root, outer);
    nav.enter(&mut store, outer_id);
    let level1 = nav.active();

    let inner = structural("inner");
    let inner_id = inner.id;
    store.add_node(level1, inner);
    nav.enter(&mut store, inner_id);
    assert_eq!(nav.back(&store), BackOutcome::Moved(level1));
    assert_eq!(nav.active(), level1);
    assert_eq!(nav.back(&store), BackOutcome::Moved(DomainId::Root));
}

#[test]
fn back_with_dangling_reference_stays_put() {
    let mut store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    let owner = structural("owner");
    let owner_id = owner.id;
    store.add_node(DomainId::Root, owner);
    nav.enter(&mut store, owner_id);
    // Detach the owner without pruning, leaving its domain's back-reference dangling
    store.domain_mut(DomainId::Root).expect("root").nodes.retain(|n| n.id != owner_id);
    let before = nav.active();
    assert_eq!(nav.back(&store), BackOutcome::Unresolved(owner_id));
    assert_eq!(nav.active(), before);
}

#[test]
fn breadcrumb_lists_path_from_root() {
    let mut store = DomainStore::new();
    let mut nav = DomainNavigator::new();
    let a = structural("a");
    let a_id = a.id;
    store.add_node(DomainId::Root, a);
    nav.enter(&mut store, a_id);
    let b = structural("b");
    let b_id = b.id;
    store.add_node(nav.active(), b);
    nav.enter(&mut store, b_id);
    assert_eq!(
        nav.breadcrumb(&store),
        vec![DomainId::Root, DomainId::for_node(a_id), DomainId::for_node(b_id)]
    );
}

// ---- Node interaction ----

#[test]
fn resize_clamps_structural_minimum() {
    let g = ResizeGesture::begin(pos2(400.0, 400.0), vec2(200.0, 100.0), NodeKind::Structural.min_size());
    assert_eq!(g.size_at(pos2(-100.0, -100.0)), vec2(200.0, 100.0));
}

#[test]
fn resize_grows_text_block() {
    let g = ResizeGesture::begin(pos2(10.0, 10.0), vec2(300.0, 200.0), NodeKind::TextBlock.min_size());
    assert_eq!(g.size_at(pos2(60.0, 90.0)), vec2(350.0, 280.0));
}

#[test]
fn resize_clamps_each_axis_independently() {
    let g = ResizeGesture::begin(Pos2::ZERO, vec2(250.0, 150.0), NodeKind::Structural.min_size());
    assert_eq!(g.size_at(pos2(40.0, -200.0)), vec2(290.0, 100.0));
}

#[test]
fn resize_gesture_does_not_outlive_pointer_up() {
    let mut tracker = ResizeTracker::default();
    let node = structural("n").id;
    assert_eq!(tracker.handle(PointerEvent::Move { pointer: pos2(5.0, 5.0) }), None);

    tracker.handle(PointerEvent::Down {
        node,
        pointer: Pos2::ZERO,
        size: vec2(200.0, 100.0),
        min_size: NodeKind::Structural.min_size(),
    });
    assert!(tracker.is_active());
    assert_eq!(
        tracker.handle(PointerEvent::Move { pointer: pos2(20.0, 30.0) }),
        Some((node, vec2(220.0, 130.0)))
    );
    tracker.handle(PointerEvent::Up);
    assert!(!tracker.is_active());
    assert_eq!(tracker.handle(PointerEvent::Move { pointer: pos2(90.0, 90.0) }), None);
}

#[test]
fn controller_resize_updates_only_during_gesture() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::Structural, pos2(100.0, 100.0));
    c.handle(CanvasEvent::Resize(PointerEvent::Down {
        node: id,
        pointer: pos2(300.0, 200.0),
        size: vec2(200.0, 100.0),
        min_size: NodeKind::Structural.min_size(),
    }));
    c.handle(CanvasEvent::Resize(PointerEvent::Move { pointer: pos2(350.0, 260.0) }));
    c.handle(CanvasEvent::Resize(PointerEvent::Up));
    assert_eq!(c.handle(CanvasEvent::Resize(PointerEvent::Move { pointer: pos2(900.0, 900.0) })), EventOutcome::Ignored);
    assert_eq!(c.store().node(DomainId::Root, id).map(|n| n.size), Some(vec2(250.0, 160.0)));
}

#[test]
fn label_edits_persist_on_every_keystroke() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::Structural, pos2(10.0, 10.0));
    c.handle(CanvasEvent::BeginLabelEdit(id));
    assert!(c.interaction(id).editing_label);
    for partial in ["P", "Pe", "Per"] {
        c.handle(CanvasEvent::EditLabel { node: id, text: partial.to_string() });
        assert_eq!(c.store().node(DomainId::Root, id).map(|n| n.caption().to_string()), Some(partial.to_string()));
    }
    c.handle(CanvasEvent::EditLabel { node: id, text: String::new() });
    assert_eq!(c.store().node(DomainId::Root, id).map(|n| n.caption().is_empty()), Some(true));
    c.handle(CanvasEvent::EndLabelEdit(id));
    assert!(!c.interaction(id).editing_label);
}

#[test]
fn expanded_toggle_is_independent_of_editing() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    c.handle(CanvasEvent::ToggleExpanded(id));
    assert!(c.interaction(id).expanded);
    assert!(!c.interaction(id).editing_label);
    c.handle(CanvasEvent::ToggleExpanded(id));
    assert!(!c.interaction(id).expanded);
}

#[test]
fn editing_one_property_leaves_the_rest() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    for _ in 0..3 {
        c.handle(CanvasEvent::AddProperty(id));
    }
    assert_eq!(properties_of(&c, id), vec!["New Property"; 3]);

    c.handle(CanvasEvent::EditProperty { node: id, index: 1, text: "+ name: String".to_string() });
    assert_eq!(properties_of(&c, id), vec!["New Property", "+ name: String", "New Property"]);

    assert_eq!(
        c.handle(CanvasEvent::EditProperty { node: id, index: 7, text: "x".to_string() }),
        EventOutcome::Ignored
    );
    assert_eq!(properties_of(&c, id).len(), 3);
}

#[test]
fn tab_inserts_four_spaces_at_cursor() {
    let mut text = String::from("abcdef");
    let caret = interaction::insert_indent(&mut text, 3..3);
    assert_eq!(text, "abc    def");
    assert_eq!(caret, 7);
}

#[test]
fn tab_replaces_selection_and_handles_multibyte() {
    let mut text = String::from("héllo wörld");
    let caret = interaction::insert_indent(&mut text, 7..5);
    assert_eq!(text, "héllo    örld");
    assert_eq!(caret, 9);
}

#[test]
fn controller_indent_reports_caret() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::TextBlock, Pos2::ZERO);
    c.handle(CanvasEvent::EditText { node: id, text: "x\ny".to_string() });
    assert_eq!(c.handle(CanvasEvent::IndentText { node: id, selection: 2..2 }), EventOutcome::Caret(6));
    match &c.store().node(DomainId::Root, id).expect("node").payload {
        NodePayload::TextBlock { text } => assert_eq!(text, "x\n    y"),
        NodePayload::Structural { .. } => panic!("expected text block"),
    }
}

#[test]
fn line_numbers_follow_newlines() {
    assert_eq!(interaction::line_numbers("").collect::<Vec<_>>(), vec![1]);
    assert_eq!(interaction::line_numbers("a\nb\n").collect::<Vec<_>>(), vec![1, 2, 3]);
}

// ---- Drag-source registry ----

#[test]
fn drag_source_encodes_kind_with_transparent_preview() {
    let op = DragSource::start(NodeKind::TextBlock);
    assert_eq!(op.transfer.get_data(NODE_KIND_MIME), Some("text-block"));
    assert_eq!(op.preview.size, Vec2::splat(1.0));
    assert_eq!(op.preview.color.a(), 0);
    assert_eq!(dnd::decode(&op.transfer), Some(NodeKind::TextBlock));
}

#[test]
fn unknown_or_missing_tokens_decode_to_none() {
    assert_eq!(dnd::decode(&DataTransfer::new()), None);
    let mut t = DataTransfer::new();
    t.set_data(NODE_KIND_MIME, "");
    assert_eq!(dnd::decode(&t), None);
    t.set_data(NODE_KIND_MIME, "custom");
    assert_eq!(dnd::decode(&t), None);
    t.set_data("text/plain", "structural");
    assert_eq!(dnd::decode(&t), None);
}

// ---- Canvas controller ----

#[test]
fn drop_adds_structural_node_to_root_at_projected_point() {
    let mut c = CanvasController::new();
    c.handle(CanvasEvent::Init(Viewport::new(vec2(10.0, 20.0), 2.0)));
    c.handle(CanvasEvent::ContainerChanged(Rect::from_min_size(pos2(100.0, 50.0), vec2(800.0, 600.0))));

    // Another domain exists and must stay untouched
    let owner = drop_kind(&mut c, NodeKind::Structural, pos2(120.0, 70.0));
    c.handle(CanvasEvent::Enter(owner));
    c.handle(CanvasEvent::Back);
    let child_before = c.store().domain(DomainId::for_node(owner)).cloned();
    let edges_before = c.store().domain(DomainId::Root).map(|d| d.edges.len());

    let id = drop_kind(&mut c, NodeKind::Structural, pos2(300.0, 250.0));
    let root = c.store().domain(DomainId::Root).expect("root");
    assert_eq!(root.nodes.len(), 2);
    let node = root.node(id).expect("dropped node in root");
    assert_eq!(node.kind(), NodeKind::Structural);
    assert_eq!(node.position, pos2(95.0, 90.0));
    assert_eq!(node.size, vec2(200.0, 100.0));
    match &node.payload {
        NodePayload::Structural { label, properties } => {
            assert_eq!(label, "Node 2");
            assert!(properties.is_empty());
        }
        NodePayload::TextBlock { .. } => panic!("expected structural payload"),
    }
    assert_eq!(Some(root.edges.len()), edges_before);
    assert_eq!(c.store().domain(DomainId::for_node(owner)).cloned(), child_before);
}

#[test]
fn drop_while_nested_targets_active_domain() {
    let mut c = ready_controller();
    let owner = drop_kind(&mut c, NodeKind::Structural, pos2(50.0, 50.0));
    c.handle(CanvasEvent::Enter(owner));
    let inner = drop_kind(&mut c, NodeKind::TextBlock, pos2(200.0, 200.0));

    let child = c.store().domain(DomainId::for_node(owner)).expect("child domain");
    assert!(child.contains_node(inner));
    assert_eq!(child.node(inner).map(|n| n.size), Some(vec2(300.0, 200.0)));
    match child.node(inner).map(|n| &n.payload) {
        Some(NodePayload::TextBlock { text }) => assert_eq!(text, TEXT_BLOCK_PLACEHOLDER),
        other => panic!("expected text block payload, got {:?}", other),
    }
    assert_eq!(c.store().domain(DomainId::Root).map(|d| d.nodes.len()), Some(1));
}

#[test]
fn drop_over_existing_node_still_creates_node() {
    let mut c = ready_controller();
    let under = drop_kind(&mut c, NodeKind::Structural, pos2(100.0, 100.0));
    // Released on top of the first node's body
    let over = drop_kind(&mut c, NodeKind::Structural, pos2(150.0, 130.0));
    assert_ne!(under, over);
    let root = c.store().domain(DomainId::Root).expect("root");
    assert!(root.contains_node(under) && root.contains_node(over));
}

#[test]
fn release_point_accepts_any_pointer_inside_canvas() {
    let canvas = Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0));
    assert_eq!(dnd::release_point(true, Some(pos2(150.0, 130.0)), canvas), Some(pos2(150.0, 130.0)));
    assert_eq!(dnd::release_point(false, Some(pos2(150.0, 130.0)), canvas), None);
    assert_eq!(dnd::release_point(true, Some(pos2(900.0, 10.0)), canvas), None);
    assert_eq!(dnd::release_point(true, None, canvas), None);
}

#[test]
fn enter_unknown_node_is_ignored() {
    let mut c = ready_controller();
    let ghost = structural("ghost").id;
    assert_eq!(c.handle(CanvasEvent::Enter(ghost)), EventOutcome::Ignored);
    assert_eq!(c.active_id(), DomainId::Root);
    assert_eq!(c.store().len(), 1);
    assert!(!c.show_back());
}

#[test]
fn enter_node_from_another_domain_is_ignored() {
    let mut c = ready_controller();
    let a = drop_kind(&mut c, NodeKind::Structural, pos2(50.0, 50.0));
    let b = drop_kind(&mut c, NodeKind::Structural, pos2(400.0, 50.0));
    c.handle(CanvasEvent::Enter(a));
    let inside_a = DomainId::for_node(a);

    // b lives in root, not in a's domain
    assert_eq!(c.handle(CanvasEvent::Enter(b)), EventOutcome::Ignored);
    assert_eq!(c.active_id(), inside_a);
    assert!(c.store().domain(DomainId::for_node(b)).is_none());

    assert_eq!(c.handle(CanvasEvent::Back), EventOutcome::Navigated(DomainId::Root));
    assert_eq!(c.handle(CanvasEvent::Enter(a)), EventOutcome::Navigated(inside_a));
}

#[test]
fn drop_is_ignored_without_token_or_canvas() {
    let mut c = CanvasController::new();
    let op = DragSource::start(NodeKind::Structural);
    // No viewport or container yet
    assert_eq!(c.handle(CanvasEvent::Drop { transfer: op.transfer.clone(), pointer: Pos2::ZERO }), EventOutcome::Ignored);
    c.handle(CanvasEvent::Init(Viewport::default()));
    assert_eq!(c.handle(CanvasEvent::Drop { transfer: op.transfer.clone(), pointer: Pos2::ZERO }), EventOutcome::Ignored);
    c.handle(CanvasEvent::ContainerChanged(Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0))));
    assert_eq!(c.handle(CanvasEvent::Drop { transfer: DataTransfer::new(), pointer: Pos2::ZERO }), EventOutcome::Ignored);
    assert_eq!(c.store().domain(DomainId::Root).map(|d| d.nodes.len()), Some(0));
}

#[test]
fn back_affordance_only_in_nested_domains() {
    let mut c = ready_controller();
    assert!(!c.show_back());
    let id = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    assert_eq!(c.handle(CanvasEvent::Enter(id)), EventOutcome::Navigated(DomainId::for_node(id)));
    assert!(c.show_back());
    assert_eq!(c.handle(CanvasEvent::Back), EventOutcome::Navigated(DomainId::Root));
    assert!(!c.show_back());
    assert_eq!(c.handle(CanvasEvent::Back), EventOutcome::Ignored);
}

#[test]
fn navigation_clears_transient_state() {
    let mut c = ready_controller();
    let id = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    c.handle(CanvasEvent::ToggleExpanded(id));
    c.handle(CanvasEvent::Select(Some(Selection::Node(id))));
    c.handle(CanvasEvent::Enter(id));
    c.handle(CanvasEvent::Back);
    assert!(!c.interaction(id).expanded);
    assert_eq!(c.selection(), None);
}

#[test]
fn connect_rejects_self_loops_duplicates_and_foreign_nodes() {
    let mut c = ready_controller();
    let a = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    let b = drop_kind(&mut c, NodeKind::Structural, pos2(300.0, 0.0));
    assert_eq!(c.handle(CanvasEvent::Connect { source: a, target: b }), EventOutcome::Changed);
    assert_eq!(c.handle(CanvasEvent::Connect { source: a, target: b }), EventOutcome::Ignored);
    assert_eq!(c.handle(CanvasEvent::Connect { source: a, target: a }), EventOutcome::Ignored);

    c.handle(CanvasEvent::Enter(a));
    let inner = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    assert_eq!(c.handle(CanvasEvent::Connect { source: inner, target: b }), EventOutcome::Ignored);
    c.handle(CanvasEvent::Back);
    assert_eq!(c.store().domain(DomainId::Root).map(|d| d.edges.len()), Some(1));
}

#[test]
fn delete_selection_removes_node_and_its_subdomain() {
    let mut c = ready_controller();
    let a = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    c.handle(CanvasEvent::Enter(a));
    c.handle(CanvasEvent::Back);
    assert_eq!(c.store().len(), 2);

    c.handle(CanvasEvent::Select(Some(Selection::Node(a))));
    c.handle(CanvasEvent::DeleteSelection);
    assert_eq!(c.store().len(), 1);
    assert_eq!(c.store().domain(DomainId::Root).map(|d| d.nodes.len()), Some(0));
    assert_eq!(c.handle(CanvasEvent::DeleteSelection), EventOutcome::Ignored);
}

#[test]
fn node_moves_apply_to_active_domain() {
    let mut c = ready_controller();
    let a = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    c.handle(CanvasEvent::NodesChanged(vec![NodeChange::Position { id: a, position: pos2(42.0, 7.0) }]));
    assert_eq!(c.store().node(DomainId::Root, a).map(|n| n.position), Some(pos2(42.0, 7.0)));
}

#[test]
fn new_diagram_resets_everything() {
    let mut c = ready_controller();
    let a = drop_kind(&mut c, NodeKind::Structural, Pos2::ZERO);
    c.handle(CanvasEvent::Enter(a));
    c.new_diagram();
    assert_eq!(c.active_id(), DomainId::Root);
    assert_eq!(c.store().len(), 1);
    assert!(c.viewport().is_some());
}

#[test]
fn viewport_zoom_keeps_anchor_fixed() {
    let mut vp = Viewport::new(vec2(30.0, -10.0), 1.0);
    let anchor = pos2(200.0, 150.0);
    let world_before = vp.project(anchor);
    vp.zoom_around(anchor, 1.5, 0.25, 2.0);
    assert_eq!(vp.zoom, 1.5);
    let world_after = vp.project(anchor);
    assert!((world_before - world_after).length() < 1e-3);
}

// ---- Settings ----

#[test]
fn settings_defaults_fill_missing_fields() {
    let s = AppSettings::from_json("{}").expect("empty object parses");
    assert_eq!(s, AppSettings::default());
    assert_eq!(s.pan_button, PanButton::Secondary);
}

#[test]
fn settings_with_bad_zoom_bounds_fall_back() {
    let s = AppSettings::from_json(r#"{"zoom_min": 3.0, "zoom_max": 1.0, "show_grid": false}"#).expect("parses");
    assert_eq!(s.zoom_min, 0.25);
    assert_eq!(s.zoom_max, 2.0);
    assert!(!s.show_grid);
}
