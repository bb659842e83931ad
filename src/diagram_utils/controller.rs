use std::collections::HashMap;
use std::ops::Range;

use egui::{Pos2, Rect, Vec2};

use super::dnd::{self, DataTransfer};
use super::domain::{
    Domain, DomainId, DomainStore, Edge, EdgeChange, EdgeId, Node, NodeChange, NodeId, NodePayload,
};
use super::interaction::{self, NodeInteraction, PointerEvent, ResizeTracker};
use super::navigator::{BackOutcome, DomainNavigator};

/// Pan/zoom state of the canvas.
///
/// Works in container-local pixels: `local = world * zoom + pan`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { pan: Vec2::ZERO, zoom: 1.0 }
    }
}

impl Viewport {
    pub fn new(pan: Vec2, zoom: f32) -> Self { Viewport { pan, zoom } }

    pub fn to_local(&self, world: Pos2) -> Pos2 {
        Pos2::new(world.x * self.zoom + self.pan.x, world.y * self.zoom + self.pan.y)
    }

    // Container-local pixels -> domain coordinates
    pub fn project(&self, local: Pos2) -> Pos2 {
        Pos2::new((local.x - self.pan.x) / self.zoom, (local.y - self.pan.y) / self.zoom)
    }

    // Zoom by `factor`, keeping the world point under `anchor` fixed on screen
    pub fn zoom_around(&mut self, anchor: Pos2, factor: f32, min: f32, max: f32) {
        let world = self.project(anchor);
        self.zoom = (self.zoom * factor).clamp(min, max);
        self.pan = anchor.to_vec2() - world.to_vec2() * self.zoom;
    }

    /// Frame `bounds` (world space) inside a container of `size` pixels.
    pub fn fit(&mut self, bounds: Rect, size: Vec2, padding: f32, min: f32, max: f32) {
        if !bounds.is_positive() || size.x <= padding * 2.0 || size.y <= padding * 2.0 {
            return;
        }
        let avail = size - Vec2::splat(padding * 2.0);
        self.zoom = (avail.x / bounds.width()).min(avail.y / bounds.height()).clamp(min, max);
        let center = size * 0.5;
        self.pan = center - bounds.center().to_vec2() * self.zoom;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    Init(Viewport),
    ViewportChanged(Viewport),
    ContainerChanged(Rect),
    NodesChanged(Vec<NodeChange>),
    EdgesChanged(Vec<EdgeChange>),
    Connect { source: NodeId, target: NodeId },
    Drop { transfer: DataTransfer, pointer: Pos2 },
    Enter(NodeId),
    Back,
    BeginLabelEdit(NodeId),
    EditLabel { node: NodeId, text: String },
    EndLabelEdit(NodeId),
    ToggleExpanded(NodeId),
    AddProperty(NodeId),
    EditProperty { node: NodeId, index: usize, text: String },
    EditText { node: NodeId, text: String },
    IndentText { node: NodeId, selection: Range<usize> },
    Resize(PointerEvent),
    Select(Option<Selection>),
    DeleteSelection,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EventOutcome {
    Ignored,
    Changed,
    Created(NodeId),
    Navigated(DomainId),
    // New caret position after a text insertion
    Caret(usize),
}

/// Owns every piece of canvas state and is the only thing that mutates it.
pub struct CanvasController {
    store: DomainStore,
    navigator: DomainNavigator,
    viewport: Option<Viewport>,
    container: Option<Rect>,
    interactions: HashMap<NodeId, NodeInteraction>,
    resize: ResizeTracker,
    selection: Option<Selection>,
}

impl Default for CanvasController {
    fn default() -> Self { Self::new() }
}

impl CanvasController {
    pub fn new() -> Self {
        CanvasController {
            store: DomainStore::new(),
            navigator: DomainNavigator::new(),
            viewport: None,
            container: None,
            interactions: HashMap::new(),
            resize: ResizeTracker::default(),
            selection: None,
        }
    }

    pub fn store(&self) -> &DomainStore { &self.store }
    pub fn active_id(&self) -> DomainId { self.navigator.active() }
    pub fn active_domain(&self) -> Option<&Domain> { self.store.domain(self.navigator.active()) }
    pub fn viewport(&self) -> Option<Viewport> { self.viewport }
    pub fn container(&self) -> Option<Rect> { self.container }
    pub fn selection(&self) -> Option<Selection> { self.selection }
    pub fn is_resizing(&self) -> bool { self.resize.is_active() }
    pub fn resizing_node(&self) -> Option<NodeId> { self.resize.active_node() }

    // The back affordance is only offered inside a nested domain
    pub fn show_back(&self) -> bool { !self.navigator.active().is_root() }

    pub fn breadcrumb(&self) -> Vec<DomainId> { self.navigator.breadcrumb(&self.store) }

    pub fn interaction(&self, node: NodeId) -> NodeInteraction {
        self.interactions.get(&node).cloned().unwrap_or_default()
    }

    // Human-readable name of a domain: the caption of the node it was entered from
    pub fn domain_title(&self, id: DomainId) -> String {
        match id {
            DomainId::Root => "Root".to_string(),
            DomainId::Child(owner) => self
                .store
                .domain_containing(owner)
                .and_then(|d| self.store.node(d, owner))
                .map(|n| n.caption().to_string())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    pub fn new_diagram(&mut self) {
        self.store = DomainStore::new();
        self.navigator.reset();
        self.clear_transient();
        log::info!("started a new diagram");
    }

    pub fn handle(&mut self, event: CanvasEvent) -> EventOutcome {
        let active = self.navigator.active();
        match event {
            CanvasEvent::Init(viewport) => {
                log::debug!("canvas initialised at zoom {:.2}", viewport.zoom);
                self.viewport = Some(viewport);
                EventOutcome::Changed
            }
            CanvasEvent::ViewportChanged(viewport) => {
                self.viewport = Some(viewport);
                EventOutcome::Changed
            }
            CanvasEvent::ContainerChanged(rect) => {
                self.container = Some(rect);
                EventOutcome::Changed
            }
            CanvasEvent::NodesChanged(changes) => {
                let removed = self.store.apply_node_changes(active, &changes);
                self.forget_nodes(&removed);
                EventOutcome::Changed
            }
            CanvasEvent::EdgesChanged(changes) => {
                self.store.apply_edge_changes(active, &changes);
                if let Some(Selection::Edge(id)) = self.selection {
                    let gone = changes.iter().any(|c| matches!(c, EdgeChange::Remove { id: r } if *r == id));
                    if gone {
                        self.selection = None;
                    }
                }
                EventOutcome::Changed
            }
            CanvasEvent::Connect { source, target } => self.connect(active, source, target),
            CanvasEvent::Drop { transfer, pointer } => self.drop_node(active, &transfer, pointer),
            CanvasEvent::Enter(node) => {
                // Only nodes of the visible domain can be drilled into
                if !self.store.domain(active).is_some_and(|d| d.contains_node(node)) {
                    log::debug!("enter ignored: node {} is not in domain {}", node, active);
                    return EventOutcome::Ignored;
                }
                self.navigator.enter(&mut self.store, node);
                self.clear_transient();
                let now = self.navigator.active();
                log::info!("entered domain {}", now);
                EventOutcome::Navigated(now)
            }
            CanvasEvent::Back => match self.navigator.back(&self.store) {
                BackOutcome::Moved(parent) => {
                    self.clear_transient();
                    log::info!("returned to domain {}", parent);
                    EventOutcome::Navigated(parent)
                }
                BackOutcome::AtRoot | BackOutcome::Unresolved(_) => EventOutcome::Ignored,
            },
            CanvasEvent::BeginLabelEdit(node) => {
                self.interactions.entry(node).or_default().begin_label_edit();
                EventOutcome::Changed
            }
            CanvasEvent::EndLabelEdit(node) => {
                self.interactions.entry(node).or_default().end_label_edit();
                EventOutcome::Changed
            }
            CanvasEvent::ToggleExpanded(node) => {
                self.interactions.entry(node).or_default().toggle_expanded();
                EventOutcome::Changed
            }
            CanvasEvent::EditLabel { node, text } => {
                self.edit_node(active, node, |n| interaction::set_label(n, &text))
            }
            CanvasEvent::AddProperty(node) => self.edit_node(active, node, interaction::add_property),
            CanvasEvent::EditProperty { node, index, text } => {
                self.edit_node(active, node, |n| interaction::set_property(n, index, &text))
            }
            CanvasEvent::EditText { node, text } => {
                self.edit_node(active, node, |n| interaction::set_text(n, &text))
            }
            CanvasEvent::IndentText { node, selection } => self.indent_text(active, node, selection),
            CanvasEvent::Resize(pointer) => {
                if let PointerEvent::Down { node, .. } = pointer {
                    if !self.store.domain(active).is_some_and(|d| d.contains_node(node)) {
                        return EventOutcome::Ignored;
                    }
                }
                match self.resize.handle(pointer) {
                    Some((node, size)) => {
                        self.store.apply_node_changes(active, &[NodeChange::Dimensions { id: node, size }]);
                        EventOutcome::Changed
                    }
                    None => EventOutcome::Ignored,
                }
            }
            CanvasEvent::Select(selection) => {
                self.selection = selection;
                EventOutcome::Changed
            }
            CanvasEvent::DeleteSelection => match self.selection.take() {
                Some(Selection::Node(id)) => self.handle(CanvasEvent::NodesChanged(vec![NodeChange::Remove { id }])),
                Some(Selection::Edge(id)) => self.handle(CanvasEvent::EdgesChanged(vec![EdgeChange::Remove { id }])),
                None => EventOutcome::Ignored,
            },
        }
    }

    fn connect(&mut self, active: DomainId, source: NodeId, target: NodeId) -> EventOutcome {
        let Some(domain) = self.store.domain(active) else { return EventOutcome::Ignored };
        if source == target
            || !domain.contains_node(source)
            || !domain.contains_node(target)
            || domain.has_edge_between(source, target)
        {
            return EventOutcome::Ignored;
        }
        self.store.add_edge(active, Edge::new(source, target));
        EventOutcome::Changed
    }

    fn drop_node(&mut self, active: DomainId, transfer: &DataTransfer, pointer: Pos2) -> EventOutcome {
        let Some(kind) = dnd::decode(transfer) else {
            log::debug!("drop ignored: no node kind in payload");
            return EventOutcome::Ignored;
        };
        let (Some(viewport), Some(container)) = (self.viewport, self.container) else {
            log::debug!("drop ignored: canvas not ready");
            return EventOutcome::Ignored;
        };
        let position = viewport.project(pointer - container.min.to_vec2());
        let ordinal = self.store.domain(active).map(|d| d.nodes.len()).unwrap_or(0) + 1;
        let node = Node::new_default(kind, position, ordinal);
        let id = node.id;
        if !self.store.add_node(active, node) {
            return EventOutcome::Ignored;
        }
        log::info!("created {} node {} in domain {}", kind.token(), id, active);
        EventOutcome::Created(id)
    }

    fn indent_text(&mut self, active: DomainId, node: NodeId, selection: Range<usize>) -> EventOutcome {
        let Some(n) = self.store.node_mut(active, node) else { return EventOutcome::Ignored };
        match &mut n.payload {
            NodePayload::TextBlock { text } => {
                EventOutcome::Caret(interaction::insert_indent(text, selection))
            }
            NodePayload::Structural { .. } => EventOutcome::Ignored,
        }
    }

    fn edit_node(&mut self, active: DomainId, node: NodeId, edit: impl FnOnce(&mut Node) -> bool) -> EventOutcome {
        match self.store.node_mut(active, node) {
            Some(n) => {
                if edit(n) { EventOutcome::Changed } else { EventOutcome::Ignored }
            }
            None => EventOutcome::Ignored,
        }
    }

    fn forget_nodes(&mut self, removed: &[NodeId]) {
        for id in removed {
            self.interactions.remove(id);
            if self.resize.active_node() == Some(*id) {
                self.resize.cancel();
            }
            if self.selection == Some(Selection::Node(*id)) {
                self.selection = None;
            }
        }
    }

    // Live node instances of the previous domain go away on navigation
    fn clear_transient(&mut self) {
        self.interactions.clear();
        self.resize.cancel();
        self.selection = None;
    }
}
