#![allow(clippy::collapsible_if)]
use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, Vec2};

use crate::config::settings::{AppSettings, PanButton};
use crate::diagram_utils::controller::{CanvasController, CanvasEvent, EventOutcome, Selection, Viewport};
use crate::diagram_utils::dnd::{self, DataTransfer, DragPreview, DragSource};
use crate::diagram_utils::domain::{Node, NodeChange, NodeId, NodeKind};
use crate::diagram_utils::interaction::PointerEvent;
use crate::gui::node_view::{self, HEADER_HEIGHT, PORT_RADIUS, RESIZE_HANDLE};

const STRUCTURAL_FILL: Color32 = Color32::from_rgb(250, 250, 250);
const TEXT_BLOCK_FILL: Color32 = Color32::from_rgb(30, 30, 30);
const ACCENT: Color32 = Color32::from_rgb(79, 70, 229);

pub struct DiagramApp {
    controller: CanvasController,
    settings: AppSettings,
    // Source node of an in-progress connection drag
    connecting: Option<NodeId>,
    // Preview painted while a toolbar drag is in flight
    drag_preview: Option<DragPreview>,
    // Preferences UI state
    show_prefs_window: bool,
    prefs_edit: AppSettings,
    prefs_status: Option<String>,
}

impl DiagramApp {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            controller: CanvasController::new(),
            settings: settings.clone(),
            connecting: None,
            drag_preview: None,
            show_prefs_window: false,
            prefs_edit: settings,
            prefs_status: None,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, events: Vec<CanvasEvent>) {
        for event in events {
            let caret_target = match &event {
                CanvasEvent::IndentText { node, .. } => Some(*node),
                _ => None,
            };
            let outcome = self.controller.handle(event);
            if let (EventOutcome::Caret(caret), Some(node)) = (outcome, caret_target) {
                let id = node_view::code_editor_id(node);
                if let Some(mut state) = egui::text_edit::TextEditState::load(ctx, id) {
                    let cursor = egui::text::CCursor::new(caret);
                    state.cursor.set_char_range(Some(egui::text::CCursorRange::one(cursor)));
                    state.store(ctx, id);
                }
            }
            if matches!(outcome, EventOutcome::Navigated(_)) {
                self.connecting = None;
            }
        }
    }

    fn viewport(&self) -> Viewport {
        self.controller.viewport().unwrap_or_default()
    }

    fn zoom_by(&mut self, ctx: &egui::Context, factor: f32) {
        let Some(container) = self.controller.container() else { return };
        let mut vp = self.viewport();
        let anchor = Pos2::new(container.width() * 0.5, container.height() * 0.5);
        vp.zoom_around(anchor, factor, self.settings.zoom_min, self.settings.zoom_max);
        self.dispatch(ctx, vec![CanvasEvent::ViewportChanged(vp)]);
    }

    fn fit_view(&mut self, ctx: &egui::Context) {
        let (Some(container), Some(domain)) = (self.controller.container(), self.controller.active_domain()) else {
            return;
        };
        let bounds = domain
            .nodes
            .iter()
            .fold(Rect::NOTHING, |acc, n| acc.union(Rect::from_min_size(n.position, n.size)));
        let mut vp = self.viewport();
        vp.fit(bounds, container.size(), 40.0, self.settings.zoom_min, self.settings.zoom_max);
        self.dispatch(ctx, vec![CanvasEvent::ViewportChanged(vp)]);
    }

    pub fn menu_new_diagram(&mut self) {
        self.controller.new_diagram();
        self.connecting = None;
    }

    pub fn menu_open_prefs(&mut self) {
        self.prefs_edit = self.settings.clone();
        self.prefs_status = None;
        self.show_prefs_window = true;
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            let new_shortcut = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::N);
            if ctx.input_mut(|i| i.consume_shortcut(&new_shortcut)) {
                self.menu_new_diagram();
            }

            ui.horizontal(|ui| {
                ui.label("UML-Loom");

                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("New Diagram").shortcut_text(ctx.format_shortcut(&new_shortcut))).clicked() {
                        self.menu_new_diagram();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        self.zoom_by(ctx, 1.2);
                        ui.close();
                    }
                    if ui.button("Zoom Out").clicked() {
                        self.zoom_by(ctx, 1.0 / 1.2);
                        ui.close();
                    }
                    if ui.button("Fit View").clicked() {
                        self.fit_view(ctx);
                        ui.close();
                    }
                    ui.separator();
                    ui.checkbox(&mut self.settings.show_grid, "Background Grid");
                    let toggle_sidebar = if self.settings.sidebar_open { "Hide Toolbar" } else { "Show Toolbar" };
                    if ui.button(toggle_sidebar).clicked() {
                        self.settings.sidebar_open = !self.settings.sidebar_open;
                        ui.close();
                    }
                });

                ui.menu_button("Settings", |ui| {
                    if ui.button("Preferences…").clicked() {
                        self.menu_open_prefs();
                        ui.close();
                    }
                });

                ui.separator();
                // Breadcrumb trail of nested domains
                let trail = self.controller.breadcrumb();
                for (i, id) in trail.iter().enumerate() {
                    if i > 0 {
                        ui.label("›");
                    }
                    ui.label(egui::RichText::new(self.controller.domain_title(*id)).strong());
                }
                if let Some(domain) = self.controller.active_domain() {
                    ui.small(format!("N:{} E:{}", domain.nodes.len(), domain.edges.len()));
                }
            });
        });
    }

    fn toolbar_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("toolbar")
            .resizable(false)
            .default_width(180.0)
            .show(ctx, |ui| {
                ui.heading("Toolbar");
                ui.separator();
                for kind in NodeKind::ALL {
                    let caption = match kind {
                        NodeKind::Structural => "Drag to add node",
                        NodeKind::TextBlock => "Drag to add code",
                    };
                    let resp = ui
                        .add_sized([ui.available_width(), 48.0], egui::Button::new(caption).sense(Sense::drag()))
                        .on_hover_cursor(egui::CursorIcon::Grab);
                    if resp.drag_started() {
                        let op = DragSource::start(kind);
                        egui::DragAndDrop::set_payload(ui.ctx(), op.transfer);
                        self.drag_preview = Some(op.preview);
                    }
                    ui.add_space(6.0);
                }
                ui.separator();
                ui.small("Double-click a node header to open its inner diagram.");
            });
    }

    fn prefs_window(&mut self, ctx: &egui::Context) {
        if !self.show_prefs_window {
            return;
        }
        let mut open = true;
        egui::Window::new("Preferences")
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.checkbox(&mut self.prefs_edit.sidebar_open, "Show toolbar");
                ui.checkbox(&mut self.prefs_edit.show_grid, "Show background grid");
                ui.add(egui::Slider::new(&mut self.prefs_edit.zoom_min, 0.1..=1.0).text("Min zoom"));
                ui.add(egui::Slider::new(&mut self.prefs_edit.zoom_max, 1.0..=4.0).text("Max zoom"));
                ui.horizontal(|ui| {
                    ui.label("Pan with:");
                    ui.radio_value(&mut self.prefs_edit.pan_button, PanButton::Primary, "Left button");
                    ui.radio_value(&mut self.prefs_edit.pan_button, PanButton::Secondary, "Right button");
                });
                ui.add_space(8.0);
                ui.label("Settings save directory:");
                ui.monospace(AppSettings::settings_dir().display().to_string());
                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        self.prefs_edit.normalize();
                        match self.prefs_edit.save() {
                            Ok(path) => {
                                self.settings = self.prefs_edit.clone();
                                self.prefs_status = Some(format!("Saved to {}", path.display()));
                            }
                            Err(e) => {
                                log::warn!("failed to save settings: {e:#}");
                                self.prefs_status = Some(format!("Save failed: {e}"));
                            }
                        }
                    }
                    if ui.button("Revert").clicked() {
                        self.prefs_edit = self.settings.clone();
                        self.prefs_status = None;
                    }
                });
                if let Some(msg) = &self.prefs_status {
                    ui.small(msg.clone());
                }
            });
        if !open {
            self.show_prefs_window = false;
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let available = ui.available_rect_before_wrap();
        let mut events: Vec<CanvasEvent> = Vec::new();

        if self.controller.viewport().is_none() {
            events.push(CanvasEvent::Init(Viewport::default()));
        }
        if self.controller.container() != Some(available) {
            events.push(CanvasEvent::ContainerChanged(available));
        }
        self.dispatch(&ctx, std::mem::take(&mut events));

        let bg_resp = ui.allocate_rect(available, Sense::click_and_drag());
        let painter = ui.painter_at(available);
        let vp = self.viewport();
        let to_screen = move |p: Pos2| -> Pos2 { available.min + vp.to_local(p).to_vec2() };
        let to_world = move |p: Pos2| -> Pos2 { vp.project(p - available.min.to_vec2()) };

        if self.settings.show_grid {
            draw_grid(&painter, available, vp);
        }

        // Zoom with scroll only when pointer is over the canvas area
        if bg_resp.contains_pointer() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                if let Some(pointer) = ui.input(|i| i.pointer.hover_pos()) {
                    let factor = (1.0 + scroll * 0.001).clamp(0.9, 1.1);
                    let mut next = vp;
                    next.zoom_around(pointer - available.min.to_vec2(), factor, self.settings.zoom_min, self.settings.zoom_max);
                    events.push(CanvasEvent::ViewportChanged(next));
                }
            }
        }

        // Background panning
        let pan_button = match self.settings.pan_button {
            PanButton::Primary => egui::PointerButton::Primary,
            PanButton::Secondary => egui::PointerButton::Secondary,
        };
        if bg_resp.dragged_by(pan_button) {
            let delta = bg_resp.drag_delta();
            if delta != Vec2::ZERO {
                events.push(CanvasEvent::ViewportChanged(Viewport::new(vp.pan + delta, vp.zoom)));
            }
        }

        let Some(domain) = self.controller.active_domain() else { return };
        let nodes: Vec<Node> = domain.nodes.clone();
        let edges = domain.edges.clone();
        let selection = self.controller.selection();
        let screen_rect = |n: &Node| Rect::from_min_max(to_screen(n.position), to_screen(n.position + n.size));
        let source_port = |n: &Node| {
            let r = screen_rect(n);
            Pos2::new(r.center().x, r.bottom())
        };
        let target_port = |n: &Node| {
            let r = screen_rect(n);
            Pos2::new(r.center().x, r.top())
        };

        // Edges
        let mut edge_hit: Option<Selection> = None;
        let pointer_pos = ui.input(|i| i.pointer.latest_pos());
        for edge in &edges {
            let (Some(a), Some(b)) = (
                nodes.iter().find(|n| n.id == edge.source),
                nodes.iter().find(|n| n.id == edge.target),
            ) else {
                continue;
            };
            let (pa, pb) = (source_port(a), target_port(b));
            let is_sel = selection == Some(Selection::Edge(edge.id));
            let stroke = if is_sel { Stroke::new(2.5, ACCENT) } else { Stroke::new(1.5, Color32::GRAY) };
            painter.line_segment([pa, pb], stroke);
            painter.circle_filled(pb, 3.0, stroke.color);
            if let Some(p) = pointer_pos {
                if point_segment_distance(p, pa, pb) <= 6.0 {
                    edge_hit = Some(Selection::Edge(edge.id));
                }
            }
        }

        // Nodes
        let resizing = self.controller.is_resizing();
        for node in &nodes {
            let rect = screen_rect(node);
            let header = Rect::from_min_size(rect.min, Vec2::new(rect.width(), HEADER_HEIGHT.min(rect.height())));
            let header_resp = ui.interact(header, ui.id().with(("node_header", node.id)), Sense::click_and_drag());

            if header_resp.dragged_by(egui::PointerButton::Primary) && !resizing {
                let delta = header_resp.drag_delta() / vp.zoom;
                if delta != Vec2::ZERO {
                    events.push(CanvasEvent::NodesChanged(vec![NodeChange::Position { id: node.id, position: node.position + delta }]));
                }
            }
            if header_resp.double_clicked() {
                events.push(CanvasEvent::Enter(node.id));
            } else if header_resp.clicked() {
                events.push(CanvasEvent::Select(Some(Selection::Node(node.id))));
            }

            let is_sel = selection == Some(Selection::Node(node.id));
            let (fill, border) = match node.kind() {
                NodeKind::Structural => (STRUCTURAL_FILL, Color32::from_gray(200)),
                NodeKind::TextBlock => (TEXT_BLOCK_FILL, Color32::from_gray(80)),
            };
            let stroke = if is_sel { Stroke::new(2.0, ACCENT) } else { Stroke::new(2.0, border) };
            painter.rect_filled(rect, 8.0, fill);
            painter.rect_stroke(rect, 8.0, stroke, egui::StrokeKind::Inside);
            if node.kind() == NodeKind::TextBlock {
                painter.text(
                    header.left_center() + Vec2::new(10.0, 0.0),
                    egui::Align2::LEFT_CENTER,
                    node.caption(),
                    egui::FontId::proportional(13.0),
                    Color32::LIGHT_GRAY,
                );
            }

            // Node contents in a child ui clipped to the node body
            let inner = match node.kind() {
                NodeKind::Structural => rect.shrink(10.0),
                NodeKind::TextBlock => Rect::from_min_max(Pos2::new(rect.left(), header.bottom()), rect.max).shrink(8.0),
            };
            if inner.is_positive() {
                let mut child = ui.new_child(
                    egui::UiBuilder::new()
                        .id_salt(("node_body", node.id))
                        .max_rect(inner)
                        .layout(egui::Layout::top_down(egui::Align::Min)),
                );
                child.set_clip_rect(inner.intersect(available));
                let state = self.controller.interaction(node.id);
                node_view::show_node(&mut child, node, &state, &mut events);
            }

            // Connection handles: target on top, source at the bottom
            painter.circle_filled(target_port(node), PORT_RADIUS, Color32::from_gray(190));
            let src = source_port(node);
            let src_resp = ui.interact(
                Rect::from_center_size(src, Vec2::splat(PORT_RADIUS * 2.5)),
                ui.id().with(("source_port", node.id)),
                Sense::drag(),
            );
            painter.circle_filled(src, PORT_RADIUS, if src_resp.hovered() { ACCENT } else { Color32::from_gray(190) });
            if src_resp.drag_started() {
                self.connecting = Some(node.id);
            }

            // Resize affordance
            let grip = Rect::from_min_size(rect.max - Vec2::splat(RESIZE_HANDLE), Vec2::splat(RESIZE_HANDLE));
            let grip_resp = ui
                .interact(grip, ui.id().with(("resize", node.id)), Sense::drag())
                .on_hover_cursor(egui::CursorIcon::ResizeNwSe);
            painter.add(egui::Shape::convex_polygon(
                vec![grip.right_top(), grip.right_bottom(), grip.left_bottom()],
                ACCENT,
                Stroke::NONE,
            ));
            if grip_resp.drag_started_by(egui::PointerButton::Primary) {
                if let Some(origin) = ui.input(|i| i.pointer.press_origin()) {
                    events.push(CanvasEvent::Resize(PointerEvent::Down {
                        node: node.id,
                        pointer: to_world(origin),
                        size: node.size,
                        min_size: node.min_size(),
                    }));
                }
            }
        }

        // Pointer tracking for an active resize; only while a gesture is held
        if resizing {
            if ui.input(|i| i.pointer.primary_down()) {
                if let Some(p) = pointer_pos {
                    events.push(CanvasEvent::Resize(PointerEvent::Move { pointer: to_world(p) }));
                }
            } else {
                events.push(CanvasEvent::Resize(PointerEvent::Up));
            }
        }

        // In-flight connection
        if let Some(source) = self.connecting {
            let from = nodes.iter().find(|n| n.id == source).map(source_port);
            match (from, pointer_pos) {
                (Some(from), Some(p)) if ui.input(|i| i.pointer.primary_down()) => {
                    painter.line_segment([from, p], Stroke::new(1.5, ACCENT));
                }
                (_, Some(p)) => {
                    if let Some(target) = nodes.iter().rev().find(|n| n.id != source && screen_rect(*n).contains(p)) {
                        events.push(CanvasEvent::Connect { source, target: target.id });
                    }
                    self.connecting = None;
                }
                _ => self.connecting = None,
            }
        }

        // Drops from the toolbar
        let released = ctx.input(|i| i.pointer.any_released());
        if let Some(pointer) = dnd::release_point(released, ui.input(|i| i.pointer.interact_pos()), available) {
            if let Some(transfer) = egui::DragAndDrop::take_payload::<DataTransfer>(&ctx) {
                events.push(CanvasEvent::Drop { transfer: (*transfer).clone(), pointer });
            }
        }
        if egui::DragAndDrop::has_any_payload(&ctx) {
            if let (Some(preview), Some(p)) = (self.drag_preview, pointer_pos) {
                let layer = egui::LayerId::new(egui::Order::Tooltip, egui::Id::new("uml_loom_drag_preview"));
                ctx.layer_painter(layer)
                    .rect_filled(Rect::from_min_size(p + preview.offset, preview.size), 0.0, preview.color);
            }
        } else {
            self.drag_preview = None;
        }

        if bg_resp.clicked() {
            events.push(CanvasEvent::Select(edge_hit));
        }

        // Delete keys only when no text field owns the keyboard
        let typing = ctx.wants_keyboard_input();
        if !typing && ui.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            events.push(CanvasEvent::DeleteSelection);
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.connecting = None;
        }

        self.dispatch(&ctx, events);
        self.canvas_overlays(&ctx, available);
    }

    // Back affordance (nested domains only) and zoom controls
    fn canvas_overlays(&mut self, ctx: &egui::Context, available: Rect) {
        if self.controller.show_back() {
            egui::Area::new(egui::Id::new("uml_loom_back"))
                .fixed_pos(available.min + Vec2::new(12.0, 12.0))
                .show(ctx, |ui| {
                    if ui.button("⬅ Back").clicked() {
                        self.dispatch(ctx, vec![CanvasEvent::Back]);
                    }
                });
        }
        egui::Area::new(egui::Id::new("uml_loom_controls"))
            .fixed_pos(Pos2::new(available.left() + 12.0, available.bottom() - 110.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if ui.small_button("+").on_hover_text("Zoom in").clicked() {
                        self.zoom_by(ctx, 1.2);
                    }
                    if ui.small_button("−").on_hover_text("Zoom out").clicked() {
                        self.zoom_by(ctx, 1.0 / 1.2);
                    }
                    if ui.small_button("⛶").on_hover_text("Fit view").clicked() {
                        self.fit_view(ctx);
                    }
                });
            });
    }
}

impl eframe::App for DiagramApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.top_bar(ctx);
        if self.settings.sidebar_open {
            self.toolbar_panel(ctx);
        }
        self.prefs_window(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::from_gray(235)))
            .show(ctx, |ui| self.canvas(ui));
    }
}

fn draw_grid(painter: &egui::Painter, rect: Rect, vp: Viewport) {
    let step = 20.0 * vp.zoom;
    if step < 6.0 {
        return;
    }
    let dot = Color32::from_gray(190);
    let start_x = rect.left() + vp.pan.x.rem_euclid(step);
    let start_y = rect.top() + vp.pan.y.rem_euclid(step);
    let mut x = start_x;
    while x < rect.right() {
        let mut y = start_y;
        while y < rect.bottom() {
            painter.circle_filled(Pos2::new(x, y), 1.0, dot);
            y += step;
        }
        x += step;
    }
}

// Geometry helper: distance from point P to segment AB in screen space
fn point_segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = Vec2::new(p.x - a.x, p.y - a.y);
    let ab = Vec2::new(b.x - a.x, b.y - a.y);
    let ab_len2 = ab.x * ab.x + ab.y * ab.y;
    if ab_len2 <= f32::EPSILON {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    let t = ((ap.x * ab.x + ap.y * ab.y) / ab_len2).clamp(0.0, 1.0);
    let proj = Pos2::new(a.x + ab.x * t, a.y + ab.y * t);
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}
