use eframe::egui::{self, Color32, RichText, Sense};

use crate::diagram_utils::controller::CanvasEvent;
use crate::diagram_utils::domain::{Node, NodeId, NodePayload};
use crate::diagram_utils::interaction::{self, NodeInteraction};

pub const HEADER_HEIGHT: f32 = 30.0;
pub const RESIZE_HANDLE: f32 = 16.0;
pub const PORT_RADIUS: f32 = 6.0;

// Stable id of a text-block's editor so the caret can be moved after an indent
pub fn code_editor_id(node: NodeId) -> egui::Id {
    egui::Id::new(("uml_loom_code", node))
}

/// Draw a node's interactive contents into `ui`, which is already clipped to the node body.
///
/// Nothing is mutated here; every edit is pushed as a `CanvasEvent`.
pub fn show_node(ui: &mut egui::Ui, node: &Node, state: &NodeInteraction, events: &mut Vec<CanvasEvent>) {
    match &node.payload {
        NodePayload::Structural { label, properties } => {
            structural_body(ui, node.id, label, properties, state, events)
        }
        NodePayload::TextBlock { text } => text_block_body(ui, node.id, text, events),
    }
}

fn structural_body(
    ui: &mut egui::Ui,
    id: NodeId,
    label: &str,
    properties: &[String],
    state: &NodeInteraction,
    events: &mut Vec<CanvasEvent>,
) {
    ui.horizontal(|ui| {
        let toggle_w = 24.0;
        if state.editing_label {
            let mut buf = label.to_string();
            let resp = ui.add(
                egui::TextEdit::singleline(&mut buf)
                    .desired_width((ui.available_width() - toggle_w).max(40.0)),
            );
            if resp.changed() {
                events.push(CanvasEvent::EditLabel { node: id, text: buf });
            }
            if resp.lost_focus() {
                events.push(CanvasEvent::EndLabelEdit(id));
            } else if !resp.has_focus() {
                resp.request_focus();
            }
        } else {
            let caption = if label.is_empty() { " " } else { label };
            let resp = ui
                .add(egui::Label::new(RichText::new(caption).strong().color(Color32::BLACK)).sense(Sense::click()))
                .on_hover_cursor(egui::CursorIcon::Text);
            if resp.clicked() {
                events.push(CanvasEvent::BeginLabelEdit(id));
            }
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let arrow = if state.expanded { "▼" } else { "▶" };
            if ui.small_button(arrow).on_hover_text("Show properties").clicked() {
                events.push(CanvasEvent::ToggleExpanded(id));
            }
        });
    });

    if !state.expanded {
        return;
    }
    ui.separator();
    egui::ScrollArea::vertical()
        .id_salt(("uml_loom_props", id))
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for (index, prop) in properties.iter().enumerate() {
                let mut buf = prop.clone();
                let resp = ui.add(egui::TextEdit::singleline(&mut buf).desired_width(f32::INFINITY));
                if resp.changed() {
                    events.push(CanvasEvent::EditProperty { node: id, index, text: buf });
                }
            }
            if ui.link("+ Add Property").clicked() {
                events.push(CanvasEvent::AddProperty(id));
            }
        });
}

fn text_block_body(ui: &mut egui::Ui, id: NodeId, text: &str, events: &mut Vec<CanvasEvent>) {
    let editor_id = code_editor_id(id);

    // Tab indents instead of moving focus; consume it before the editor sees it
    let focused = ui.memory(|m| m.has_focus(editor_id));
    if focused && ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Tab)) {
        let len = text.chars().count();
        let selection = egui::text_edit::TextEditState::load(ui.ctx(), editor_id)
            .and_then(|s| s.cursor.char_range())
            .map(|r| {
                let [a, b] = r.sorted_cursors();
                a.index..b.index
            })
            .unwrap_or(len..len);
        events.push(CanvasEvent::IndentText { node: id, selection });
    }

    let numbers = interaction::line_numbers(text)
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    egui::ScrollArea::both()
        .id_salt(("uml_loom_code_scroll", id))
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.horizontal_top(|ui| {
                ui.add(
                    egui::Label::new(RichText::new(numbers).monospace().color(Color32::GRAY))
                        .selectable(false),
                );
                let mut buf = text.to_string();
                let resp = ui.add(
                    egui::TextEdit::multiline(&mut buf)
                        .id(editor_id)
                        .code_editor()
                        .lock_focus(true)
                        .frame(false)
                        .margin(egui::Margin::ZERO)
                        .text_color(Color32::WHITE)
                        .desired_width(f32::INFINITY),
                );
                if resp.changed() {
                    events.push(CanvasEvent::EditText { node: id, text: buf });
                }
            });
        });
}
