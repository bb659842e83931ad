use std::ops::Range;

use egui::{Pos2, Vec2};

use super::domain::{NEW_PROPERTY_PLACEHOLDER, Node, NodeId, NodePayload};

pub const INDENT: &str = "    ";

/// Transient per-node UI state. Never stored in the domain model.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeInteraction {
    pub editing_label: bool,
    pub expanded: bool,
}

impl NodeInteraction {
    pub fn begin_label_edit(&mut self) { self.editing_label = true; }
    pub fn end_label_edit(&mut self) { self.editing_label = false; }
    pub fn toggle_expanded(&mut self) { self.expanded = !self.expanded; }
}

// Label and property edits write straight into the node; there is no draft copy.

pub fn set_label(node: &mut Node, text: &str) -> bool {
    match &mut node.payload {
        NodePayload::Structural { label, .. } => {
            label.clear();
            label.push_str(text);
            true
        }
        NodePayload::TextBlock { .. } => false,
    }
}

pub fn add_property(node: &mut Node) -> bool {
    match &mut node.payload {
        NodePayload::Structural { properties, .. } => {
            properties.push(NEW_PROPERTY_PLACEHOLDER.to_string());
            true
        }
        NodePayload::TextBlock { .. } => false,
    }
}

pub fn set_property(node: &mut Node, index: usize, text: &str) -> bool {
    match &mut node.payload {
        NodePayload::Structural { properties, .. } => match properties.get_mut(index) {
            Some(slot) => {
                slot.clear();
                slot.push_str(text);
                true
            }
            None => false,
        },
        NodePayload::TextBlock { .. } => false,
    }
}

pub fn set_text(node: &mut Node, new_text: &str) -> bool {
    match &mut node.payload {
        NodePayload::TextBlock { text } => {
            text.clear();
            text.push_str(new_text);
            true
        }
        NodePayload::Structural { .. } => false,
    }
}

// One number per newline-delimited line; an empty buffer still shows line 1.
pub fn line_numbers(text: &str) -> Range<usize> {
    1..text.split('\n').count() + 1
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Replace the char range `selection` with a four-space indent.
///
/// Returns the caret position right after the inserted indent.
pub fn insert_indent(text: &mut String, selection: Range<usize>) -> usize {
    let start = selection.start.min(selection.end);
    let end = selection.start.max(selection.end);
    let start_b = byte_offset(text, start);
    let end_b = byte_offset(text, end);
    text.replace_range(start_b..end_b, INDENT);
    text[..start_b].chars().count() + INDENT.chars().count()
}

/// One pointer-down to pointer-up resize interaction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResizeGesture {
    origin: Pos2,
    start_size: Vec2,
    min_size: Vec2,
}

impl ResizeGesture {
    pub fn begin(origin: Pos2, start_size: Vec2, min_size: Vec2) -> Self {
        ResizeGesture { origin, start_size, min_size }
    }

    pub fn size_at(&self, pointer: Pos2) -> Vec2 {
        let delta = pointer - self.origin;
        Vec2::new(
            (self.start_size.x + delta.x).max(self.min_size.x),
            (self.start_size.y + delta.y).max(self.min_size.y),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PointerEvent {
    // Pointer pressed on a node's resize affordance
    Down { node: NodeId, pointer: Pos2, size: Vec2, min_size: Vec2 },
    Move { pointer: Pos2 },
    Up,
}

/// Owns the single in-flight resize gesture.
///
/// Move/up handling only exists while a gesture is held; `Up` takes it out exactly once.
#[derive(Clone, Debug, Default)]
pub struct ResizeTracker {
    active: Option<(NodeId, ResizeGesture)>,
}

impl ResizeTracker {
    pub fn is_active(&self) -> bool { self.active.is_some() }

    pub fn active_node(&self) -> Option<NodeId> { self.active.map(|(id, _)| id) }

    // Returns the node and its new size for Move events; None otherwise
    pub fn handle(&mut self, event: PointerEvent) -> Option<(NodeId, Vec2)> {
        match event {
            PointerEvent::Down { node, pointer, size, min_size } => {
                if let Some((stale, _)) = self.active.replace((node, ResizeGesture::begin(pointer, size, min_size))) {
                    log::debug!("discarding unfinished resize of node {}", stale);
                }
                None
            }
            PointerEvent::Move { pointer } => {
                self.active.map(|(node, gesture)| (node, gesture.size_at(pointer)))
            }
            PointerEvent::Up => {
                self.active.take();
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }
}
