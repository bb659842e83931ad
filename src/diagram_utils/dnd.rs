use egui::{Color32, Pos2, Rect, Vec2};

use super::domain::NodeKind;

pub const NODE_KIND_MIME: &str = "application/x-uml-loom-node";

/// String payload carried by a drag operation.
///
/// Only one field is ever written or read: the node kind to create.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataTransfer {
    entries: Vec<(String, String)>,
}

impl DataTransfer {
    pub fn new() -> Self { Self::default() }

    pub fn set_data(&mut self, format: &str, data: &str) {
        if let Some(slot) = self.entries.iter_mut().find(|(f, _)| f == format) {
            slot.1 = data.to_string();
        } else {
            self.entries.push((format.to_string(), data.to_string()));
        }
    }

    pub fn get_data(&self, format: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == format)
            .map(|(_, d)| d.as_str())
    }
}

// Stand-in for the native drag image: a 1x1 transparent box parked just off the pointer
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragPreview {
    pub size: Vec2,
    pub offset: Vec2,
    pub color: Color32,
}

impl DragPreview {
    pub fn transparent() -> Self {
        DragPreview { size: Vec2::splat(1.0), offset: Vec2::splat(-1.0), color: Color32::TRANSPARENT }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragOperation {
    pub transfer: DataTransfer,
    pub preview: DragPreview,
}

pub struct DragSource;

impl DragSource {
    pub fn start(kind: NodeKind) -> DragOperation {
        let mut transfer = DataTransfer::new();
        transfer.set_data(NODE_KIND_MIME, kind.token());
        DragOperation { transfer, preview: DragPreview::transparent() }
    }
}

// Read the node kind back on drop; a missing or unknown token means "not ours"
pub fn decode(transfer: &DataTransfer) -> Option<NodeKind> {
    transfer
        .get_data(NODE_KIND_MIME)
        .filter(|t| !t.is_empty())
        .and_then(NodeKind::from_token)
}

// A drop lands wherever the pointer is released inside the canvas, including over nodes
pub fn release_point(released: bool, pointer: Option<Pos2>, canvas: Rect) -> Option<Pos2> {
    pointer.filter(|p| released && canvas.contains(*p))
}
