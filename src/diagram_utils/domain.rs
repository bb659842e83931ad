use std::collections::HashMap;
use std::fmt;

use egui::{Pos2, Vec2};
use uuid::Uuid;

// Basic type aliases for clarity
pub type NodeId = Uuid;
pub type EdgeId = Uuid;

pub const STRUCTURAL_MIN_SIZE: Vec2 = Vec2::new(200.0, 100.0);
pub const TEXT_BLOCK_MIN_SIZE: Vec2 = Vec2::new(300.0, 200.0);

pub const NEW_PROPERTY_PLACEHOLDER: &str = "New Property";
pub const TEXT_BLOCK_PLACEHOLDER: &str = "fn main() {\n    println!(\"Hello, diagram!\");\n}";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Structural,
    TextBlock,
}

impl NodeKind {
    pub const ALL: [NodeKind; 2] = [NodeKind::Structural, NodeKind::TextBlock];

    pub fn token(self) -> &'static str {
        match self {
            NodeKind::Structural => "structural",
            NodeKind::TextBlock => "text-block",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "structural" => Some(NodeKind::Structural),
            "text-block" => Some(NodeKind::TextBlock),
            _ => None,
        }
    }

    pub fn min_size(self) -> Vec2 {
        match self {
            NodeKind::Structural => STRUCTURAL_MIN_SIZE,
            NodeKind::TextBlock => TEXT_BLOCK_MIN_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
    Structural { label: String, properties: Vec<String> },
    TextBlock { text: String },
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Structural { .. } => NodeKind::Structural,
            NodePayload::TextBlock { .. } => NodeKind::TextBlock,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Pos2,
    pub size: Vec2,
    pub payload: NodePayload,
}

impl Node {
    // Fresh node with a time-ordered id and the kind's default size and payload.
    // `ordinal` numbers the default label of structural nodes.
    pub fn new_default(kind: NodeKind, position: Pos2, ordinal: usize) -> Self {
        let payload = match kind {
            NodeKind::Structural => NodePayload::Structural {
                label: format!("Node {}", ordinal),
                properties: Vec::new(),
            },
            NodeKind::TextBlock => NodePayload::TextBlock {
                text: TEXT_BLOCK_PLACEHOLDER.to_string(),
            },
        };
        Node { id: Uuid::now_v7(), position, size: kind.min_size(), payload }
    }

    pub fn kind(&self) -> NodeKind { self.payload.kind() }

    pub fn min_size(&self) -> Vec2 { self.kind().min_size() }

    // Caption used by the canvas header and the breadcrumb trail.
    pub fn caption(&self) -> &str {
        match &self.payload {
            NodePayload::Structural { label, .. } => label,
            NodePayload::TextBlock { .. } => "Code",
        }
    }

    pub fn set_size_clamped(&mut self, size: Vec2) {
        self.size = size.max(self.min_size());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Edge { id: Uuid::now_v7(), source, target }
    }
}

/// Identity of a diagram domain.
///
/// A child id is derived from the node it was entered from, so entering the
/// same node again always resolves to the same domain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DomainId {
    Root,
    Child(NodeId),
}

impl DomainId {
    pub fn for_node(node: NodeId) -> Self { DomainId::Child(node) }

    pub fn is_root(&self) -> bool { matches!(self, DomainId::Root) }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainId::Root => write!(f, "root"),
            DomainId::Child(node) => write!(f, "domain-{}", node),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub id: DomainId,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    // Node (in some ancestor domain) this domain was entered from; None only for the root
    pub entered_from: Option<NodeId>,
}

impl Domain {
    fn new(id: DomainId, entered_from: Option<NodeId>) -> Self {
        Domain { id, nodes: Vec::new(), edges: Vec::new(), entered_from }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool { self.node(id).is_some() }

    pub fn has_edge_between(&self, source: NodeId, target: NodeId) -> bool {
        self.edges.iter().any(|e| e.source == source && e.target == target)
    }
}

/// Incremental node change produced by the canvas.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
    Add(Node),
    Position { id: NodeId, position: Pos2 },
    Dimensions { id: NodeId, size: Vec2 },
    Remove { id: NodeId },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
    Add(Edge),
    Remove { id: EdgeId },
}

#[derive(Clone, Debug)]
pub struct DomainStore {
    domains: HashMap<DomainId, Domain>,
}

impl Default for DomainStore {
    fn default() -> Self { Self::new() }
}

impl DomainStore {
    // Instantiate a store holding only the empty root domain
    pub fn new() -> Self {
        let mut domains = HashMap::new();
        domains.insert(DomainId::Root, Domain::new(DomainId::Root, None));
        DomainStore { domains }
    }

    // Insert an empty domain; repeated requests for the same id are no-ops
    pub fn create_domain(&mut self, id: DomainId, entered_from: Option<NodeId>) -> bool {
        if self.domains.contains_key(&id) {
            return false;
        }
        self.domains.insert(id, Domain::new(id, entered_from));
        true
    }

    pub fn add_node(&mut self, domain: DomainId, node: Node) -> bool {
        if let Some(d) = self.domains.get_mut(&domain) {
            d.nodes.push(node);
            true
        } else {
            false
        }
    }

    pub fn add_edge(&mut self, domain: DomainId, edge: Edge) -> bool {
        if let Some(d) = self.domains.get_mut(&domain) {
            d.edges.push(edge);
            true
        } else {
            false
        }
    }

    // Apply a node change set to one domain. Returns the ids of nodes that were removed.
    pub fn apply_node_changes(&mut self, domain: DomainId, changes: &[NodeChange]) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for change in changes {
            let Some(d) = self.domains.get_mut(&domain) else { return removed };
            match change {
                NodeChange::Add(node) => d.nodes.push(node.clone()),
                NodeChange::Position { id, position } => {
                    if let Some(n) = d.node_mut(*id) {
                        n.position = *position;
                    }
                }
                NodeChange::Dimensions { id, size } => {
                    if let Some(n) = d.node_mut(*id) {
                        n.set_size_clamped(*size);
                    }
                }
                NodeChange::Remove { id } => {
                    if self.remove_node(domain, *id) {
                        removed.push(*id);
                    }
                }
            }
        }
        removed
    }

    pub fn apply_edge_changes(&mut self, domain: DomainId, changes: &[EdgeChange]) {
        let Some(d) = self.domains.get_mut(&domain) else { return };
        for change in changes {
            match change {
                EdgeChange::Add(edge) => d.edges.push(edge.clone()),
                EdgeChange::Remove { id } => d.edges.retain(|e| e.id != *id),
            }
        }
    }

    // Remove a node, its incident edges and every domain nested beneath it
    pub fn remove_node(&mut self, domain: DomainId, id: NodeId) -> bool {
        let Some(d) = self.domains.get_mut(&domain) else { return false };
        let before = d.nodes.len();
        d.nodes.retain(|n| n.id != id);
        if d.nodes.len() == before {
            return false;
        }
        d.edges.retain(|e| e.source != id && e.target != id);
        self.prune_subtree(id);
        true
    }

    // Drop the child domain owned by `owner` and, recursively, its own children
    fn prune_subtree(&mut self, owner: NodeId) {
        let mut pending = vec![owner];
        while let Some(node) = pending.pop() {
            if let Some(child) = self.domains.remove(&DomainId::for_node(node)) {
                log::debug!("pruned orphaned domain {}", child.id);
                pending.extend(child.nodes.iter().map(|n| n.id));
            }
        }
    }

    pub fn domain(&self, id: DomainId) -> Option<&Domain> { self.domains.get(&id) }
    pub fn domain_mut(&mut self, id: DomainId) -> Option<&mut Domain> { self.domains.get_mut(&id) }
    pub fn contains(&self, id: DomainId) -> bool { self.domains.contains_key(&id) }
    pub fn len(&self) -> usize { self.domains.len() }
    pub fn is_empty(&self) -> bool { self.domains.is_empty() }

    pub fn node(&self, domain: DomainId, id: NodeId) -> Option<&Node> {
        self.domains.get(&domain).and_then(|d| d.node(id))
    }

    pub fn node_mut(&mut self, domain: DomainId, id: NodeId) -> Option<&mut Node> {
        self.domains.get_mut(&domain).and_then(|d| d.node_mut(id))
    }

    // Find the domain that owns a node
    pub fn domain_containing(&self, id: NodeId) -> Option<DomainId> {
        self.domains
            .values()
            .find(|d| d.contains_node(id))
            .map(|d| d.id)
    }
}
