use super::domain::{DomainId, DomainStore, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackOutcome {
    // Already at the root; nothing to do
    AtRoot,
    Moved(DomainId),
    // The active domain's back-reference names a node no domain contains
    Unresolved(NodeId),
}

/// Tracks which domain the canvas is showing and moves between nested domains.
#[derive(Clone, Debug)]
pub struct DomainNavigator {
    active: DomainId,
}

impl Default for DomainNavigator {
    fn default() -> Self { Self::new() }
}

impl DomainNavigator {
    pub fn new() -> Self {
        DomainNavigator { active: DomainId::Root }
    }

    pub fn active(&self) -> DomainId { self.active }

    pub fn reset(&mut self) {
        self.active = DomainId::Root;
    }

    /// Drill into `node`, creating its domain on first entry.
    ///
    /// Returns true when a new domain was created.
    pub fn enter(&mut self, store: &mut DomainStore, node: NodeId) -> bool {
        let child = DomainId::for_node(node);
        let created = store.create_domain(child, Some(node));
        if created {
            log::info!("created domain {} for node {}", child, node);
        }
        self.active = child;
        created
    }

    pub fn back(&mut self, store: &DomainStore) -> BackOutcome {
        if self.active.is_root() {
            return BackOutcome::AtRoot;
        }
        let entered_from = store.domain(self.active).and_then(|d| d.entered_from);
        let Some(owner) = entered_from else {
            // A non-root domain without a back-reference (or missing entirely) cannot be left
            log::warn!("domain {} has no back-reference; staying put", self.active);
            return match self.active {
                DomainId::Child(node) => BackOutcome::Unresolved(node),
                DomainId::Root => BackOutcome::AtRoot,
            };
        };
        match store.domain_containing(owner) {
            Some(parent) => {
                self.active = parent;
                BackOutcome::Moved(parent)
            }
            None => {
                log::warn!(
                    "inconsistent domain tree: node {} referenced by {} is not in any domain",
                    owner,
                    self.active
                );
                BackOutcome::Unresolved(owner)
            }
        }
    }

    // Path from the root down to the active domain. Stops early on a broken link.
    pub fn breadcrumb(&self, store: &DomainStore) -> Vec<DomainId> {
        let mut trail = vec![self.active];
        let mut cursor = self.active;
        while let Some(owner) = store.domain(cursor).and_then(|d| d.entered_from) {
            match store.domain_containing(owner) {
                Some(parent) if !trail.contains(&parent) => {
                    trail.push(parent);
                    cursor = parent;
                }
                _ => break,
            }
        }
        trail.reverse();
        trail
    }
}
