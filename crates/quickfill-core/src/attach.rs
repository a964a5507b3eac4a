use crate::config::{ATTACHED_MARKER, SWEEP_INTERVAL};
use crate::discovery::{discover, discover_under};
use crate::surface::Surface;
use quickfill_dom::{Document, NodeId};
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Keeps every current and future surface bound exactly once.
///
/// A surface moves `unbound -> bound` the first time a sweep sees it and
/// never transitions back; a node that leaves the document simply stops
/// producing events and its stale registry entry is skipped lazily. Two
/// independent schedules feed the same idempotent sweep: the periodic one
/// (driven through [`sweep_due`]) and an immediate one on observed body
/// mutations, so single-page apps that replace whole subtrees are picked up
/// without waiting out the interval.
///
/// [`sweep_due`]: AttachmentManager::sweep_due
pub struct AttachmentManager {
    bound: HashMap<NodeId, Surface>,
    last_sweep: Option<Instant>,
}

impl AttachmentManager {
    pub fn new() -> Self {
        AttachmentManager {
            bound: HashMap::new(),
            last_sweep: None,
        }
    }

    /// Whether the periodic schedule calls for a sweep.
    pub fn sweep_due(&self, now: Instant) -> bool {
        match self.last_sweep {
            None => true,
            Some(last) => now.duration_since(last) >= SWEEP_INTERVAL,
        }
    }

    /// Binds every discovered surface that is not yet bound. Safe to call
    /// redundantly from any schedule; returns how many surfaces were newly
    /// bound.
    pub fn sweep(&mut self, doc: &mut dyn Document, now: Instant) -> usize {
        self.last_sweep = Some(now);
        let surfaces = discover(doc);
        self.bind_new(doc, surfaces)
    }

    /// Incremental sweep scoped to one subtree, used when the host can name
    /// the root of an observed mutation. Does not reset the periodic
    /// schedule, since the rest of the document went unscanned.
    pub fn bind_under(&mut self, doc: &mut dyn Document, root: NodeId) -> usize {
        let surfaces = discover_under(doc, root);
        self.bind_new(doc, surfaces)
    }

    fn bind_new(&mut self, doc: &mut dyn Document, surfaces: Vec<Surface>) -> usize {
        let mut added = 0;
        for surface in surfaces {
            if self.bound.contains_key(&surface.node) {
                continue;
            }
            doc.set_attribute(surface.node, ATTACHED_MARKER, "true");
            self.bound.insert(surface.node, surface);
            added += 1;
        }
        if added > 0 {
            debug!(added, total = self.bound.len(), "bound new surfaces");
        }
        added
    }

    /// Registry lookup for event routing; `None` for unbound nodes.
    pub fn surface(&self, node: NodeId) -> Option<Surface> {
        self.bound.get(&node).copied()
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.bound.contains_key(&node)
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    /// Deadline of the next periodic sweep.
    pub fn next_sweep(&self) -> Option<Instant> {
        self.last_sweep.map(|last| last + SWEEP_INTERVAL)
    }
}

impl Default for AttachmentManager {
    fn default() -> Self {
        Self::new()
    }
}
