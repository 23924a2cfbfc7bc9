//! Change observers.
//!
//! An observer snapshots the version counters at creation and answers
//! "has the graph changed" by comparing the snapshot to the live
//! counters, without taking the lock. Diff-tracking observers also
//! accumulate the node and edge slots added and removed since the last
//! poll; the buffers drain on each poll.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// The structural changes accumulated since the previous poll.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GraphDiff {
    /// Slots of nodes added.
    pub added_nodes: Vec<u32>,
    /// Slots of nodes removed.
    pub removed_nodes: Vec<u32>,
    /// Slots of edges added.
    pub added_edges: Vec<u32>,
    /// Slots of edges removed.
    pub removed_edges: Vec<u32>,
}

impl GraphDiff {
    /// Returns true when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

#[derive(Debug, Default)]
struct DiffBuffer {
    added_nodes: Vec<u32>,
    removed_nodes: Vec<u32>,
    added_edges: Vec<u32>,
    removed_edges: Vec<u32>,
}

/// State shared between an observer handle and the store registry.
#[derive(Debug)]
pub(crate) struct ObserverShared {
    node_snapshot: AtomicU64,
    edge_snapshot: AtomicU64,
    alive: AtomicBool,
    diff: Option<Mutex<DiffBuffer>>,
}

impl ObserverShared {
    fn new(node_version: u64, edge_version: u64, with_diff: bool) -> Self {
        Self {
            node_snapshot: AtomicU64::new(node_version),
            edge_snapshot: AtomicU64::new(edge_version),
            alive: AtomicBool::new(true),
            diff: with_diff.then(|| Mutex::new(DiffBuffer::default())),
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub(crate) fn mark_dead(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Compares the snapshot to the live counters and refreshes it.
    ///
    /// Lock-free: a concurrent mutation may be missed this poll but is
    /// reported on the next one.
    pub(crate) fn changed(&self, node_version: u64, edge_version: u64) -> bool {
        let node_changed = self.node_snapshot.swap(node_version, Ordering::AcqRel) != node_version;
        let edge_changed = self.edge_snapshot.swap(edge_version, Ordering::AcqRel) != edge_version;
        node_changed || edge_changed
    }

    /// Drains the accumulated diff. Empty for observers created without
    /// diff tracking.
    pub(crate) fn drain_diff(&self) -> GraphDiff {
        let Some(diff) = &self.diff else {
            return GraphDiff::default();
        };
        let mut buffer = diff.lock();
        GraphDiff {
            added_nodes: std::mem::take(&mut buffer.added_nodes),
            removed_nodes: std::mem::take(&mut buffer.removed_nodes),
            added_edges: std::mem::take(&mut buffer.added_edges),
            removed_edges: std::mem::take(&mut buffer.removed_edges),
        }
    }
}

/// Handle to an observer registered on a graph store.
///
/// Destroy it through the store to stop diff accumulation; a dropped but
/// undestroyed handle keeps accumulating until the store is dropped.
#[derive(Debug)]
pub struct GraphObserver {
    pub(crate) shared: Arc<ObserverShared>,
}

/// The store-side observer list, updated under the write ticket.
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<Arc<ObserverShared>>,
}

impl ObserverRegistry {
    pub(crate) fn register(
        &mut self,
        node_version: u64,
        edge_version: u64,
        with_diff: bool,
    ) -> Arc<ObserverShared> {
        let shared = Arc::new(ObserverShared::new(node_version, edge_version, with_diff));
        self.observers.push(Arc::clone(&shared));
        shared
    }

    /// Removes an observer from the list and marks it dead.
    pub(crate) fn unregister(&mut self, shared: &Arc<ObserverShared>) -> bool {
        let before = self.observers.len();
        self.observers
            .retain(|candidate| !Arc::ptr_eq(candidate, shared));
        if self.observers.len() < before {
            shared.mark_dead();
            true
        } else {
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    fn record(&self, push: impl Fn(&mut DiffBuffer)) {
        for observer in &self.observers {
            if let Some(diff) = &observer.diff {
                push(&mut diff.lock());
            }
        }
    }

    pub(crate) fn record_node_added(&self, slot: u32) {
        self.record(|buffer| buffer.added_nodes.push(slot));
    }

    pub(crate) fn record_node_removed(&self, slot: u32) {
        self.record(|buffer| buffer.removed_nodes.push(slot));
    }

    pub(crate) fn record_edge_added(&self, slot: u32) {
        self.record(|buffer| buffer.added_edges.push(slot));
    }

    pub(crate) fn record_edge_removed(&self, slot: u32) {
        self.record(|buffer| buffer.removed_edges.push(slot));
    }
}
