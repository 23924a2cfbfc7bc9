//! Bitset-backed views over the base graph.
//!
//! A view owns two roaring bitmaps (nodes, edges) and stays coherent
//! under base-graph mutation: removing a base element clears its bit in
//! every live view, and views configured to auto-include pick up new
//! elements whose endpoints they contain. View slot ids are recycled
//! through a smallest-first heap, like node and edge slots.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use roaring::RoaringBitmap;

use crate::error::{Error, Result};
use crate::graph::adjacency::Direction;
use crate::graph::edge::EdgeStore;
use crate::graph::node::NodeStore;

/// Handle of a view created on a graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) u32);

impl ViewId {
    /// The raw view slot.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// One view's bitsets and configuration.
#[derive(Debug)]
pub(crate) struct ViewState {
    pub(crate) store_id: u32,
    pub(crate) node_bits: RoaringBitmap,
    pub(crate) edge_bits: RoaringBitmap,
    pub(crate) auto_include: bool,
    pub(crate) node_view_only: bool,
}

impl ViewState {
    fn new(store_id: u32, auto_include: bool, node_view_only: bool) -> Self {
        Self {
            store_id,
            node_bits: RoaringBitmap::new(),
            edge_bits: RoaringBitmap::new(),
            auto_include,
            node_view_only,
        }
    }

    pub(crate) fn contains_node(&self, slot: u32) -> bool {
        self.node_bits.contains(slot)
    }

    /// Edge membership. Node-only views derive it from the endpoints.
    pub(crate) fn contains_edge(&self, edges: &EdgeStore, slot: u32) -> bool {
        if self.node_view_only {
            return edges.get(slot).is_some_and(|record| {
                self.node_bits.contains(record.source) && self.node_bits.contains(record.target)
            });
        }
        self.edge_bits.contains(slot)
    }

    pub(crate) fn node_count(&self) -> u64 {
        self.node_bits.len()
    }

    pub(crate) fn edge_count(&self, edges: &EdgeStore) -> u64 {
        if self.node_view_only {
            return edges
                .iter()
                .filter(|record| {
                    self.node_bits.contains(record.source)
                        && self.node_bits.contains(record.target)
                })
                .count() as u64;
        }
        self.edge_bits.len()
    }

    /// Count of view edges incident to the node.
    ///
    /// Recomputed on read; the observable contract is agreement with the
    /// edge bitset, not a caching strategy.
    pub(crate) fn degree(&self, nodes: &NodeStore, edges: &EdgeStore, node_slot: u32) -> u32 {
        let Some(node) = nodes.get(node_slot) else {
            return 0;
        };
        let incident = edges.edges_of(node, Direction::Both, None);
        u32::try_from(
            incident
                .iter()
                .filter(|record| self.contains_edge(edges, record.store_id))
                .count(),
        )
        .expect("view degree overflow")
    }
}

/// The store of views, with slot recycling.
#[derive(Debug, Default)]
pub(crate) struct ViewStore {
    views: Vec<Option<ViewState>>,
    free: BinaryHeap<Reverse<u32>>,
}

impl ViewStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&mut self, auto_include: bool, node_view_only: bool) -> u32 {
        let slot = match self.free.pop() {
            Some(Reverse(slot)) => slot,
            None => u32::try_from(self.views.len()).expect("view slot overflow"),
        };
        let index = slot as usize;
        if self.views.len() <= index {
            self.views.resize_with(index + 1, || None);
        }
        self.views[index] = Some(ViewState::new(slot, auto_include, node_view_only));
        slot
    }

    /// Destroys a view; its slot is recycled and further operations on
    /// the handle fail with [`Error::NotOwned`].
    pub(crate) fn destroy(&mut self, id: u32) -> Result<()> {
        let slot = self
            .views
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(Error::NotOwned("view"))?;
        debug_assert_eq!(slot.store_id, id);
        self.free.push(Reverse(id));
        Ok(())
    }

    pub(crate) fn state(&self, id: u32) -> Result<&ViewState> {
        self.views
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::NotOwned("view"))
    }

    pub(crate) fn state_mut(&mut self, id: u32) -> Result<&mut ViewState> {
        self.views
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(Error::NotOwned("view"))
    }

    pub(crate) fn add_node(&mut self, id: u32, node_slot: u32) -> Result<bool> {
        Ok(self.state_mut(id)?.node_bits.insert(node_slot))
    }

    /// Clears the node bit and every incident edge bit.
    pub(crate) fn remove_node(
        &mut self,
        id: u32,
        nodes: &NodeStore,
        edges: &EdgeStore,
        node_slot: u32,
    ) -> Result<bool> {
        let incident: Vec<u32> = nodes
            .get(node_slot)
            .map(|node| {
                edges
                    .edges_of(node, Direction::Both, None)
                    .iter()
                    .map(|record| record.store_id)
                    .collect()
            })
            .unwrap_or_default();
        let view = self.state_mut(id)?;
        for edge_slot in incident {
            view.edge_bits.remove(edge_slot);
        }
        Ok(view.node_bits.remove(node_slot))
    }

    /// Sets an edge bit; both endpoints must already be in the view.
    pub(crate) fn add_edge(&mut self, id: u32, edges: &EdgeStore, edge_slot: u32) -> Result<bool> {
        let record = edges.get(edge_slot).ok_or(Error::NotOwned("edge"))?;
        let (source, target) = (record.source, record.target);
        let view = self.state_mut(id)?;
        if view.node_view_only {
            return Err(Error::UnsupportedType(
                "edge operation on a node-only view".to_string(),
            ));
        }
        if !view.node_bits.contains(source) || !view.node_bits.contains(target) {
            return Err(Error::ViewClosure);
        }
        Ok(view.edge_bits.insert(edge_slot))
    }

    pub(crate) fn remove_edge(&mut self, id: u32, edge_slot: u32) -> Result<bool> {
        Ok(self.state_mut(id)?.edge_bits.remove(edge_slot))
    }

    /// Unions another view into `id`.
    pub(crate) fn union(&mut self, id: u32, other: u32) -> Result<()> {
        let (other_nodes, other_edges) = {
            let other = self.state(other)?;
            (other.node_bits.clone(), other.edge_bits.clone())
        };
        let view = self.state_mut(id)?;
        view.node_bits |= other_nodes;
        view.edge_bits |= other_edges;
        Ok(())
    }

    /// Intersects another view into `id`.
    pub(crate) fn intersection(&mut self, id: u32, other: u32) -> Result<()> {
        let (other_nodes, other_edges) = {
            let other = self.state(other)?;
            (other.node_bits.clone(), other.edge_bits.clone())
        };
        let view = self.state_mut(id)?;
        view.node_bits &= other_nodes;
        view.edge_bits &= other_edges;
        Ok(())
    }

    /// Fills the view with every live base element.
    pub(crate) fn fill(&mut self, id: u32, nodes: &NodeStore, edges: &EdgeStore) -> Result<()> {
        let view = self.state_mut(id)?;
        view.node_bits = nodes.iter().map(|record| record.store_id).collect();
        if !view.node_view_only {
            view.edge_bits = edges.iter().map(|record| record.store_id).collect();
        }
        Ok(())
    }

    /// Complements the node set within the base and re-derives the edge
    /// set under the closure invariant.
    pub(crate) fn not(&mut self, id: u32, nodes: &NodeStore, edges: &EdgeStore) -> Result<()> {
        let view = self.state_mut(id)?;
        let mut complement = RoaringBitmap::new();
        for record in nodes.iter() {
            if !view.node_bits.contains(record.store_id) {
                complement.insert(record.store_id);
            }
        }
        view.node_bits = complement;
        view.edge_bits.clear();
        if !view.node_view_only {
            for record in edges.iter() {
                if view.node_bits.contains(record.source) && view.node_bits.contains(record.target)
                {
                    view.edge_bits.insert(record.store_id);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self, id: u32) -> Result<()> {
        let view = self.state_mut(id)?;
        view.node_bits.clear();
        view.edge_bits.clear();
        Ok(())
    }

    // =========================================================================
    // Base-mutation notifications, invoked under the write ticket
    // =========================================================================

    pub(crate) fn on_node_added(&mut self, node_slot: u32) {
        for view in self.views.iter_mut().flatten() {
            if view.auto_include {
                view.node_bits.insert(node_slot);
            }
        }
    }

    pub(crate) fn on_node_removed(&mut self, node_slot: u32) {
        for view in self.views.iter_mut().flatten() {
            view.node_bits.remove(node_slot);
        }
    }

    pub(crate) fn on_edge_added(&mut self, edge_slot: u32, source: u32, target: u32) {
        for view in self.views.iter_mut().flatten() {
            if view.auto_include
                && !view.node_view_only
                && view.node_bits.contains(source)
                && view.node_bits.contains(target)
            {
                view.edge_bits.insert(edge_slot);
            }
        }
    }

    pub(crate) fn on_edge_removed(&mut self, edge_slot: u32) {
        for view in self.views.iter_mut().flatten() {
            view.edge_bits.remove(edge_slot);
        }
    }

    pub(crate) fn on_cleared(&mut self) {
        for view in self.views.iter_mut().flatten() {
            view.node_bits.clear();
            view.edge_bits.clear();
        }
    }

    pub(crate) fn on_edges_cleared(&mut self) {
        for view in self.views.iter_mut().flatten() {
            view.edge_bits.clear();
        }
    }

    /// Number of live views.
    pub(crate) fn len(&self) -> usize {
        self.views.iter().flatten().count()
    }
}
