//! Node records and the dense node store.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::attr::value::{AttrValue, ValueKey};
use crate::error::{Error, Result};
use crate::graph::adjacency::{AdjacencyHeads, NIL};
use crate::graph::type_table::TypeId;

/// A node in the graph.
///
/// Holds the user id, the stable slot index, per-type adjacency heads,
/// cached degrees, and the attribute value array.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub(crate) id: AttrValue,
    pub(crate) store_id: u32,
    pub(crate) heads: Vec<AdjacencyHeads>,
    pub(crate) self_loop_head: i32,
    pub(crate) out_degree: u32,
    pub(crate) in_degree: u32,
    pub(crate) undirected_degree: u32,
    pub(crate) mutual_count: u32,
    pub(crate) self_loop_count: u32,
    pub(crate) attrs: Vec<Option<AttrValue>>,
}

impl NodeRecord {
    fn new(id: AttrValue, store_id: u32) -> Self {
        Self {
            id,
            store_id,
            heads: Vec::new(),
            self_loop_head: NIL,
            out_degree: 0,
            in_degree: 0,
            undirected_degree: 0,
            mutual_count: 0,
            self_loop_count: 0,
            attrs: Vec::new(),
        }
    }

    /// The user id.
    #[must_use]
    pub fn id(&self) -> &AttrValue {
        &self.id
    }

    /// The dense slot index, stable for the node's lifetime.
    #[must_use]
    pub fn store_id(&self) -> u32 {
        self.store_id
    }

    /// Outgoing degree, self-loops included.
    #[must_use]
    pub fn out_degree(&self) -> u32 {
        self.out_degree
    }

    /// Incoming degree, self-loops included.
    #[must_use]
    pub fn in_degree(&self) -> u32 {
        self.in_degree
    }

    /// Number of incident undirected edges.
    #[must_use]
    pub fn undirected_degree(&self) -> u32 {
        self.undirected_degree
    }

    /// Number of complete mutual pairs this node participates in.
    #[must_use]
    pub fn mutual_count(&self) -> u32 {
        self.mutual_count
    }

    /// Number of self-loops at this node.
    #[must_use]
    pub fn self_loop_count(&self) -> u32 {
        self.self_loop_count
    }

    /// Undirected-sense degree: a mutual pair counts once, a self-loop
    /// counts once.
    #[must_use]
    pub fn degree(&self) -> u32 {
        self.out_degree + self.in_degree + self.undirected_degree
            - self.mutual_count
            - self.self_loop_count
    }

    /// The adjacency heads for a type, or empty heads when the node has
    /// never seen the type.
    pub(crate) fn heads(&self, ty: TypeId) -> AdjacencyHeads {
        self.heads
            .get(ty.index())
            .copied()
            .unwrap_or(AdjacencyHeads::EMPTY)
    }

    /// Mutable heads for a type, growing the per-node table on demand.
    pub(crate) fn heads_mut(&mut self, ty: TypeId) -> &mut AdjacencyHeads {
        let index = ty.index();
        if self.heads.len() <= index {
            self.heads.resize_with(index + 1, AdjacencyHeads::default);
        }
        &mut self.heads[index]
    }

    pub(crate) fn has_edges(&self) -> bool {
        self.out_degree > 0
            || self.in_degree > 0
            || self.undirected_degree > 0
            || self.self_loop_count > 0
    }

    /// Forgets every chain and degree. Used by wholesale edge clearing.
    pub(crate) fn reset_adjacency(&mut self) {
        self.heads.clear();
        self.self_loop_head = NIL;
        self.out_degree = 0;
        self.in_degree = 0;
        self.undirected_degree = 0;
        self.mutual_count = 0;
        self.self_loop_count = 0;
    }
}

/// Dense slot array of nodes with a smallest-first free list.
#[derive(Debug, Default)]
pub(crate) struct NodeStore {
    slots: Vec<Option<NodeRecord>>,
    free: BinaryHeap<Reverse<u32>>,
    by_id: FxHashMap<ValueKey, u32>,
    len: usize,
}

impl NodeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, reusing the smallest free slot.
    ///
    /// The id must already be standardized against the configured id type.
    pub(crate) fn add(&mut self, id: AttrValue) -> Result<u32> {
        let key = ValueKey::new(id.clone())?;
        if self.by_id.contains_key(&key) {
            return Err(Error::DuplicateNode);
        }
        let slot = match self.free.pop() {
            Some(Reverse(slot)) => slot,
            None => u32::try_from(self.slots.len()).expect("node slot overflow"),
        };
        let record = NodeRecord::new(id, slot);
        let index = slot as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        debug_assert!(self.slots[index].is_none(), "free list pointed at a live slot");
        self.slots[index] = Some(record);
        self.by_id.insert(key, slot);
        self.len += 1;
        Ok(slot)
    }

    /// Frees a slot, returning the record. Incident edges must already be
    /// gone.
    pub(crate) fn remove(&mut self, slot: u32) -> Result<NodeRecord> {
        let record = self.slots.get_mut(slot as usize).and_then(Option::take);
        let Some(record) = record else {
            return Err(Error::NotOwned("node"));
        };
        debug_assert!(!record.has_edges(), "node removed with live edges");
        let key = ValueKey::new(record.id.clone()).expect("element ids are never dynamic");
        self.by_id.remove(&key);
        self.free.push(Reverse(slot));
        self.len -= 1;
        Ok(record)
    }

    /// Maps a user id to its slot.
    pub(crate) fn resolve(&self, id: &AttrValue) -> Option<u32> {
        let key = ValueKey::new(id.clone()).ok()?;
        self.by_id.get(&key).copied()
    }

    pub(crate) fn get(&self, slot: u32) -> Option<&NodeRecord> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, slot: u32) -> Option<&mut NodeRecord> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    pub(crate) fn contains_slot(&self, slot: u32) -> bool {
        self.get(slot).is_some()
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Total slots, including free ones. Detached cursors scan this range.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live records in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeRecord> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_id.clear();
        self.len = 0;
    }
}
