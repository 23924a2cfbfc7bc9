//! Edge records, the dense edge store, and adjacency splicing.
//!
//! Every edge is threaded onto up to four doubly linked chains: its
//! source's out chain and target's in chain (directed), or the undirected
//! chain at each endpoint. Splicing is O(1) through the stored prev/next
//! slot indices. Self-loops live on a per-node singly linked chain plus a
//! global bitmap and never enter the four regular chains, so neighbor
//! iteration sees them exactly once.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

use crate::attr::value::{AttrValue, ValueKey};
use crate::error::{Error, Result};
use crate::graph::adjacency::{ChainClass, Direction, EdgeLinks, Link, NIL};
use crate::graph::node::{NodeRecord, NodeStore};
use crate::graph::type_table::{EdgeTypeTable, TypeId};

/// Key of the parallel-edge table.
///
/// Directed keys keep (source, target) order; undirected keys store the
/// smaller slot first. The `directed` flag keeps the two key spaces
/// disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EdgeKey {
    a: u32,
    b: u32,
    ty: TypeId,
    directed: bool,
}

impl EdgeKey {
    pub(crate) fn directed(source: u32, target: u32, ty: TypeId) -> Self {
        Self {
            a: source,
            b: target,
            ty,
            directed: true,
        }
    }

    pub(crate) fn undirected(x: u32, y: u32, ty: TypeId) -> Self {
        Self {
            a: x.min(y),
            b: x.max(y),
            ty,
            directed: false,
        }
    }

    pub(crate) fn of(source: u32, target: u32, ty: TypeId, directed: bool) -> Self {
        if directed {
            Self::directed(source, target, ty)
        } else {
            Self::undirected(source, target, ty)
        }
    }
}

/// An edge in the graph.
#[derive(Debug, Clone)]
pub struct EdgeRecord {
    pub(crate) id: AttrValue,
    pub(crate) store_id: u32,
    pub(crate) source: u32,
    pub(crate) target: u32,
    pub(crate) ty: TypeId,
    pub(crate) directed: bool,
    pub(crate) weight: f64,
    pub(crate) links: EdgeLinks,
    pub(crate) next_self_loop: i32,
    pub(crate) attrs: Vec<Option<AttrValue>>,
}

impl EdgeRecord {
    /// The user id.
    #[must_use]
    pub fn id(&self) -> &AttrValue {
        &self.id
    }

    /// The dense slot index, stable for the edge's lifetime.
    #[must_use]
    pub fn store_id(&self) -> u32 {
        self.store_id
    }

    /// Source node slot.
    #[must_use]
    pub fn source(&self) -> u32 {
        self.source
    }

    /// Target node slot.
    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// The interned edge type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.ty
    }

    /// Whether the edge is directed.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Whether source and target coincide.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    /// The static weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// The endpoint opposite to the given node slot.
    #[must_use]
    pub fn opposite(&self, node: u32) -> u32 {
        if node == self.source {
            self.target
        } else {
            self.source
        }
    }
}

/// The chain link of `record` at `node` for a chain class.
fn link_for(record: &EdgeRecord, node: u32, class: ChainClass) -> Link {
    match class {
        ChainClass::Out => {
            debug_assert_eq!(record.source, node);
            record.links.source_out
        }
        ChainClass::In => {
            debug_assert_eq!(record.target, node);
            record.links.target_in
        }
        ChainClass::Undirected => {
            if record.source == node {
                record.links.source_undirected
            } else {
                debug_assert_eq!(record.target, node);
                record.links.target_undirected
            }
        }
    }
}

fn link_mut(record: &mut EdgeRecord, node: u32, class: ChainClass) -> &mut Link {
    match class {
        ChainClass::Out => &mut record.links.source_out,
        ChainClass::In => &mut record.links.target_in,
        ChainClass::Undirected => {
            if record.source == node {
                &mut record.links.source_undirected
            } else {
                &mut record.links.target_undirected
            }
        }
    }
}

/// Dense slot array of edges plus the parallel-edge table, the global
/// self-loop bitmap, and a smallest-first free list.
#[derive(Debug, Default)]
pub(crate) struct EdgeStore {
    slots: Vec<Option<EdgeRecord>>,
    free: BinaryHeap<Reverse<u32>>,
    by_id: FxHashMap<ValueKey, u32>,
    parallel: FxHashMap<EdgeKey, u32>,
    self_loops: RoaringBitmap,
    len: usize,
}

impl EdgeStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record(&self, slot: u32) -> &EdgeRecord {
        self.slots[slot as usize]
            .as_ref()
            .expect("stale edge slot in adjacency chain")
    }

    fn record_mut(&mut self, slot: u32) -> &mut EdgeRecord {
        self.slots[slot as usize]
            .as_mut()
            .expect("stale edge slot in adjacency chain")
    }

    /// Inserts an edge and splices it onto its chains.
    ///
    /// Endpoints must be live slots of `nodes`; the id must already be
    /// standardized.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add(
        &mut self,
        nodes: &mut NodeStore,
        types: &mut EdgeTypeTable,
        id: AttrValue,
        source: u32,
        target: u32,
        ty: TypeId,
        directed: bool,
        weight: f64,
    ) -> Result<u32> {
        let id_key = ValueKey::new(id.clone())?;
        if self.by_id.contains_key(&id_key) {
            return Err(Error::DuplicateEdge);
        }
        let key = EdgeKey::of(source, target, ty, directed);
        if self.is_parallel(source, target, ty, directed) {
            return Err(Error::ParallelEdge);
        }

        let slot = match self.free.pop() {
            Some(Reverse(slot)) => slot,
            None => u32::try_from(self.slots.len()).expect("edge slot overflow"),
        };
        let record = EdgeRecord {
            id,
            store_id: slot,
            source,
            target,
            ty,
            directed,
            weight,
            links: EdgeLinks::default(),
            next_self_loop: NIL,
            attrs: Vec::new(),
        };
        let index = slot as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        debug_assert!(self.slots[index].is_none(), "free list pointed at a live slot");
        self.slots[index] = Some(record);

        if source == target {
            self.splice_self_loop(nodes, slot, source);
        } else if directed {
            self.push_chain(nodes, slot, source, ChainClass::Out);
            self.push_chain(nodes, slot, target, ChainClass::In);
            let src = nodes.get_mut(source).expect("stale source slot");
            src.out_degree += 1;
            let dst = nodes.get_mut(target).expect("stale target slot");
            dst.in_degree += 1;
            if self
                .parallel
                .contains_key(&EdgeKey::directed(target, source, ty))
            {
                nodes.get_mut(source).expect("stale source slot").mutual_count += 1;
                nodes.get_mut(target).expect("stale target slot").mutual_count += 1;
            }
        } else {
            self.push_chain(nodes, slot, source, ChainClass::Undirected);
            self.push_chain(nodes, slot, target, ChainClass::Undirected);
            nodes
                .get_mut(source)
                .expect("stale source slot")
                .undirected_degree += 1;
            nodes
                .get_mut(target)
                .expect("stale target slot")
                .undirected_degree += 1;
        }

        self.parallel.insert(key, slot);
        self.by_id.insert(id_key, slot);
        types.inc(ty, directed);
        self.len += 1;
        Ok(slot)
    }

    /// Splices an edge off its chains and frees the slot.
    pub(crate) fn remove(
        &mut self,
        nodes: &mut NodeStore,
        types: &mut EdgeTypeTable,
        slot: u32,
    ) -> Result<EdgeRecord> {
        let Some(record) = self.slots.get(slot as usize).and_then(Option::as_ref) else {
            return Err(Error::NotOwned("edge"));
        };
        let (source, target, ty, directed) = (
            record.source,
            record.target,
            record.ty,
            record.directed,
        );

        if source == target {
            self.unsplice_self_loop(nodes, slot, source);
        } else if directed {
            self.unlink_chain(nodes, slot, source, ChainClass::Out);
            self.unlink_chain(nodes, slot, target, ChainClass::In);
            nodes.get_mut(source).expect("stale source slot").out_degree -= 1;
            nodes.get_mut(target).expect("stale target slot").in_degree -= 1;
            if self
                .parallel
                .contains_key(&EdgeKey::directed(target, source, ty))
            {
                nodes.get_mut(source).expect("stale source slot").mutual_count -= 1;
                nodes.get_mut(target).expect("stale target slot").mutual_count -= 1;
            }
        } else {
            self.unlink_chain(nodes, slot, source, ChainClass::Undirected);
            self.unlink_chain(nodes, slot, target, ChainClass::Undirected);
            nodes
                .get_mut(source)
                .expect("stale source slot")
                .undirected_degree -= 1;
            nodes
                .get_mut(target)
                .expect("stale target slot")
                .undirected_degree -= 1;
        }

        let record = self.slots[slot as usize]
            .take()
            .expect("edge vanished during removal");
        self.parallel
            .remove(&EdgeKey::of(source, target, ty, directed));
        let id_key = ValueKey::new(record.id.clone()).expect("element ids are never dynamic");
        self.by_id.remove(&id_key);
        types.dec(ty, directed);
        self.free.push(Reverse(slot));
        self.len -= 1;
        Ok(record)
    }

    fn splice_self_loop(&mut self, nodes: &mut NodeStore, slot: u32, node_slot: u32) {
        let node = nodes.get_mut(node_slot).expect("stale node slot");
        let head = node.self_loop_head;
        node.self_loop_head = slot_index(slot);
        node.self_loop_count += 1;
        node.in_degree += 1;
        node.out_degree += 1;
        self.record_mut(slot).next_self_loop = head;
        self.self_loops.insert(slot);
    }

    fn unsplice_self_loop(&mut self, nodes: &mut NodeStore, slot: u32, node_slot: u32) {
        let head = nodes
            .get(node_slot)
            .expect("stale node slot")
            .self_loop_head;
        let skip = self.record(slot).next_self_loop;
        if head == slot_index(slot) {
            nodes
                .get_mut(node_slot)
                .expect("stale node slot")
                .self_loop_head = skip;
        } else {
            let mut cur = head;
            loop {
                debug_assert!(cur != NIL, "self-loop chain does not contain the edge");
                let next = self.record(cur as u32).next_self_loop;
                if next == slot_index(slot) {
                    break;
                }
                cur = next;
            }
            self.record_mut(cur as u32).next_self_loop = skip;
        }
        self.record_mut(slot).next_self_loop = NIL;
        let node = nodes.get_mut(node_slot).expect("stale node slot");
        node.self_loop_count -= 1;
        node.in_degree -= 1;
        node.out_degree -= 1;
        self.self_loops.remove(slot);
    }

    /// Splices an edge at the head of one chain. Traversal order is LIFO
    /// of insertion.
    fn push_chain(&mut self, nodes: &mut NodeStore, slot: u32, node_slot: u32, class: ChainClass) {
        let ty = self.record(slot).ty;
        let node = nodes.get_mut(node_slot).expect("stale node slot");
        let heads = node.heads_mut(ty);
        let old_head = heads.head(class);
        heads.set_head(class, slot_index(slot));
        heads.add_len(class, 1);

        *link_mut(self.record_mut(slot), node_slot, class) = Link {
            prev: NIL,
            next: old_head,
        };
        if old_head != NIL {
            link_mut(self.record_mut(old_head as u32), node_slot, class).prev = slot_index(slot);
        }
    }

    /// Splices an edge out of one chain in O(1).
    fn unlink_chain(&mut self, nodes: &mut NodeStore, slot: u32, node_slot: u32, class: ChainClass) {
        let (ty, link) = {
            let record = self.record(slot);
            (record.ty, link_for(record, node_slot, class))
        };
        if link.prev == NIL {
            let node = nodes.get_mut(node_slot).expect("stale node slot");
            debug_assert_eq!(node.heads(ty).head(class), slot_index(slot));
            node.heads_mut(ty).set_head(class, link.next);
        } else {
            link_mut(self.record_mut(link.prev as u32), node_slot, class).next = link.next;
        }
        if link.next != NIL {
            link_mut(self.record_mut(link.next as u32), node_slot, class).prev = link.prev;
        }
        let node = nodes.get_mut(node_slot).expect("stale node slot");
        node.heads_mut(ty).add_len(class, -1);
        *link_mut(self.record_mut(slot), node_slot, class) = Link::EMPTY;
    }

    /// Whether an edge with the same endpoints and type would be a
    /// parallel edge.
    ///
    /// Self-loops check both key spaces: a second self-loop of the same
    /// (node, type) is rejected regardless of directedness.
    pub(crate) fn is_parallel(&self, source: u32, target: u32, ty: TypeId, directed: bool) -> bool {
        if source == target {
            return self
                .parallel
                .contains_key(&EdgeKey::directed(source, target, ty))
                || self
                    .parallel
                    .contains_key(&EdgeKey::undirected(source, target, ty));
        }
        self.parallel
            .contains_key(&EdgeKey::of(source, target, ty, directed))
    }

    /// The edge with the given endpoints and type: the directed key first,
    /// then the undirected one.
    pub(crate) fn find(&self, source: u32, target: u32, ty: TypeId) -> Option<u32> {
        self.parallel
            .get(&EdgeKey::directed(source, target, ty))
            .or_else(|| self.parallel.get(&EdgeKey::undirected(source, target, ty)))
            .copied()
    }

    /// The mutual counterpart of a directed edge: the reverse-direction
    /// edge of the same type, if present.
    pub(crate) fn mutual(&self, slot: u32) -> Option<u32> {
        let record = self.get(slot)?;
        if !record.directed || record.is_self_loop() {
            return None;
        }
        self.parallel
            .get(&EdgeKey::directed(record.target, record.source, record.ty))
            .copied()
    }

    pub(crate) fn get(&self, slot: u32) -> Option<&EdgeRecord> {
        self.slots.get(slot as usize)?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, slot: u32) -> Option<&mut EdgeRecord> {
        self.slots.get_mut(slot as usize)?.as_mut()
    }

    pub(crate) fn resolve(&self, id: &AttrValue) -> Option<u32> {
        let key = ValueKey::new(id.clone()).ok()?;
        self.by_id.get(&key).copied()
    }

    pub(crate) fn contains_slot(&self, slot: u32) -> bool {
        self.get(slot).is_some()
    }

    /// Number of live edges.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Total slots, including free ones.
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live records in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut EdgeRecord> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// All self-loop edges.
    pub(crate) fn self_loops(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.self_loops.iter().map(|slot| self.record(slot))
    }

    /// Walks one chain of a node.
    pub(crate) fn chain(
        &self,
        node: &NodeRecord,
        class: ChainClass,
        ty: TypeId,
    ) -> ChainIter<'_> {
        ChainIter {
            store: self,
            node: node.store_id,
            class,
            cur: node.heads(ty).head(class),
        }
    }

    /// Walks a node's self-loop chain.
    pub(crate) fn self_loop_chain(&self, node: &NodeRecord) -> SelfLoopIter<'_> {
        SelfLoopIter {
            store: self,
            cur: node.self_loop_head,
        }
    }

    /// Collects a node's incident edges.
    ///
    /// Undirected edges and self-loops participate in both directions;
    /// with [`Direction::Both`] each incident edge appears exactly once.
    pub(crate) fn edges_of(
        &self,
        node: &NodeRecord,
        direction: Direction,
        ty: Option<TypeId>,
    ) -> Vec<&EdgeRecord> {
        let type_range: Vec<TypeId> = match ty {
            Some(ty) => vec![ty],
            None => (0..node.heads.len())
                .map(|i| TypeId::from_u16(u16::try_from(i).expect("type index overflow")))
                .collect(),
        };
        let mut capacity = node.self_loop_count;
        for &t in &type_range {
            let heads = node.heads(t);
            if direction.includes_out() {
                capacity += heads.len(ChainClass::Out);
            }
            if direction.includes_in() {
                capacity += heads.len(ChainClass::In);
            }
            capacity += heads.len(ChainClass::Undirected);
        }
        let mut result = Vec::with_capacity(capacity as usize);
        for &t in &type_range {
            if direction.includes_out() {
                result.extend(self.chain(node, ChainClass::Out, t));
            }
            if direction.includes_in() {
                result.extend(self.chain(node, ChainClass::In, t));
            }
            result.extend(self.chain(node, ChainClass::Undirected, t));
        }
        for record in self.self_loop_chain(node) {
            if ty.is_none() || ty == Some(record.ty) {
                result.push(record);
            }
        }
        result
    }

    /// Collects a node's neighbors.
    ///
    /// For [`Direction::Both`], the in-chain side of a mutual pair is
    /// skipped so the neighbor appears once; a self-loop contributes the
    /// node itself once.
    pub(crate) fn neighbors_of(
        &self,
        node: &NodeRecord,
        direction: Direction,
        ty: Option<TypeId>,
    ) -> Vec<u32> {
        let mut result = Vec::new();
        let type_count = node.heads.len();
        let type_range: Vec<TypeId> = match ty {
            Some(ty) => vec![ty],
            None => (0..type_count)
                .map(|i| TypeId::from_u16(u16::try_from(i).expect("type index overflow")))
                .collect(),
        };
        let dedup_mutual = direction == Direction::Both;
        for &t in &type_range {
            if direction.includes_out() {
                for record in self.chain(node, ChainClass::Out, t) {
                    result.push(record.target);
                }
            }
            if direction.includes_in() {
                for record in self.chain(node, ChainClass::In, t) {
                    if dedup_mutual
                        && self
                            .parallel
                            .contains_key(&EdgeKey::directed(node.store_id, record.source, t))
                    {
                        continue;
                    }
                    result.push(record.source);
                }
            }
            for record in self.chain(node, ChainClass::Undirected, t) {
                result.push(record.opposite(node.store_id));
            }
        }
        let mut seen_loop = false;
        for record in self.self_loop_chain(node) {
            if (ty.is_none() || ty == Some(record.ty)) && !seen_loop {
                result.push(node.store_id);
                seen_loop = true;
            }
        }
        result
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_id.clear();
        self.parallel.clear();
        self.self_loops.clear();
        self.len = 0;
    }
}

#[allow(clippy::cast_possible_wrap)]
fn slot_index(slot: u32) -> i32 {
    slot as i32
}

/// Iterator over one adjacency chain.
pub(crate) struct ChainIter<'a> {
    store: &'a EdgeStore,
    node: u32,
    class: ChainClass,
    cur: i32,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let record = self.store.record(self.cur as u32);
        self.cur = link_for(record, self.node, self.class).next;
        Some(record)
    }
}

/// Iterator over a node's self-loop chain.
pub(crate) struct SelfLoopIter<'a> {
    store: &'a EdgeStore,
    cur: i32,
}

impl<'a> Iterator for SelfLoopIter<'a> {
    type Item = &'a EdgeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NIL {
            return None;
        }
        let record = self.store.record(self.cur as u32);
        self.cur = record.next_self_loop;
        Some(record)
    }
}
