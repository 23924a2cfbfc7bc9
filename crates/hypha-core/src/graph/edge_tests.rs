//! Tests for the edge store: splicing, parallel edges, mutual edges,
//! self-loops, and slot recycling.

use super::adjacency::ChainClass;
use super::edge::EdgeStore;
use super::node::NodeStore;
use super::type_table::{EdgeTypeTable, TypeId};
use crate::attr::value::AttrValue;
use crate::error::Error;

struct Fixture {
    nodes: NodeStore,
    types: EdgeTypeTable,
    edges: EdgeStore,
}

impl Fixture {
    fn new(node_count: i64) -> Self {
        let mut nodes = NodeStore::new();
        for i in 0..node_count {
            nodes.add(AttrValue::I64(i)).unwrap();
        }
        let mut types = EdgeTypeTable::new();
        types.intern(AttrValue::I64(0)).unwrap();
        Self {
            nodes,
            types,
            edges: EdgeStore::new(),
        }
    }

    fn add_edge(&mut self, id: i64, source: u32, target: u32, directed: bool) -> u32 {
        self.try_add_edge(id, source, target, directed).unwrap()
    }

    fn try_add_edge(
        &mut self,
        id: i64,
        source: u32,
        target: u32,
        directed: bool,
    ) -> crate::error::Result<u32> {
        self.edges.add(
            &mut self.nodes,
            &mut self.types,
            AttrValue::I64(id),
            source,
            target,
            TypeId::from_u16(0),
            directed,
            1.0,
        )
    }

    fn chain_len(&self, node: u32, class: ChainClass) -> u32 {
        self.nodes
            .get(node)
            .unwrap()
            .heads(TypeId::from_u16(0))
            .len(class)
    }

    fn chain_ids(&self, node: u32, class: ChainClass) -> Vec<i64> {
        let record = self.nodes.get(node).unwrap();
        self.edges
            .chain(record, class, TypeId::from_u16(0))
            .map(|edge| edge.id().as_i64().unwrap())
            .collect()
    }
}

#[test]
fn test_directed_edge_updates_degrees_and_chains() {
    let mut fx = Fixture::new(2);
    let slot = fx.add_edge(10, 0, 1, true);

    let src = fx.nodes.get(0).unwrap();
    let dst = fx.nodes.get(1).unwrap();
    assert_eq!(src.out_degree(), 1);
    assert_eq!(src.in_degree(), 0);
    assert_eq!(dst.in_degree(), 1);
    assert_eq!(dst.out_degree(), 0);

    assert_eq!(fx.chain_len(0, ChainClass::Out), 1);
    assert_eq!(fx.chain_len(1, ChainClass::In), 1);
    assert_eq!(fx.chain_len(0, ChainClass::Undirected), 0);

    assert_eq!(fx.edges.find(0, 1, TypeId::from_u16(0)), Some(slot));
    assert_eq!(fx.edges.mutual(slot), None);
    assert_eq!(fx.types.count(TypeId::from_u16(0)), 1);
}

#[test]
fn test_chain_order_is_lifo() {
    let mut fx = Fixture::new(4);
    fx.add_edge(10, 0, 1, true);
    fx.add_edge(11, 0, 2, true);
    fx.add_edge(12, 0, 3, true);

    // Head of chain is the most recently added edge.
    assert_eq!(fx.chain_ids(0, ChainClass::Out), vec![12, 11, 10]);
}

#[test]
fn test_chain_length_matches_degree_invariant() {
    let mut fx = Fixture::new(5);
    for (id, target) in [(10, 1_u32), (11, 2), (12, 3), (13, 4)] {
        fx.add_edge(id, 0, target, true);
    }
    fx.add_edge(14, 1, 0, true);

    let node = fx.nodes.get(0).unwrap();
    assert_eq!(
        fx.chain_len(0, ChainClass::Out),
        node.out_degree(),
        "out chain length must equal out degree"
    );
    assert_eq!(fx.chain_len(0, ChainClass::In), node.in_degree());
}

#[test]
fn test_parallel_directed_edge_rejected() {
    let mut fx = Fixture::new(2);
    fx.add_edge(10, 0, 1, true);

    let err = fx.try_add_edge(11, 0, 1, true).unwrap_err();
    assert!(matches!(err, Error::ParallelEdge));
    assert_eq!(fx.edges.len(), 1);

    // The reverse direction is a different key.
    assert!(fx.try_add_edge(11, 1, 0, true).is_ok());
}

#[test]
fn test_parallel_undirected_is_order_insensitive() {
    let mut fx = Fixture::new(2);
    fx.add_edge(10, 1, 0, false);

    let err = fx.try_add_edge(11, 0, 1, false).unwrap_err();
    assert!(matches!(err, Error::ParallelEdge));
}

#[test]
fn test_directed_and_undirected_keys_are_disjoint() {
    let mut fx = Fixture::new(2);
    fx.add_edge(10, 0, 1, true);
    // Same endpoints and type, undirected: a distinct key space.
    assert!(fx.try_add_edge(11, 0, 1, false).is_ok());
    assert_eq!(fx.edges.len(), 2);
}

#[test]
fn test_duplicate_edge_id_rejected() {
    let mut fx = Fixture::new(3);
    fx.add_edge(10, 0, 1, true);

    let err = fx.try_add_edge(10, 0, 2, true).unwrap_err();
    assert!(matches!(err, Error::DuplicateEdge));
}

#[test]
fn test_mutual_pair_counters_and_lookup() {
    let mut fx = Fixture::new(2);
    let ab = fx.add_edge(10, 0, 1, true);
    assert_eq!(fx.nodes.get(0).unwrap().mutual_count(), 0);

    let ba = fx.add_edge(11, 1, 0, true);
    assert_eq!(fx.nodes.get(0).unwrap().mutual_count(), 1);
    assert_eq!(fx.nodes.get(1).unwrap().mutual_count(), 1);
    assert_eq!(fx.edges.mutual(ab), Some(ba));
    assert_eq!(fx.edges.mutual(ba), Some(ab));

    // A mutual pair counts once in the undirected-sense degree.
    assert_eq!(fx.nodes.get(0).unwrap().degree(), 1);
    assert_eq!(fx.nodes.get(0).unwrap().out_degree(), 1);
    assert_eq!(fx.nodes.get(0).unwrap().in_degree(), 1);

    // Removing one half of the pair restores the counters.
    fx.edges.remove(&mut fx.nodes, &mut fx.types, ba).unwrap();
    assert_eq!(fx.nodes.get(0).unwrap().mutual_count(), 0);
    assert_eq!(fx.edges.mutual(ab), None);
}

#[test]
fn test_self_loop_counted_once() {
    let mut fx = Fixture::new(1);
    let slot = fx.add_edge(10, 0, 0, true);

    let node = fx.nodes.get(0).unwrap();
    assert_eq!(node.in_degree(), 1);
    assert_eq!(node.out_degree(), 1);
    assert_eq!(node.self_loop_count(), 1);
    assert_eq!(node.degree(), 1, "self-loop counts once in undirected degree");

    // Self-loops stay out of the regular chains.
    assert_eq!(fx.chain_len(0, ChainClass::Out), 0);
    assert_eq!(fx.chain_len(0, ChainClass::In), 0);

    let loops: Vec<u32> = fx.edges.self_loops().map(|e| e.store_id()).collect();
    assert_eq!(loops, vec![slot]);
}

#[test]
fn test_second_self_loop_rejected_either_directedness() {
    let mut fx = Fixture::new(1);
    fx.add_edge(10, 0, 0, true);

    assert!(matches!(
        fx.try_add_edge(11, 0, 0, true),
        Err(Error::ParallelEdge)
    ));
    assert!(matches!(
        fx.try_add_edge(11, 0, 0, false),
        Err(Error::ParallelEdge)
    ));
}

#[test]
fn test_self_loop_removal_restores_node() {
    let mut fx = Fixture::new(1);
    let a = fx.add_edge(10, 0, 0, true);

    fx.edges.remove(&mut fx.nodes, &mut fx.types, a).unwrap();
    let node = fx.nodes.get(0).unwrap();
    assert_eq!(node.self_loop_count(), 0);
    assert_eq!(node.degree(), 0);
    assert_eq!(fx.edges.self_loops().count(), 0);

    // The (node, type) key is free again.
    assert!(fx.try_add_edge(11, 0, 0, false).is_ok());
}

#[test]
fn test_remove_middle_of_chain_keeps_links() {
    let mut fx = Fixture::new(4);
    fx.add_edge(10, 0, 1, true);
    let middle = fx.add_edge(11, 0, 2, true);
    fx.add_edge(12, 0, 3, true);

    fx.edges
        .remove(&mut fx.nodes, &mut fx.types, middle)
        .unwrap();

    assert_eq!(fx.chain_ids(0, ChainClass::Out), vec![12, 10]);
    assert_eq!(fx.chain_len(0, ChainClass::Out), 2);
    assert_eq!(fx.nodes.get(0).unwrap().out_degree(), 2);
}

#[test]
fn test_remove_head_and_tail_of_chain() {
    let mut fx = Fixture::new(4);
    let tail = fx.add_edge(10, 0, 1, true);
    fx.add_edge(11, 0, 2, true);
    let head = fx.add_edge(12, 0, 3, true);

    fx.edges.remove(&mut fx.nodes, &mut fx.types, head).unwrap();
    assert_eq!(fx.chain_ids(0, ChainClass::Out), vec![11, 10]);

    fx.edges.remove(&mut fx.nodes, &mut fx.types, tail).unwrap();
    assert_eq!(fx.chain_ids(0, ChainClass::Out), vec![11]);
}

#[test]
fn test_undirected_edge_links_both_endpoints() {
    let mut fx = Fixture::new(2);
    fx.add_edge(10, 0, 1, false);

    assert_eq!(fx.chain_len(0, ChainClass::Undirected), 1);
    assert_eq!(fx.chain_len(1, ChainClass::Undirected), 1);
    assert_eq!(fx.nodes.get(0).unwrap().undirected_degree(), 1);
    assert_eq!(fx.nodes.get(0).unwrap().degree(), 1);
    assert!(fx.types.is_undirected_graph());
}

#[test]
fn test_mixed_graph_counters() {
    let mut fx = Fixture::new(3);
    assert!(fx.types.is_directed_graph());
    assert!(fx.types.is_undirected_graph());

    fx.add_edge(10, 0, 1, true);
    assert!(fx.types.is_directed_graph());
    assert!(!fx.types.is_mixed_graph());

    fx.add_edge(11, 1, 2, false);
    assert!(fx.types.is_mixed_graph());
    assert_eq!(fx.types.directed_count(), 1);
    assert_eq!(fx.types.undirected_count(), 1);
}

#[test]
fn test_edge_slot_recycling_smallest_first() {
    let mut fx = Fixture::new(6);
    let e0 = fx.add_edge(10, 0, 1, true);
    let e1 = fx.add_edge(11, 0, 2, true);
    let e2 = fx.add_edge(12, 0, 3, true);
    assert_eq!((e0, e1, e2), (0, 1, 2));

    fx.edges.remove(&mut fx.nodes, &mut fx.types, e1).unwrap();
    fx.edges.remove(&mut fx.nodes, &mut fx.types, e0).unwrap();

    // Smallest free slot is reused first.
    assert_eq!(fx.add_edge(13, 0, 4, true), 0);
    assert_eq!(fx.add_edge(14, 0, 5, true), 1);
    assert_eq!(fx.add_edge(15, 1, 2, true), 3);
}

#[test]
fn test_add_remove_round_trip_restores_store() {
    let mut fx = Fixture::new(2);
    let slot = fx.add_edge(10, 0, 1, true);
    fx.edges.remove(&mut fx.nodes, &mut fx.types, slot).unwrap();

    assert_eq!(fx.edges.len(), 0);
    assert_eq!(fx.types.count(TypeId::from_u16(0)), 0);
    assert_eq!(fx.nodes.get(0).unwrap().out_degree(), 0);
    assert_eq!(fx.nodes.get(1).unwrap().in_degree(), 0);
    assert_eq!(fx.edges.find(0, 1, TypeId::from_u16(0)), None);
    assert!(fx.edges.resolve(&AttrValue::I64(10)).is_none());
}

#[test]
fn test_removing_stale_slot_errors() {
    let mut fx = Fixture::new(2);
    let slot = fx.add_edge(10, 0, 1, true);
    fx.edges.remove(&mut fx.nodes, &mut fx.types, slot).unwrap();

    let err = fx
        .edges
        .remove(&mut fx.nodes, &mut fx.types, slot)
        .unwrap_err();
    assert!(matches!(err, Error::NotOwned("edge")));
}
