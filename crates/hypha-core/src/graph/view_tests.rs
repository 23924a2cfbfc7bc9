//! Tests for bitset views: set algebra, closure, coherence under base
//! mutation, and slot recycling.

use super::edge::EdgeStore;
use super::node::NodeStore;
use super::type_table::{EdgeTypeTable, TypeId};
use super::view::ViewStore;
use crate::attr::value::AttrValue;
use crate::error::Error;

struct Fixture {
    nodes: NodeStore,
    types: EdgeTypeTable,
    edges: EdgeStore,
    views: ViewStore,
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
            views: ViewStore::new(),
        }
    }

    fn add_edge(&mut self, id: i64, source: u32, target: u32) -> u32 {
        self.edges
            .add(
                &mut self.nodes,
                &mut self.types,
                AttrValue::I64(id),
                source,
                target,
                TypeId::from_u16(0),
                true,
                1.0,
            )
            .unwrap()
    }
}

#[test]
fn test_view_membership_and_counts() {
    let mut fx = Fixture::new(3);
    let edge = fx.add_edge(10, 0, 1);
    let view = fx.views.create(false, false);

    fx.views.add_node(view, 0).unwrap();
    fx.views.add_node(view, 1).unwrap();
    fx.views.add_edge(view, &fx.edges, edge).unwrap();

    let state = fx.views.state(view).unwrap();
    assert_eq!(state.node_count(), 2);
    assert_eq!(state.edge_count(&fx.edges), 1);
    assert!(state.contains_node(0));
    assert!(!state.contains_node(2));
    assert!(state.contains_edge(&fx.edges, edge));
}

#[test]
fn test_edge_requires_endpoints_in_view() {
    let mut fx = Fixture::new(3);
    let edge = fx.add_edge(10, 0, 1);
    let view = fx.views.create(false, false);
    fx.views.add_node(view, 0).unwrap();

    let err = fx.views.add_edge(view, &fx.edges, edge).unwrap_err();
    assert!(matches!(err, Error::ViewClosure));

    fx.views.add_node(view, 1).unwrap();
    assert!(fx.views.add_edge(view, &fx.edges, edge).unwrap());
}

#[test]
fn test_remove_node_clears_incident_edge_bits() {
    let mut fx = Fixture::new(3);
    let ab = fx.add_edge(10, 0, 1);
    let bc = fx.add_edge(11, 1, 2);
    let view = fx.views.create(false, false);
    for n in 0..3 {
        fx.views.add_node(view, n).unwrap();
    }
    fx.views.add_edge(view, &fx.edges, ab).unwrap();
    fx.views.add_edge(view, &fx.edges, bc).unwrap();

    fx.views.remove_node(view, &fx.nodes, &fx.edges, 1).unwrap();

    let state = fx.views.state(view).unwrap();
    assert!(!state.contains_node(1));
    assert!(!state.contains_edge(&fx.edges, ab));
    assert!(!state.contains_edge(&fx.edges, bc));
    assert_eq!(state.edge_count(&fx.edges), 0);
}

#[test]
fn test_union_and_intersection() {
    let mut fx = Fixture::new(4);
    let a = fx.views.create(false, false);
    let b = fx.views.create(false, false);
    for n in [0_u32, 1] {
        fx.views.add_node(a, n).unwrap();
    }
    for n in [1_u32, 2] {
        fx.views.add_node(b, n).unwrap();
    }

    fx.views.union(a, b).unwrap();
    let state = fx.views.state(a).unwrap();
    assert!(state.contains_node(0) && state.contains_node(1) && state.contains_node(2));

    fx.views.intersection(a, b).unwrap();
    let state = fx.views.state(a).unwrap();
    assert!(!state.contains_node(0));
    assert!(state.contains_node(1) && state.contains_node(2));
}

#[test]
fn test_union_then_intersection_with_same_view_is_identity() {
    let mut fx = Fixture::new(4);
    let a = fx.views.create(false, false);
    let b = fx.views.create(false, false);
    for n in [0_u32, 1] {
        fx.views.add_node(a, n).unwrap();
    }
    for n in [1_u32, 2] {
        fx.views.add_node(b, n).unwrap();
    }
    let before: Vec<u32> = {
        let state = fx.views.state(b).unwrap();
        state.node_bits.iter().collect()
    };

    fx.views.union(b, b).unwrap();
    fx.views.intersection(b, b).unwrap();

    let after: Vec<u32> = fx.views.state(b).unwrap().node_bits.iter().collect();
    assert_eq!(before, after);
}

#[test]
fn test_fill_and_not_and_clear() {
    let mut fx = Fixture::new(3);
    let ab = fx.add_edge(10, 0, 1);
    let view = fx.views.create(false, false);

    fx.views.fill(view, &fx.nodes, &fx.edges).unwrap();
    {
        let state = fx.views.state(view).unwrap();
        assert_eq!(state.node_count(), 3);
        assert!(state.contains_edge(&fx.edges, ab));
    }

    // Complement: empty node set, so no edges survive closure.
    fx.views.not(view, &fx.nodes, &fx.edges).unwrap();
    {
        let state = fx.views.state(view).unwrap();
        assert_eq!(state.node_count(), 0);
        assert_eq!(state.edge_count(&fx.edges), 0);
    }

    // Complement of empty is everything; edges are re-derived.
    fx.views.not(view, &fx.nodes, &fx.edges).unwrap();
    {
        let state = fx.views.state(view).unwrap();
        assert_eq!(state.node_count(), 3);
        assert!(state.contains_edge(&fx.edges, ab));
    }

    fx.views.clear(view).unwrap();
    let state = fx.views.state(view).unwrap();
    assert_eq!(state.node_count(), 0);
    assert_eq!(state.edge_count(&fx.edges), 0);
}

#[test]
fn test_not_respects_closure_for_partial_views() {
    let mut fx = Fixture::new(3);
    let ab = fx.add_edge(10, 0, 1);
    let bc = fx.add_edge(11, 1, 2);
    let view = fx.views.create(false, false);
    fx.views.add_node(view, 0).unwrap();

    fx.views.not(view, &fx.nodes, &fx.edges).unwrap();

    let state = fx.views.state(view).unwrap();
    assert!(!state.contains_node(0));
    assert!(state.contains_node(1) && state.contains_node(2));
    // Only the edge fully inside the complement survives.
    assert!(!state.contains_edge(&fx.edges, ab));
    assert!(state.contains_edge(&fx.edges, bc));
}

#[test]
fn test_auto_include_picks_up_new_elements() {
    let mut fx = Fixture::new(2);
    let auto = fx.views.create(true, false);
    let manual = fx.views.create(false, false);
    fx.views.add_node(auto, 0).unwrap();
    fx.views.add_node(auto, 1).unwrap();

    let edge = fx.add_edge(10, 0, 1);
    fx.views.on_edge_added(edge, 0, 1);

    assert!(fx.views.state(auto).unwrap().contains_edge(&fx.edges, edge));
    assert!(!fx.views.state(manual).unwrap().contains_edge(&fx.edges, edge));

    // New base nodes follow the same flag.
    let slot = fx.nodes.add(AttrValue::I64(99)).unwrap();
    fx.views.on_node_added(slot);
    assert!(fx.views.state(auto).unwrap().contains_node(slot));
    assert!(!fx.views.state(manual).unwrap().contains_node(slot));
}

#[test]
fn test_auto_include_skips_edges_with_missing_endpoints() {
    let mut fx = Fixture::new(3);
    let auto = fx.views.create(true, false);
    fx.views.add_node(auto, 0).unwrap();
    // Node 2 is not in the view.
    let edge = fx.add_edge(10, 0, 2);
    fx.views.on_edge_added(edge, 0, 2);

    assert!(!fx.views.state(auto).unwrap().contains_edge(&fx.edges, edge));
}

#[test]
fn test_node_only_view_derives_edges_on_read() {
    let mut fx = Fixture::new(3);
    let ab = fx.add_edge(10, 0, 1);
    let bc = fx.add_edge(11, 1, 2);
    let view = fx.views.create(false, true);
    fx.views.add_node(view, 0).unwrap();
    fx.views.add_node(view, 1).unwrap();

    let state = fx.views.state(view).unwrap();
    assert!(state.contains_edge(&fx.edges, ab));
    assert!(!state.contains_edge(&fx.edges, bc));
    assert_eq!(state.edge_count(&fx.edges), 1);

    // Explicit edge mutation is rejected on node-only views.
    drop(state);
    assert!(fx.views.add_edge(view, &fx.edges, ab).is_err());
}

#[test]
fn test_view_degree_counts_view_edges_only() {
    let mut fx = Fixture::new(3);
    let ab = fx.add_edge(10, 0, 1);
    let _ac = fx.add_edge(11, 0, 2);
    let view = fx.views.create(false, false);
    for n in 0..3 {
        fx.views.add_node(view, n).unwrap();
    }
    fx.views.add_edge(view, &fx.edges, ab).unwrap();

    let state = fx.views.state(view).unwrap();
    assert_eq!(state.degree(&fx.nodes, &fx.edges, 0), 1);
    assert_eq!(state.degree(&fx.nodes, &fx.edges, 2), 0);
}

#[test]
fn test_destroyed_view_rejects_operations_and_recycles_slot() {
    let mut fx = Fixture::new(1);
    let a = fx.views.create(false, false);
    let b = fx.views.create(false, false);
    assert_eq!((a, b), (0, 1));

    fx.views.destroy(a).unwrap();
    assert!(matches!(fx.views.state(a), Err(Error::NotOwned("view"))));
    assert!(matches!(
        fx.views.add_node(a, 0),
        Err(Error::NotOwned("view"))
    ));

    // The smallest free slot is reused.
    let c = fx.views.create(false, false);
    assert_eq!(c, 0);
    assert_eq!(fx.views.len(), 2);
}
