//! The mutable graph core.
//!
//! Dense slot-recycling node and edge stores with adjacency chains
//! threaded through edge records, edge-type interning with a
//! parallel-edge key table, bitset views, change observers, and the
//! [`store::GraphStore`] facade that wires them together under one lock.

pub mod adjacency;
pub mod edge;
pub mod node;
pub mod observer;
pub mod store;
pub mod type_table;
pub mod view;

#[cfg(test)]
mod edge_tests;
#[cfg(test)]
mod view_tests;

pub use adjacency::Direction;
pub use edge::EdgeRecord;
pub use node::NodeRecord;
pub use observer::{GraphDiff, GraphObserver};
pub use store::{
    EdgeChainCursor, EdgeCursor, ElementKind, GraphReader, GraphStore, GraphWriter, NodeCursor,
    Subgraph, WEIGHT_COLUMN,
};
pub use type_table::TypeId;
pub use view::ViewId;
