//! # Hypha Core
//!
//! Embedded, in-memory property graph engine for large graphs: directed,
//! undirected, and mixed, with typed edges, columnar attributes,
//! time-indexed values, and bitset views over a shared base graph.
//!
//! ## Features
//!
//! - **Dense stores**: slot-recycling node and edge arenas with stable
//!   integer handles and O(1) adjacency splicing
//! - **Typed edges**: interned edge types, parallel-edge rejection,
//!   mutual-edge tracking, self-loop handling
//! - **Columnar attributes**: typed columns with secondary indices
//!   (equality everywhere, min/max and ranges for numerics)
//! - **Time layer**: timestamp- and interval-indexed values with range
//!   search and a reverse "active at t" index
//! - **Views**: roaring-bitmap subgraphs that stay coherent under base
//!   mutation, with full set algebra
//! - **Concurrency**: one reentrant read/write lock, lock-free version
//!   counters, polling observers with structural diffs
//!
//! ## Quick Start
//!
//! ```rust
//! use hypha_core::{Direction, GraphStore};
//!
//! let graph = GraphStore::new();
//! graph.add_node(1_i64)?;
//! graph.add_node(2_i64)?;
//! graph.add_edge(10_i64, 1_i64, 2_i64, 0_i64, true)?;
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.out_degree(&1_i64.into())?, 1);
//! let neighbors = graph.neighbors(&1_i64.into(), Direction::Both, None)?;
//! assert_eq!(neighbors.len(), 1);
//! # Ok::<(), hypha_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attr;
pub mod config;
pub mod error;
pub mod graph;
pub mod sync;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod sync_tests;

pub use attr::{
    AttrType, AttrValue, Column, ColumnOrigin, Interval, IntervalMap, TimestampMap,
};
pub use config::{ConfigError, GraphConfig, IdType, TimeRepresentation, WeightKind};
pub use error::{Error, Result};
pub use graph::{
    Direction, ElementKind, GraphDiff, GraphObserver, GraphStore, Subgraph, TypeId, ViewId,
};
