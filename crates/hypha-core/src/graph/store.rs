//! The graph store facade.
//!
//! [`GraphStore`] owns the whole graph state behind one reentrant lock:
//! node and edge stores, the type table, views, columns, indices, the
//! time layer, graph attributes, and the observer registry. Public
//! operations take a lock ticket per call; [`GraphStore::read`] and
//! [`GraphStore::write`] hand out batch guards that expose the same
//! surface on a held ticket.

use std::sync::Arc;

use indexmap::IndexMap;
use roaring::RoaringBitmap;
use tracing::{debug, trace};

use crate::attr::column::{Column, ColumnOrigin, ColumnTable};
use crate::attr::index::{ColumnIndex, IndexStore};
use crate::attr::time::{Interval, TimeIndexStore, TimePoint};
use crate::attr::value::{standardize_id, AttrType, AttrValue};
use crate::config::{GraphConfig, TimeRepresentation, WeightKind};
use crate::error::{Error, Result};
use crate::graph::adjacency::Direction;
use crate::graph::edge::{EdgeRecord, EdgeStore};
use crate::graph::node::{NodeRecord, NodeStore};
use crate::graph::observer::{GraphDiff, GraphObserver, ObserverRegistry};
use crate::graph::type_table::{EdgeTypeTable, TypeId};
use crate::graph::view::{ViewId, ViewStore};
use crate::sync::{GraphLock, ReadTicket, VersionCounters, WriteTicket};

/// Reserved id of the edge weight column.
pub const WEIGHT_COLUMN: &str = "weight";

const MAIN_VIEW: u32 = u32::MAX;

/// Which element kind an attribute or index operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Nodes.
    Node,
    /// Edges.
    Edge,
}

/// Everything guarded by the graph lock.
#[derive(Debug)]
pub(crate) struct GraphState {
    config: GraphConfig,
    versions: Arc<VersionCounters>,
    nodes: NodeStore,
    edges: EdgeStore,
    types: EdgeTypeTable,
    views: ViewStore,
    node_columns: ColumnTable,
    edge_columns: ColumnTable,
    node_indices: IndexStore,
    edge_indices: IndexStore,
    node_time_index: Option<TimeIndexStore>,
    edge_time_index: Option<TimeIndexStore>,
    graph_attrs: IndexMap<String, AttrValue>,
    observers: ObserverRegistry,
    weight_column_slot: Option<u32>,
}

/// The embedded in-memory graph store.
///
/// Thread-safe: readers share, writers exclude, versions are readable
/// without the lock. See [`GraphConfig`] for the construction options.
#[derive(Debug)]
pub struct GraphStore {
    config: GraphConfig,
    versions: Arc<VersionCounters>,
    lock: GraphLock<GraphState>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Creates a store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default()).expect("default config is valid")
    }

    /// Creates a store from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] wrapping the validation message
    /// on an inconsistent configuration.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|err| Error::UnsupportedType(err.to_string()))?;
        let versions = Arc::new(VersionCounters::default());
        let mut state = GraphState {
            config: config.clone(),
            versions: Arc::clone(&versions),
            nodes: NodeStore::new(),
            edges: EdgeStore::new(),
            types: EdgeTypeTable::new(),
            views: ViewStore::new(),
            node_columns: ColumnTable::new(),
            edge_columns: ColumnTable::new(),
            node_indices: IndexStore::new(),
            edge_indices: IndexStore::new(),
            node_time_index: config
                .enable_index_time
                .then(|| TimeIndexStore::new(config.time_representation)),
            edge_time_index: config
                .enable_index_time
                .then(|| TimeIndexStore::new(config.time_representation)),
            graph_attrs: IndexMap::new(),
            observers: ObserverRegistry::default(),
            weight_column_slot: None,
        };
        if config.edge_weight_column {
            let column = match config.edge_weight_kind {
                WeightKind::Static => Column::new(WEIGHT_COLUMN, AttrType::F64)
                    .with_origin(ColumnOrigin::Property)
                    .with_default(AttrValue::F64(1.0)),
                WeightKind::Dynamic => {
                    let ty = match config.time_representation {
                        TimeRepresentation::Timestamp => {
                            AttrType::TimestampMap(Box::new(AttrType::F64))
                        }
                        TimeRepresentation::Interval => {
                            AttrType::IntervalMap(Box::new(AttrType::F64))
                        }
                    };
                    Column::new(WEIGHT_COLUMN, ty).with_origin(ColumnOrigin::Property)
                }
            };
            let slot = state.edge_columns.add(column)?;
            state
                .edge_indices
                .add_column(slot, state.edge_columns.get(WEIGHT_COLUMN).expect("weight column"));
            state.weight_column_slot = Some(slot);
        }
        Ok(Self {
            config,
            versions,
            lock: GraphLock::new(state),
        })
    }

    /// The configuration this store was built with.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Current node version, readable without the lock.
    #[must_use]
    pub fn node_version(&self) -> u64 {
        self.versions.node()
    }

    /// Current edge version, readable without the lock.
    #[must_use]
    pub fn edge_version(&self) -> u64 {
        self.versions.edge()
    }

    /// The pseudo-handle of the main view (the base graph itself).
    ///
    /// Set-algebra and mutation calls on it are rejected.
    #[must_use]
    pub fn main_view() -> ViewId {
        ViewId(MAIN_VIEW)
    }

    /// Acquires a batch read guard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockUpgrade`] when the thread holds the write
    /// ticket.
    pub fn read(&self) -> Result<GraphReader<'_>> {
        Ok(GraphReader {
            state: self.lock.read()?,
        })
    }

    /// Acquires a batch write guard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockUpgrade`] on upgrade or re-entrant write.
    pub fn write(&self) -> Result<GraphWriter<'_>> {
        Ok(GraphWriter {
            state: self.lock.write()?,
        })
    }

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Adds a node. The id is standardized against the configured id
    /// type; duplicates are rejected.
    ///
    /// # Errors
    ///
    /// [`Error::IdTypeMismatch`], [`Error::DuplicateNode`].
    pub fn add_node(&self, id: impl Into<AttrValue>) -> Result<u32> {
        self.write()?.add_node(id)
    }

    /// Adds an edge between two existing nodes.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for missing endpoints, [`Error::DuplicateEdge`]
    /// for a reused edge id, [`Error::ParallelEdge`] for an edge whose
    /// (endpoints, type) key exists.
    pub fn add_edge(
        &self,
        id: impl Into<AttrValue>,
        source: impl Into<AttrValue>,
        target: impl Into<AttrValue>,
        edge_type: impl Into<AttrValue>,
        directed: bool,
    ) -> Result<u32> {
        self.write()?.add_edge(id, source, target, edge_type, directed)
    }

    /// Removes a node and every incident edge.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown id.
    pub fn remove_node(&self, id: impl Into<AttrValue>) -> Result<()> {
        self.write()?.remove_node(id)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown id.
    pub fn remove_edge(&self, id: impl Into<AttrValue>) -> Result<()> {
        self.write()?.remove_edge(id)
    }

    /// Removes every node and edge. Columns, interned types, and graph
    /// attributes survive.
    ///
    /// # Errors
    ///
    /// Lock errors only.
    pub fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Removes every edge, optionally restricted to a type.
    ///
    /// # Errors
    ///
    /// Lock errors only; an unknown type label clears nothing.
    pub fn clear_edges(&self, edge_type: Option<&AttrValue>) -> Result<()> {
        self.write()?.clear_edges(edge_type)
    }

    /// Removes the edges incident to a node, optionally restricted to a
    /// type.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn clear_node_edges(
        &self,
        node: impl Into<AttrValue>,
        edge_type: Option<&AttrValue>,
    ) -> Result<()> {
        self.write()?.clear_node_edges(node, edge_type)
    }

    /// Removes an unused edge type, recycling its id.
    ///
    /// # Errors
    ///
    /// [`Error::TypeInUse`] when edges of the type remain.
    pub fn remove_edge_type(&self, label: &AttrValue) -> Result<()> {
        let mut writer = self.write()?;
        writer.state.types.remove(label)?;
        Ok(())
    }

    // =========================================================================
    // Structural queries
    // =========================================================================

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.read().map_or(0, |reader| reader.state.nodes.len())
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.read().map_or(0, |reader| reader.state.edges.len())
    }

    /// Number of live edges of a type.
    #[must_use]
    pub fn edge_count_of(&self, edge_type: &AttrValue) -> u64 {
        self.read().map_or(0, |reader| {
            reader
                .state
                .types
                .get(edge_type)
                .map_or(0, |ty| reader.state.types.count(ty))
        })
    }

    /// Whether a node with this user id exists.
    #[must_use]
    pub fn contains_node(&self, id: &AttrValue) -> bool {
        self.read()
            .is_ok_and(|reader| reader.state.resolve_node(id).is_ok())
    }

    /// Whether an edge with this user id exists.
    #[must_use]
    pub fn contains_edge(&self, id: &AttrValue) -> bool {
        self.read()
            .is_ok_and(|reader| reader.state.resolve_edge(id).is_ok())
    }

    /// The slot of a node id.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown id.
    pub fn node_store_id(&self, id: &AttrValue) -> Result<u32> {
        self.read()?.state.resolve_node(id)
    }

    /// The slot of an edge id.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown id.
    pub fn edge_store_id(&self, id: &AttrValue) -> Result<u32> {
        self.read()?.state.resolve_edge(id)
    }

    /// The edge between two nodes, trying the directed key first and the
    /// undirected key second. Without a type, every live type is probed
    /// in id order.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for unknown endpoints.
    pub fn edge_between(
        &self,
        source: &AttrValue,
        target: &AttrValue,
        edge_type: Option<&AttrValue>,
    ) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let src = state.resolve_node(source)?;
        let dst = state.resolve_node(target)?;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(None);
        }
        Ok(state
            .edge_between(src, dst, ty)
            .map(|slot| state.edges.get(slot).expect("live edge").id.clone()))
    }

    /// All edges between two nodes across types, in type-id order.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for unknown endpoints.
    pub fn edges_between(&self, source: &AttrValue, target: &AttrValue) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let src = state.resolve_node(source)?;
        let dst = state.resolve_node(target)?;
        let mut result = Vec::new();
        for ty in state.types.ids() {
            if let Some(slot) = state.edges.find(src, dst, ty) {
                result.push(state.edges.get(slot).expect("live edge").id.clone());
            }
        }
        Ok(result)
    }

    /// Ids of the edges incident to a node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn edges_of(
        &self,
        node: &AttrValue,
        direction: Direction,
        edge_type: Option<&AttrValue>,
    ) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_node(node)?;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(Vec::new());
        }
        let record = state.nodes.get(slot).expect("live node");
        Ok(state
            .edges
            .edges_of(record, direction, ty)
            .into_iter()
            .map(|edge| edge.id.clone())
            .collect())
    }

    /// Ids of the outgoing edges of a node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn out_edges(&self, node: &AttrValue) -> Result<Vec<AttrValue>> {
        self.edges_of(node, Direction::Out, None)
    }

    /// Ids of the incoming edges of a node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn in_edges(&self, node: &AttrValue) -> Result<Vec<AttrValue>> {
        self.edges_of(node, Direction::In, None)
    }

    /// Ids of a node's neighbors. Mutual pairs yield the neighbor once;
    /// a self-loop contributes the node itself once.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn neighbors(
        &self,
        node: &AttrValue,
        direction: Direction,
        edge_type: Option<&AttrValue>,
    ) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_node(node)?;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(Vec::new());
        }
        let record = state.nodes.get(slot).expect("live node");
        Ok(state
            .edges
            .neighbors_of(record, direction, ty)
            .into_iter()
            .map(|neighbor| state.nodes.get(neighbor).expect("live node").id.clone())
            .collect())
    }

    /// Neighbors reachable along outgoing edges.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn successors(&self, node: &AttrValue) -> Result<Vec<AttrValue>> {
        self.neighbors(node, Direction::Out, None)
    }

    /// Neighbors reaching this node along their outgoing edges.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn predecessors(&self, node: &AttrValue) -> Result<Vec<AttrValue>> {
        self.neighbors(node, Direction::In, None)
    }

    /// The endpoint of an edge opposite to a node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for unknown ids or a node not on the edge.
    pub fn opposite(&self, edge: &AttrValue, node: &AttrValue) -> Result<AttrValue> {
        let reader = self.read()?;
        let state = &*reader.state;
        let edge_slot = state.resolve_edge(edge)?;
        let node_slot = state.resolve_node(node)?;
        let record = state.edges.get(edge_slot).expect("live edge");
        if record.source != node_slot && record.target != node_slot {
            return Err(Error::NotOwned("node"));
        }
        let other = record.opposite(node_slot);
        Ok(state.nodes.get(other).expect("live node").id.clone())
    }

    /// Ids of every self-loop edge.
    #[must_use]
    pub fn self_loops(&self) -> Vec<AttrValue> {
        self.read().map_or_else(
            |_| Vec::new(),
            |reader| {
                reader
                    .state
                    .edges
                    .self_loops()
                    .map(|record| record.id.clone())
                    .collect()
            },
        )
    }

    /// Whether an edge (of the type, when given) connects the two nodes
    /// in either key space.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for unknown endpoints.
    pub fn is_adjacent(
        &self,
        source: &AttrValue,
        target: &AttrValue,
        edge_type: Option<&AttrValue>,
    ) -> Result<bool> {
        let reader = self.read()?;
        let state = &*reader.state;
        let src = state.resolve_node(source)?;
        let dst = state.resolve_node(target)?;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(false);
        }
        Ok(state.edge_between(src, dst, ty).is_some())
    }

    /// Whether the node is an endpoint of the edge.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for unknown ids.
    pub fn is_incident(&self, edge: &AttrValue, node: &AttrValue) -> Result<bool> {
        let reader = self.read()?;
        let state = &*reader.state;
        let edge_slot = state.resolve_edge(edge)?;
        let node_slot = state.resolve_node(node)?;
        let record = state.edges.get(edge_slot).expect("live edge");
        Ok(record.source == node_slot || record.target == node_slot)
    }

    /// Undirected-sense degree: a mutual pair counts once, a self-loop
    /// counts once.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn degree(&self, node: &AttrValue) -> Result<u32> {
        self.with_node(node, NodeRecord::degree)
    }

    /// Incoming degree, self-loops included.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn in_degree(&self, node: &AttrValue) -> Result<u32> {
        self.with_node(node, NodeRecord::in_degree)
    }

    /// Outgoing degree, self-loops included.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn out_degree(&self, node: &AttrValue) -> Result<u32> {
        self.with_node(node, NodeRecord::out_degree)
    }

    /// Count of incident undirected edges.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn undirected_degree(&self, node: &AttrValue) -> Result<u32> {
        self.with_node(node, NodeRecord::undirected_degree)
    }

    /// The reverse-direction counterpart of a directed edge, if present.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown edge id.
    pub fn mutual_edge(&self, edge: &AttrValue) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_edge(edge)?;
        Ok(state
            .edges
            .mutual(slot)
            .map(|mutual| state.edges.get(mutual).expect("live edge").id.clone()))
    }

    /// Number of live edge types.
    #[must_use]
    pub fn edge_type_count(&self) -> usize {
        self.read().map_or(0, |reader| reader.state.types.len())
    }

    /// Number of live directed edges.
    #[must_use]
    pub fn directed_edge_count(&self) -> u64 {
        self.read()
            .map_or(0, |reader| reader.state.types.directed_count())
    }

    /// Number of live undirected edges.
    #[must_use]
    pub fn undirected_edge_count(&self) -> u64 {
        self.read()
            .map_or(0, |reader| reader.state.types.undirected_count())
    }

    /// True when every edge is directed.
    #[must_use]
    pub fn is_directed_graph(&self) -> bool {
        self.read()
            .is_ok_and(|reader| reader.state.types.is_directed_graph())
    }

    /// True when every edge is undirected.
    #[must_use]
    pub fn is_undirected_graph(&self) -> bool {
        self.read()
            .is_ok_and(|reader| reader.state.types.is_undirected_graph())
    }

    /// True when directed and undirected edges coexist.
    #[must_use]
    pub fn is_mixed_graph(&self) -> bool {
        self.read()
            .is_ok_and(|reader| reader.state.types.is_mixed_graph())
    }

    fn with_node<R>(&self, node: &AttrValue, f: impl FnOnce(&NodeRecord) -> R) -> Result<R> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_node(node)?;
        Ok(f(state.nodes.get(slot).expect("live node")))
    }

    // =========================================================================
    // Columns and attributes
    // =========================================================================

    /// Adds a column for the element kind, growing attribute arrays
    /// lazily.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateColumn`], [`Error::TypeMismatch`] on a bad
    /// default.
    pub fn add_column(&self, kind: ElementKind, column: Column) -> Result<u32> {
        let mut writer = self.write()?;
        writer.state.add_column(kind, column)
    }

    /// Removes a column and drops its values and index. The slot is
    /// retired.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn remove_column(&self, kind: ElementKind, id: &str) -> Result<()> {
        let mut writer = self.write()?;
        writer.state.remove_column(kind, id)
    }

    /// A clone of a column definition.
    #[must_use]
    pub fn column(&self, kind: ElementKind, id: &str) -> Option<Column> {
        self.read()
            .ok()?
            .state
            .columns(kind)
            .get(id)
            .cloned()
    }

    /// Clones of all live columns, in slot order.
    #[must_use]
    pub fn columns(&self, kind: ElementKind) -> Vec<Column> {
        self.read().map_or_else(
            |_| Vec::new(),
            |reader| reader.state.columns(kind).iter().cloned().collect(),
        )
    }

    /// Sets a static (or whole dynamic-map) attribute value, routing the
    /// change to the column index and the time index.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`], [`Error::ReadOnlyColumn`],
    /// [`Error::TypeMismatch`], [`Error::NotOwned`].
    pub fn set_attribute(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
    ) -> Result<Option<AttrValue>> {
        self.write()?.set_attribute(kind, element, column, value)
    }

    /// Sets a dynamic attribute value at a timestamp.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::set_attribute`], plus [`Error::InvalidTime`] and
    /// type errors from the timestamp map.
    pub fn set_attribute_at(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
        timestamp: f64,
    ) -> Result<Option<AttrValue>> {
        self.write()?
            .set_attribute_at(kind, element, column, value, timestamp)
    }

    /// Sets a dynamic attribute value on an interval.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::set_attribute_at`].
    pub fn set_attribute_on(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
        interval: Interval,
    ) -> Result<Option<AttrValue>> {
        self.write()?
            .set_attribute_on(kind, element, column, value, interval)
    }

    /// An attribute value, falling back to the column default when unset.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`], [`Error::NotOwned`].
    pub fn attribute(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
    ) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        reader.state.attribute(kind, element, column)
    }

    /// A dynamic attribute value at a timestamp.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`], [`Error::NotOwned`],
    /// [`Error::TypeMismatch`] for a non-dynamic column.
    pub fn attribute_at(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        timestamp: f64,
    ) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        reader.state.attribute_at(kind, element, column, timestamp)
    }

    // =========================================================================
    // Edge weight
    // =========================================================================

    /// The static weight of an edge.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`]; [`Error::ColumnNotFound`] when the store has
    /// no weight column.
    pub fn edge_weight(&self, edge: &AttrValue) -> Result<f64> {
        let reader = self.read()?;
        let state = &*reader.state;
        if state.weight_column_slot.is_none() {
            return Err(Error::ColumnNotFound(WEIGHT_COLUMN.to_string()));
        }
        let slot = state.resolve_edge(edge)?;
        Ok(state.edges.get(slot).expect("live edge").weight)
    }

    /// Sets the static weight of an edge.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::edge_weight`]; [`Error::TypeMismatch`] when the
    /// weight column is dynamic.
    pub fn set_edge_weight(&self, edge: &AttrValue, weight: f64) -> Result<()> {
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        if state.weight_column_slot.is_none() {
            return Err(Error::ColumnNotFound(WEIGHT_COLUMN.to_string()));
        }
        if state.config.edge_weight_kind == WeightKind::Dynamic {
            return Err(Error::TypeMismatch {
                column: WEIGHT_COLUMN.to_string(),
                expected: "dynamic weight".to_string(),
                actual: "static weight".to_string(),
            });
        }
        let slot = state.resolve_edge(edge)?;
        state.edges.get_mut(slot).expect("live edge").weight = weight;
        Ok(())
    }

    /// The weight of an edge at a timestamp, for dynamic weight columns.
    ///
    /// # Errors
    ///
    /// As [`GraphStore::edge_weight`]; [`Error::TypeMismatch`] when the
    /// weight column is static.
    pub fn edge_weight_at(&self, edge: &AttrValue, timestamp: f64) -> Result<Option<f64>> {
        let reader = self.read()?;
        let state = &*reader.state;
        if state.config.edge_weight_kind != WeightKind::Dynamic {
            return Err(Error::TypeMismatch {
                column: WEIGHT_COLUMN.to_string(),
                expected: "static weight".to_string(),
                actual: "dynamic weight".to_string(),
            });
        }
        let value = state.attribute_at(ElementKind::Edge, edge, WEIGHT_COLUMN, timestamp)?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    // =========================================================================
    // Index queries
    // =========================================================================

    /// Number of elements carrying the value. For a non-indexed column
    /// the no-op index stands for the whole element set.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_count(&self, kind: ElementKind, column: &str, value: &AttrValue) -> Result<u64> {
        let reader = self.read()?;
        let state = &*reader.state;
        let (index, _) = state.index_of(kind, column)?;
        match index {
            ColumnIndex::Noop => Ok(state.element_count(kind) as u64),
            indexed => Ok(indexed.count(value)),
        }
    }

    /// Ids of the elements carrying the value (the whole element set for
    /// a non-indexed column).
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_get(
        &self,
        kind: ElementKind,
        column: &str,
        value: &AttrValue,
    ) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let (index, _) = state.index_of(kind, column)?;
        match index {
            ColumnIndex::Noop => Ok(state.all_ids(kind)),
            indexed => {
                let Some(bits) = indexed.get(value) else {
                    return Ok(Vec::new());
                };
                Ok(state.ids_for_bits(kind, bits))
            }
        }
    }

    /// Distinct indexed values, ordered for sortable indices.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_values(&self, kind: ElementKind, column: &str) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.values())
    }

    /// Number of distinct indexed values.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_count_values(&self, kind: ElementKind, column: &str) -> Result<usize> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.count_values())
    }

    /// Number of indexed (element, value) entries.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_count_elements(&self, kind: ElementKind, column: &str) -> Result<u64> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.count_elements())
    }

    /// Smallest indexed value of a sortable column.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_min_value(&self, kind: ElementKind, column: &str) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.min_value())
    }

    /// Largest indexed value of a sortable column.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_max_value(&self, kind: ElementKind, column: &str) -> Result<Option<AttrValue>> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.max_value())
    }

    /// Whether the column's index supports min/max.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`].
    pub fn index_is_sortable(&self, kind: ElementKind, column: &str) -> Result<bool> {
        let reader = self.read()?;
        Ok(reader.state.index_of(kind, column)?.0.is_sortable())
    }

    // =========================================================================
    // Time queries
    // =========================================================================

    /// Ids of the elements with at least one dynamic value at the time
    /// point.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] when the time index is disabled.
    pub fn elements_at(&self, kind: ElementKind, timestamp: f64) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let index = state
            .time_index(kind)
            .ok_or_else(|| Error::UnsupportedType("time index disabled".to_string()))?;
        let bits = index.elements_at(timestamp);
        Ok(state.ids_for_bits(kind, &bits))
    }

    /// Ids of the elements with a dynamic value inside `[low, high]`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] when the time index is disabled.
    pub fn elements_in(&self, kind: ElementKind, low: f64, high: f64) -> Result<Vec<AttrValue>> {
        let reader = self.read()?;
        let state = &*reader.state;
        let index = state
            .time_index(kind)
            .ok_or_else(|| Error::UnsupportedType("time index disabled".to_string()))?;
        let bits = index.elements_in(low, high);
        Ok(state.ids_for_bits(kind, &bits))
    }

    // =========================================================================
    // Graph attributes
    // =========================================================================

    /// Sets a graph-level attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// Lock errors only.
    pub fn set_graph_attribute(&self, key: &str, value: AttrValue) -> Result<Option<AttrValue>> {
        let mut writer = self.write()?;
        Ok(writer.state.graph_attrs.insert(key.to_string(), value))
    }

    /// Sets a graph-level dynamic attribute at a timestamp.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidTime`], [`Error::TypeMismatch`] on a value type
    /// change.
    pub fn set_graph_attribute_at(
        &self,
        key: &str,
        value: AttrValue,
        timestamp: f64,
    ) -> Result<()> {
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let entry = state.graph_attrs.entry(key.to_string());
        let map = match entry {
            indexmap::map::Entry::Occupied(occupied) => {
                let AttrValue::Timestamps(_) = occupied.get() else {
                    return Err(Error::TypeMismatch {
                        column: key.to_string(),
                        expected: "timestamp map".to_string(),
                        actual: occupied.get().attr_type().to_string(),
                    });
                };
                occupied.into_mut()
            }
            indexmap::map::Entry::Vacant(vacant) => vacant.insert(AttrValue::Timestamps(
                crate::attr::time::TimestampMap::new(value.attr_type())?,
            )),
        };
        let AttrValue::Timestamps(timestamps) = map else {
            unreachable!("entry was just checked or created as a timestamp map")
        };
        timestamps.put(timestamp, value)?;
        Ok(())
    }

    /// Sets a graph-level dynamic attribute on an interval.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] on a value type change.
    pub fn set_graph_attribute_on(
        &self,
        key: &str,
        value: AttrValue,
        interval: Interval,
    ) -> Result<()> {
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let entry = state.graph_attrs.entry(key.to_string());
        let map = match entry {
            indexmap::map::Entry::Occupied(occupied) => {
                let AttrValue::Intervals(_) = occupied.get() else {
                    return Err(Error::TypeMismatch {
                        column: key.to_string(),
                        expected: "interval map".to_string(),
                        actual: occupied.get().attr_type().to_string(),
                    });
                };
                occupied.into_mut()
            }
            indexmap::map::Entry::Vacant(vacant) => vacant.insert(AttrValue::Intervals(
                crate::attr::time::IntervalMap::new(value.attr_type())?,
            )),
        };
        let AttrValue::Intervals(intervals) = map else {
            unreachable!("entry was just checked or created as an interval map")
        };
        intervals.put(interval, value)?;
        Ok(())
    }

    /// A graph-level attribute value.
    #[must_use]
    pub fn graph_attribute(&self, key: &str) -> Option<AttrValue> {
        self.read().ok()?.state.graph_attrs.get(key).cloned()
    }

    /// A graph-level dynamic attribute value at a timestamp.
    #[must_use]
    pub fn graph_attribute_at(&self, key: &str, timestamp: f64) -> Option<AttrValue> {
        let reader = self.read().ok()?;
        match reader.state.graph_attrs.get(key)? {
            AttrValue::Timestamps(map) => map.get(timestamp).cloned(),
            AttrValue::Intervals(map) => map.values_at(timestamp).next().cloned(),
            other => Some(other.clone()),
        }
    }

    /// Graph attribute keys in insertion order.
    #[must_use]
    pub fn graph_attribute_keys(&self) -> Vec<String> {
        self.read().map_or_else(
            |_| Vec::new(),
            |reader| reader.state.graph_attrs.keys().cloned().collect(),
        )
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Creates a view. `auto_include` defaults from the configuration.
    ///
    /// # Errors
    ///
    /// Lock errors only.
    pub fn create_view(&self) -> Result<ViewId> {
        let mut writer = self.write()?;
        let auto = writer.state.config.view_auto_include;
        Ok(ViewId(writer.state.views.create(auto, false)))
    }

    /// Creates a view with an explicit auto-include flag.
    ///
    /// # Errors
    ///
    /// Lock errors only.
    pub fn create_view_with(&self, auto_include: bool, node_view_only: bool) -> Result<ViewId> {
        let mut writer = self.write()?;
        Ok(ViewId(writer.state.views.create(auto_include, node_view_only)))
    }

    /// Destroys a view; its slot id is recycled.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`] for a dead handle.
    pub fn destroy_view(&self, view: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        self.write()?.state.views.destroy(view.0)
    }

    /// Adds a node to a view.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_add_node(&self, view: ViewId, node: &AttrValue) -> Result<bool> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let slot = state.resolve_node(node)?;
        state.views.add_node(view.0, slot)
    }

    /// Removes a node from a view, clearing its incident edge bits.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_remove_node(&self, view: ViewId, node: &AttrValue) -> Result<bool> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let slot = state.resolve_node(node)?;
        let GraphState {
            views,
            nodes,
            edges,
            ..
        } = state;
        views.remove_node(view.0, nodes, edges, slot)
    }

    /// Adds an edge to a view; its endpoints must already be present.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::ViewClosure`], [`Error::NotOwned`].
    pub fn view_add_edge(&self, view: ViewId, edge: &AttrValue) -> Result<bool> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let slot = state.resolve_edge(edge)?;
        let GraphState { views, edges, .. } = state;
        views.add_edge(view.0, edges, slot)
    }

    /// Removes an edge from a view.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_remove_edge(&self, view: ViewId, edge: &AttrValue) -> Result<bool> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let slot = state.resolve_edge(edge)?;
        state.views.remove_edge(view.0, slot)
    }

    /// Unions another view into the first.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`] for either handle, [`Error::NotOwned`].
    pub fn view_union(&self, view: ViewId, other: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        Self::reject_main(other)?;
        self.write()?.state.views.union(view.0, other.0)
    }

    /// Intersects another view into the first.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`] for either handle, [`Error::NotOwned`].
    pub fn view_intersection(&self, view: ViewId, other: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        Self::reject_main(other)?;
        self.write()?.state.views.intersection(view.0, other.0)
    }

    /// Fills a view with every live base element.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_fill(&self, view: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let GraphState {
            views,
            nodes,
            edges,
            ..
        } = state;
        views.fill(view.0, nodes, edges)
    }

    /// Complements a view's node set within the base graph.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_not(&self, view: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        let mut writer = self.write()?;
        let state = &mut *writer.state;
        let GraphState {
            views,
            nodes,
            edges,
            ..
        } = state;
        views.not(view.0, nodes, edges)
    }

    /// Empties a view.
    ///
    /// # Errors
    ///
    /// [`Error::MainView`], [`Error::NotOwned`].
    pub fn view_clear(&self, view: ViewId) -> Result<()> {
        Self::reject_main(view)?;
        self.write()?.state.views.clear(view.0)
    }

    /// Number of nodes in a view (base count for the main view).
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for a dead handle.
    pub fn view_node_count(&self, view: ViewId) -> Result<u64> {
        let reader = self.read()?;
        if view.0 == MAIN_VIEW {
            return Ok(reader.state.nodes.len() as u64);
        }
        Ok(reader.state.views.state(view.0)?.node_count())
    }

    /// Number of edges in a view (base count for the main view).
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for a dead handle.
    pub fn view_edge_count(&self, view: ViewId) -> Result<u64> {
        let reader = self.read()?;
        if view.0 == MAIN_VIEW {
            return Ok(reader.state.edges.len() as u64);
        }
        Ok(reader.state.views.state(view.0)?.edge_count(&reader.state.edges))
    }

    /// Whether a view contains the node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn view_contains_node(&self, view: ViewId, node: &AttrValue) -> Result<bool> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_node(node)?;
        if view.0 == MAIN_VIEW {
            return Ok(true);
        }
        Ok(state.views.state(view.0)?.contains_node(slot))
    }

    /// Whether a view contains the edge.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn view_contains_edge(&self, view: ViewId, edge: &AttrValue) -> Result<bool> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_edge(edge)?;
        if view.0 == MAIN_VIEW {
            return Ok(true);
        }
        Ok(state.views.state(view.0)?.contains_edge(&state.edges, slot))
    }

    /// Count of view edges incident to the node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn view_degree(&self, view: ViewId, node: &AttrValue) -> Result<u32> {
        let reader = self.read()?;
        let state = &*reader.state;
        let slot = state.resolve_node(node)?;
        if view.0 == MAIN_VIEW {
            return Ok(state.nodes.get(slot).expect("live node").degree());
        }
        Ok(state.views.state(view.0)?.degree(&state.nodes, &state.edges, slot))
    }

    fn reject_main(view: ViewId) -> Result<()> {
        if view.0 == MAIN_VIEW {
            return Err(Error::MainView);
        }
        Ok(())
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Registers an observer; it snapshots the current versions.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedType`] when observers are disabled.
    pub fn create_observer(&self, with_diff: bool) -> Result<GraphObserver> {
        if !self.config.enable_observers {
            return Err(Error::UnsupportedType("observers disabled".to_string()));
        }
        let mut writer = self.write()?;
        let shared = writer.state.observers.register(
            self.versions.node(),
            self.versions.edge(),
            with_diff,
        );
        Ok(GraphObserver { shared })
    }

    /// Whether the graph changed since the observer's last poll.
    /// Lock-free; benign staleness is reported on the next poll.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for a destroyed observer.
    pub fn observer_changed(&self, observer: &GraphObserver) -> Result<bool> {
        if !observer.shared.is_alive() {
            return Err(Error::NotOwned("observer"));
        }
        Ok(observer
            .shared
            .changed(self.versions.node(), self.versions.edge()))
    }

    /// Drains the observer's accumulated diff under the read lock.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for a destroyed observer.
    pub fn observer_diff(&self, observer: &GraphObserver) -> Result<GraphDiff> {
        if !observer.shared.is_alive() {
            return Err(Error::NotOwned("observer"));
        }
        let _reader = self.read()?;
        Ok(observer.shared.drain_diff())
    }

    /// Unregisters an observer; the handle is dead afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] when already destroyed.
    pub fn destroy_observer(&self, observer: &GraphObserver) -> Result<()> {
        let mut writer = self.write()?;
        if writer.state.observers.unregister(&observer.shared) {
            Ok(())
        } else {
            Err(Error::NotOwned("observer"))
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.read()
            .map_or(0, |reader| reader.state.observers.len())
    }

    // =========================================================================
    // Detached cursors
    // =========================================================================

    /// A detached cursor over node ids. It re-validates the node version
    /// on every step unless `allow_stale` consents to unsafe iteration.
    #[must_use]
    pub fn node_cursor(&self, allow_stale: bool) -> NodeCursor<'_> {
        NodeCursor {
            store: self,
            pos: 0,
            version: self.versions.node(),
            allow_stale,
        }
    }

    /// A detached cursor over edge ids, with the same staleness contract
    /// as [`GraphStore::node_cursor`].
    #[must_use]
    pub fn edge_cursor(&self, allow_stale: bool) -> EdgeCursor<'_> {
        EdgeCursor {
            store: self,
            pos: 0,
            version: self.versions.edge(),
            allow_stale,
        }
    }
}

/// Detached, restart-safe cursor over node ids.
pub struct NodeCursor<'a> {
    store: &'a GraphStore,
    pos: u32,
    version: u64,
    allow_stale: bool,
}

impl NodeCursor<'_> {
    /// The next node id.
    ///
    /// # Errors
    ///
    /// [`Error::ConcurrentModification`] when the node version moved and
    /// staleness was not allowed.
    pub fn next(&mut self) -> Result<Option<AttrValue>> {
        let reader = self.store.read()?;
        let current = self.store.versions.node();
        if !self.allow_stale && current != self.version {
            return Err(Error::ConcurrentModification {
                observed: self.version,
                current,
            });
        }
        self.version = current;
        let state = &*reader.state;
        while (self.pos as usize) < state.nodes.slot_count() {
            let slot = self.pos;
            self.pos += 1;
            if let Some(record) = state.nodes.get(slot) {
                return Ok(Some(record.id.clone()));
            }
        }
        Ok(None)
    }
}

/// Detached, restart-safe cursor over edge ids.
pub struct EdgeCursor<'a> {
    store: &'a GraphStore,
    pos: u32,
    version: u64,
    allow_stale: bool,
}

impl EdgeCursor<'_> {
    /// The next edge id.
    ///
    /// # Errors
    ///
    /// [`Error::ConcurrentModification`] when the edge version moved and
    /// staleness was not allowed.
    pub fn next(&mut self) -> Result<Option<AttrValue>> {
        let reader = self.store.read()?;
        let current = self.store.versions.edge();
        if !self.allow_stale && current != self.version {
            return Err(Error::ConcurrentModification {
                observed: self.version,
                current,
            });
        }
        self.version = current;
        let state = &*reader.state;
        while (self.pos as usize) < state.edges.slot_count() {
            let slot = self.pos;
            self.pos += 1;
            if let Some(record) = state.edges.get(slot) {
                return Ok(Some(record.id.clone()));
            }
        }
        Ok(None)
    }
}

/// Batch read guard: borrowing queries on a held read ticket.
pub struct GraphReader<'a> {
    state: ReadTicket<'a, GraphState>,
}

impl GraphReader<'_> {
    /// The node record for a user id.
    #[must_use]
    pub fn node(&self, id: &AttrValue) -> Option<&NodeRecord> {
        let slot = self.state.resolve_node(id).ok()?;
        self.state.nodes.get(slot)
    }

    /// The edge record for a user id.
    #[must_use]
    pub fn edge(&self, id: &AttrValue) -> Option<&EdgeRecord> {
        let slot = self.state.resolve_edge(id).ok()?;
        self.state.edges.get(slot)
    }

    /// The node record at a slot.
    #[must_use]
    pub fn node_by_store_id(&self, slot: u32) -> Option<&NodeRecord> {
        self.state.nodes.get(slot)
    }

    /// The edge record at a slot.
    #[must_use]
    pub fn edge_by_store_id(&self, slot: u32) -> Option<&EdgeRecord> {
        self.state.edges.get(slot)
    }

    /// Live node records in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.state.nodes.iter()
    }

    /// Live edge records in slot order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.state.edges.iter()
    }

    /// Incident edges of a node record, most recently added first.
    #[must_use]
    pub fn edges_of(&self, node: &NodeRecord, direction: Direction) -> Vec<&EdgeRecord> {
        self.state.edges.edges_of(node, direction, None)
    }

    /// A read facade restricted to a view (or the whole graph for the
    /// main view).
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for a dead view handle.
    pub fn subgraph(&self, view: ViewId) -> Result<Subgraph<'_>> {
        if view.0 != MAIN_VIEW {
            self.state.views.state(view.0)?;
        }
        Ok(Subgraph {
            state: &*self.state,
            view: (view.0 != MAIN_VIEW).then_some(view.0),
        })
    }
}

/// Batch write guard: the mutation surface on a held write ticket.
pub struct GraphWriter<'a> {
    state: WriteTicket<'a, GraphState>,
}

impl GraphWriter<'_> {
    /// See [`GraphStore::add_node`].
    ///
    /// # Errors
    ///
    /// [`Error::IdTypeMismatch`], [`Error::DuplicateNode`].
    pub fn add_node(&mut self, id: impl Into<AttrValue>) -> Result<u32> {
        let id = standardize_id(id.into(), self.state.config.node_id_type)?;
        self.state.add_node(id)
    }

    /// See [`GraphStore::add_edge`].
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`], [`Error::DuplicateEdge`],
    /// [`Error::ParallelEdge`].
    pub fn add_edge(
        &mut self,
        id: impl Into<AttrValue>,
        source: impl Into<AttrValue>,
        target: impl Into<AttrValue>,
        edge_type: impl Into<AttrValue>,
        directed: bool,
    ) -> Result<u32> {
        let state = &mut *self.state;
        let id = standardize_id(id.into(), state.config.edge_id_type)?;
        let source = standardize_id(source.into(), state.config.node_id_type)?;
        let target = standardize_id(target.into(), state.config.node_id_type)?;
        let src = state.resolve_node(&source)?;
        let dst = state.resolve_node(&target)?;
        state.add_edge(id, src, dst, edge_type.into(), directed)
    }

    /// See [`GraphStore::remove_node`].
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn remove_node(&mut self, id: impl Into<AttrValue>) -> Result<()> {
        let state = &mut *self.state;
        let id = standardize_id(id.into(), state.config.node_id_type)?;
        let slot = state.resolve_node(&id)?;
        state.remove_node_slot(slot)?;
        Ok(())
    }

    /// See [`GraphStore::remove_edge`].
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn remove_edge(&mut self, id: impl Into<AttrValue>) -> Result<()> {
        let state = &mut *self.state;
        let id = standardize_id(id.into(), state.config.edge_id_type)?;
        let slot = state.resolve_edge(&id)?;
        state.remove_edge_slot(slot)?;
        Ok(())
    }

    /// See [`GraphStore::clear`].
    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// See [`GraphStore::clear_edges`].
    ///
    /// # Errors
    ///
    /// Lock errors only.
    pub fn clear_edges(&mut self, edge_type: Option<&AttrValue>) -> Result<()> {
        let state = &mut *self.state;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(());
        }
        state.clear_edges(ty);
        Ok(())
    }

    /// See [`GraphStore::clear_node_edges`].
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`].
    pub fn clear_node_edges(
        &mut self,
        node: impl Into<AttrValue>,
        edge_type: Option<&AttrValue>,
    ) -> Result<()> {
        let state = &mut *self.state;
        let id = standardize_id(node.into(), state.config.node_id_type)?;
        let slot = state.resolve_node(&id)?;
        let ty = state.type_filter(edge_type);
        if edge_type.is_some() && ty.is_none() {
            return Ok(());
        }
        state.clear_node_edges(slot, ty);
        Ok(())
    }

    /// See [`GraphStore::set_attribute`].
    ///
    /// # Errors
    ///
    /// As the store-level method.
    pub fn set_attribute(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
    ) -> Result<Option<AttrValue>> {
        self.state.set_attribute(kind, element, column, value)
    }

    /// See [`GraphStore::set_attribute_at`].
    ///
    /// # Errors
    ///
    /// As the store-level method.
    pub fn set_attribute_at(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
        timestamp: f64,
    ) -> Result<Option<AttrValue>> {
        self.state
            .set_attribute_at(kind, element, column, value, timestamp)
    }

    /// See [`GraphStore::set_attribute_on`].
    ///
    /// # Errors
    ///
    /// As the store-level method.
    pub fn set_attribute_on(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column: &str,
        value: AttrValue,
        interval: Interval,
    ) -> Result<Option<AttrValue>> {
        self.state
            .set_attribute_on(kind, element, column, value, interval)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.nodes.len()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.state.edges.len()
    }

    /// A removable cursor over a node's incident edges, most recently
    /// added first.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn edge_chain_cursor(
        &mut self,
        node: &AttrValue,
        direction: Direction,
        edge_type: Option<&AttrValue>,
    ) -> Result<EdgeChainCursor<'_>> {
        let state = &mut *self.state;
        let slot = state.resolve_node(node)?;
        let ty = state.type_filter(edge_type);
        let slots: Vec<u32> = if edge_type.is_some() && ty.is_none() {
            Vec::new()
        } else {
            let record = state.nodes.get(slot).expect("live node");
            state
                .edges
                .edges_of(record, direction, ty)
                .into_iter()
                .map(|edge| edge.store_id)
                .collect()
        };
        Ok(EdgeChainCursor {
            state,
            slots,
            pos: 0,
            current: None,
        })
    }
}

/// Cursor over a node's incident edges with mid-iteration removal.
///
/// `remove_current` is legal after each `next`; interleaving removals
/// with iteration never skips the already-captured remainder.
pub struct EdgeChainCursor<'a> {
    state: &'a mut GraphState,
    slots: Vec<u32>,
    pos: usize,
    current: Option<u32>,
}

impl EdgeChainCursor<'_> {
    /// The next live edge id, or `None` at the end of the chain.
    pub fn next(&mut self) -> Option<AttrValue> {
        while self.pos < self.slots.len() {
            let slot = self.slots[self.pos];
            self.pos += 1;
            if let Some(record) = self.state.edges.get(slot) {
                self.current = Some(slot);
                return Some(record.id.clone());
            }
        }
        self.current = None;
        None
    }

    /// Removes the edge returned by the last `next`.
    ///
    /// # Errors
    ///
    /// [`Error::CursorState`] before the first `next`, after the end, or
    /// on double removal.
    pub fn remove_current(&mut self) -> Result<()> {
        let Some(slot) = self.current.take() else {
            return Err(Error::CursorState(
                "remove_current requires a preceding next",
            ));
        };
        self.state.remove_edge_slot(slot)?;
        Ok(())
    }
}

/// Read facade restricted to a view.
pub struct Subgraph<'a> {
    state: &'a GraphState,
    /// `None` stands for the main view.
    view: Option<u32>,
}

impl Subgraph<'_> {
    fn contains_node_slot(&self, slot: u32) -> bool {
        match self.view {
            None => self.state.nodes.contains_slot(slot),
            Some(view) => self
                .state
                .views
                .state(view)
                .is_ok_and(|v| v.contains_node(slot)),
        }
    }

    fn contains_edge_slot(&self, slot: u32) -> bool {
        match self.view {
            None => self.state.edges.contains_slot(slot),
            Some(view) => self
                .state
                .views
                .state(view)
                .is_ok_and(|v| v.contains_edge(&self.state.edges, slot)),
        }
    }

    /// Number of nodes in the subgraph.
    #[must_use]
    pub fn node_count(&self) -> u64 {
        match self.view {
            None => self.state.nodes.len() as u64,
            Some(view) => self
                .state
                .views
                .state(view)
                .map_or(0, |v| v.node_count()),
        }
    }

    /// Number of edges in the subgraph.
    #[must_use]
    pub fn edge_count(&self) -> u64 {
        match self.view {
            None => self.state.edges.len() as u64,
            Some(view) => self
                .state
                .views
                .state(view)
                .map_or(0, |v| v.edge_count(&self.state.edges)),
        }
    }

    /// Whether the subgraph contains the node.
    #[must_use]
    pub fn contains_node(&self, id: &AttrValue) -> bool {
        self.state
            .resolve_node(id)
            .is_ok_and(|slot| self.contains_node_slot(slot))
    }

    /// Whether the subgraph contains the edge.
    #[must_use]
    pub fn contains_edge(&self, id: &AttrValue) -> bool {
        self.state
            .resolve_edge(id)
            .is_ok_and(|slot| self.contains_edge_slot(slot))
    }

    /// Count of subgraph edges incident to the node.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn degree(&self, id: &AttrValue) -> Result<u32> {
        let slot = self.state.resolve_node(id)?;
        match self.view {
            None => Ok(self.state.nodes.get(slot).expect("live node").degree()),
            Some(view) => Ok(self
                .state
                .views
                .state(view)?
                .degree(&self.state.nodes, &self.state.edges, slot)),
        }
    }

    /// Neighbor ids within the subgraph.
    ///
    /// # Errors
    ///
    /// [`Error::NotOwned`] for an unknown node id.
    pub fn neighbors(&self, id: &AttrValue) -> Result<Vec<AttrValue>> {
        let slot = self.state.resolve_node(id)?;
        let record = self.state.nodes.get(slot).expect("live node");
        let mut result = Vec::new();
        for edge in self.state.edges.edges_of(record, Direction::Both, None) {
            if !self.contains_edge_slot(edge.store_id) {
                continue;
            }
            let other = edge.opposite(slot);
            if self.contains_node_slot(other) {
                result.push(self.state.nodes.get(other).expect("live node").id.clone());
            }
        }
        Ok(result)
    }

    /// Node ids in the subgraph, in slot order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<AttrValue> {
        self.state
            .nodes
            .iter()
            .filter(|record| self.contains_node_slot(record.store_id))
            .map(|record| record.id.clone())
            .collect()
    }

    /// Edge ids in the subgraph, in slot order.
    #[must_use]
    pub fn edge_ids(&self) -> Vec<AttrValue> {
        self.state
            .edges
            .iter()
            .filter(|record| self.contains_edge_slot(record.store_id))
            .map(|record| record.id.clone())
            .collect()
    }
}

// =============================================================================
// State internals
// =============================================================================

impl GraphState {
    fn resolve_node(&self, id: &AttrValue) -> Result<u32> {
        let id = standardize_id(id.clone(), self.config.node_id_type)?;
        self.nodes.resolve(&id).ok_or(Error::NotOwned("node"))
    }

    fn resolve_edge(&self, id: &AttrValue) -> Result<u32> {
        let id = standardize_id(id.clone(), self.config.edge_id_type)?;
        self.edges.resolve(&id).ok_or(Error::NotOwned("edge"))
    }

    fn type_filter(&self, label: Option<&AttrValue>) -> Option<TypeId> {
        label.and_then(|label| self.types.get(label))
    }

    fn edge_between(&self, src: u32, dst: u32, ty: Option<TypeId>) -> Option<u32> {
        match ty {
            Some(ty) => self.edges.find(src, dst, ty),
            None => self
                .types
                .ids()
                .find_map(|ty| self.edges.find(src, dst, ty)),
        }
    }

    fn columns(&self, kind: ElementKind) -> &ColumnTable {
        match kind {
            ElementKind::Node => &self.node_columns,
            ElementKind::Edge => &self.edge_columns,
        }
    }

    fn element_count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Node => self.nodes.len(),
            ElementKind::Edge => self.edges.len(),
        }
    }

    fn all_ids(&self, kind: ElementKind) -> Vec<AttrValue> {
        match kind {
            ElementKind::Node => self.nodes.iter().map(|record| record.id.clone()).collect(),
            ElementKind::Edge => self.edges.iter().map(|record| record.id.clone()).collect(),
        }
    }

    fn ids_for_bits(&self, kind: ElementKind, bits: &RoaringBitmap) -> Vec<AttrValue> {
        match kind {
            ElementKind::Node => bits
                .iter()
                .filter_map(|slot| self.nodes.get(slot))
                .map(|record| record.id.clone())
                .collect(),
            ElementKind::Edge => bits
                .iter()
                .filter_map(|slot| self.edges.get(slot))
                .map(|record| record.id.clone())
                .collect(),
        }
    }

    fn index_of(&self, kind: ElementKind, column: &str) -> Result<(&ColumnIndex, &Column)> {
        let table = self.columns(kind);
        let definition = table
            .get(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        let indices = match kind {
            ElementKind::Node => &self.node_indices,
            ElementKind::Edge => &self.edge_indices,
        };
        let index = indices
            .get(definition.store_id())
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))?;
        Ok((index, definition))
    }

    fn time_index(&self, kind: ElementKind) -> Option<&TimeIndexStore> {
        match kind {
            ElementKind::Node => self.node_time_index.as_ref(),
            ElementKind::Edge => self.edge_time_index.as_ref(),
        }
    }

    fn add_node(&mut self, id: AttrValue) -> Result<u32> {
        let slot = self.nodes.add(id)?;
        self.views.on_node_added(slot);
        if self.config.enable_observers {
            self.observers.record_node_added(slot);
        }
        self.versions.bump_node();
        trace!(slot, "node added");
        Ok(slot)
    }

    fn add_edge(
        &mut self,
        id: AttrValue,
        src: u32,
        dst: u32,
        type_label: AttrValue,
        directed: bool,
    ) -> Result<u32> {
        let ty = self.types.intern(type_label)?;
        let slot = self
            .edges
            .add(&mut self.nodes, &mut self.types, id, src, dst, ty, directed, 1.0)?;
        self.views.on_edge_added(slot, src, dst);
        if self.config.enable_observers {
            self.observers.record_edge_added(slot);
        }
        self.versions.bump_edge();
        trace!(slot, src, dst, "edge added");
        Ok(slot)
    }

    fn remove_edge_slot(&mut self, slot: u32) -> Result<EdgeRecord> {
        self.views.on_edge_removed(slot);
        let record = self.edges.remove(&mut self.nodes, &mut self.types, slot)?;
        self.edge_indices.clear_element(slot, &record.attrs);
        if let Some(index) = self.edge_time_index.as_mut() {
            purge_time_entries(index, slot, &record.attrs);
        }
        if self.config.enable_observers {
            self.observers.record_edge_removed(slot);
        }
        self.versions.bump_edge();
        trace!(slot, "edge removed");
        Ok(record)
    }

    fn remove_node_slot(&mut self, slot: u32) -> Result<NodeRecord> {
        let incident: Vec<u32> = {
            let record = self.nodes.get(slot).ok_or(Error::NotOwned("node"))?;
            self.edges
                .edges_of(record, Direction::Both, None)
                .into_iter()
                .map(|edge| edge.store_id)
                .collect()
        };
        for edge_slot in incident {
            self.remove_edge_slot(edge_slot)?;
        }
        self.views.on_node_removed(slot);
        let record = self.nodes.remove(slot)?;
        self.node_indices.clear_element(slot, &record.attrs);
        if let Some(index) = self.node_time_index.as_mut() {
            purge_time_entries(index, slot, &record.attrs);
        }
        if self.config.enable_observers {
            self.observers.record_node_removed(slot);
        }
        self.versions.bump_node();
        debug!(slot, "node removed");
        Ok(record)
    }

    fn clear_node_edges(&mut self, slot: u32, ty: Option<TypeId>) {
        let incident: Vec<u32> = self
            .nodes
            .get(slot)
            .map(|record| {
                self.edges
                    .edges_of(record, Direction::Both, ty)
                    .into_iter()
                    .map(|edge| edge.store_id)
                    .collect()
            })
            .unwrap_or_default();
        for edge_slot in incident {
            let _ = self.remove_edge_slot(edge_slot);
        }
    }

    fn clear_edges(&mut self, ty: Option<TypeId>) {
        if let Some(ty) = ty {
            let slots: Vec<u32> = self
                .edges
                .iter()
                .filter(|record| record.ty == ty)
                .map(|record| record.store_id)
                .collect();
            for slot in slots {
                let _ = self.remove_edge_slot(slot);
            }
            return;
        }
        let removed: Vec<u32> = self.edges.iter().map(|record| record.store_id).collect();
        for record in self.nodes.iter_mut() {
            record.reset_adjacency();
        }
        self.edges.clear();
        self.types.reset_counts();
        self.edge_indices.rebuild(&self.edge_columns);
        if let Some(index) = self.edge_time_index.as_mut() {
            index.clear();
        }
        self.views.on_edges_cleared();
        if self.config.enable_observers {
            for slot in &removed {
                self.observers.record_edge_removed(*slot);
            }
        }
        self.versions.bump_edge();
        debug!(count = removed.len(), "edges cleared");
    }

    fn clear(&mut self) {
        let removed_edges: Vec<u32> = self.edges.iter().map(|record| record.store_id).collect();
        let removed_nodes: Vec<u32> = self.nodes.iter().map(|record| record.store_id).collect();
        self.edges.clear();
        self.nodes.clear();
        self.types.reset_counts();
        self.node_indices.rebuild(&self.node_columns);
        self.edge_indices.rebuild(&self.edge_columns);
        if let Some(index) = self.node_time_index.as_mut() {
            index.clear();
        }
        if let Some(index) = self.edge_time_index.as_mut() {
            index.clear();
        }
        self.views.on_cleared();
        if self.config.enable_observers {
            for slot in &removed_edges {
                self.observers.record_edge_removed(*slot);
            }
            for slot in &removed_nodes {
                self.observers.record_node_removed(*slot);
            }
        }
        self.versions.bump_edge();
        self.versions.bump_node();
        debug!(
            nodes = removed_nodes.len(),
            edges = removed_edges.len(),
            "graph cleared"
        );
    }

    fn add_column(&mut self, kind: ElementKind, column: Column) -> Result<u32> {
        let (table, indices) = match kind {
            ElementKind::Node => (&mut self.node_columns, &mut self.node_indices),
            ElementKind::Edge => (&mut self.edge_columns, &mut self.edge_indices),
        };
        let slot = table.add(column)?;
        let definition = table.get_by_index(slot).expect("column just added");
        indices.add_column(slot, definition);
        debug!(slot, kind = ?kind, "column added");
        Ok(slot)
    }

    fn remove_column(&mut self, kind: ElementKind, id: &str) -> Result<()> {
        let (table, indices) = match kind {
            ElementKind::Node => (&mut self.node_columns, &mut self.node_indices),
            ElementKind::Edge => (&mut self.edge_columns, &mut self.edge_indices),
        };
        let column = table.remove(id)?;
        let slot = column.store_id();
        indices.remove_column(slot);
        // Drop the stored values; the time index loses the column's keys.
        let dynamic = column.is_dynamic();
        match kind {
            ElementKind::Node => {
                for record in self.nodes.iter_mut() {
                    if let Some(value) = record.attrs.get_mut(slot as usize).and_then(Option::take)
                    {
                        if dynamic {
                            if let Some(index) = self.node_time_index.as_mut() {
                                remove_time_entries(index, record.store_id, &value);
                            }
                        }
                    }
                }
            }
            ElementKind::Edge => {
                for record in self.edges.iter_mut() {
                    if let Some(value) = record.attrs.get_mut(slot as usize).and_then(Option::take)
                    {
                        if dynamic {
                            if let Some(index) = self.edge_time_index.as_mut() {
                                remove_time_entries(index, record.store_id, &value);
                            }
                        }
                    }
                }
            }
        }
        if self.weight_column_slot == Some(slot) {
            self.weight_column_slot = None;
        }
        debug!(slot, kind = ?kind, "column removed");
        Ok(())
    }

    fn set_attribute(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column_id: &str,
        value: AttrValue,
    ) -> Result<Option<AttrValue>> {
        let elem_slot = match kind {
            ElementKind::Node => self.resolve_node(element)?,
            ElementKind::Edge => self.resolve_edge(element)?,
        };
        let column = self
            .columns(kind)
            .get(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?
            .clone();
        if column.is_read_only() {
            return Err(Error::ReadOnlyColumn(column.id().to_string()));
        }
        if value.attr_type() != *column.ty() {
            return Err(Error::TypeMismatch {
                column: column.id().to_string(),
                expected: column.ty().to_string(),
                actual: value.attr_type().to_string(),
            });
        }

        // The static weight column stores through the edge record.
        if kind == ElementKind::Edge
            && self.weight_column_slot == Some(column.store_id())
            && self.config.edge_weight_kind == WeightKind::Static
        {
            let record = self.edges.get_mut(elem_slot).expect("live edge");
            let old = record.weight;
            record.weight = value.as_f64().unwrap_or(old);
            return Ok(Some(AttrValue::F64(old)));
        }

        let col_slot = column.store_id();
        let attrs = match kind {
            ElementKind::Node => &mut self.nodes.get_mut(elem_slot).expect("live node").attrs,
            ElementKind::Edge => &mut self.edges.get_mut(elem_slot).expect("live edge").attrs,
        };
        let index = col_slot as usize;
        if attrs.len() <= index {
            attrs.resize(index + 1, None);
        }
        let old = attrs[index].replace(value);
        let new_ref = attrs[index].clone();

        let indices = match kind {
            ElementKind::Node => &mut self.node_indices,
            ElementKind::Edge => &mut self.edge_indices,
        };
        if let Some(column_index) = indices.get_mut(col_slot) {
            column_index.replace(old.as_ref(), new_ref.as_ref(), elem_slot);
        }
        if column.is_dynamic() {
            let time_index = match kind {
                ElementKind::Node => self.node_time_index.as_mut(),
                ElementKind::Edge => self.edge_time_index.as_mut(),
            };
            if let Some(time_index) = time_index {
                if let Some(old) = &old {
                    remove_time_entries(time_index, elem_slot, old);
                }
                if let Some(new) = &new_ref {
                    add_time_entries(time_index, elem_slot, new);
                }
            }
        }
        trace!(column = column.id(), elem_slot, "attribute set");
        Ok(old)
    }

    fn set_attribute_at(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column_id: &str,
        value: AttrValue,
        timestamp: f64,
    ) -> Result<Option<AttrValue>> {
        let point = TimePoint::new(timestamp)?;
        let elem_slot = match kind {
            ElementKind::Node => self.resolve_node(element)?,
            ElementKind::Edge => self.resolve_edge(element)?,
        };
        let column = self
            .columns(kind)
            .get(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?
            .clone();
        if column.is_read_only() {
            return Err(Error::ReadOnlyColumn(column.id().to_string()));
        }
        let AttrType::TimestampMap(inner) = column.ty() else {
            return Err(Error::TypeMismatch {
                column: column.id().to_string(),
                expected: "timestamp map".to_string(),
                actual: column.ty().to_string(),
            });
        };
        let inner = inner.as_ref().clone();
        let attrs = match kind {
            ElementKind::Node => &mut self.nodes.get_mut(elem_slot).expect("live node").attrs,
            ElementKind::Edge => &mut self.edges.get_mut(elem_slot).expect("live edge").attrs,
        };
        let index = column.store_id() as usize;
        if attrs.len() <= index {
            attrs.resize(index + 1, None);
        }
        if attrs[index].is_none() {
            attrs[index] = Some(AttrValue::Timestamps(
                crate::attr::time::TimestampMap::new(inner)?,
            ));
        }
        let Some(AttrValue::Timestamps(map)) = attrs[index].as_mut() else {
            return Err(Error::TypeMismatch {
                column: column.id().to_string(),
                expected: "timestamp map".to_string(),
                actual: "other".to_string(),
            });
        };
        let old = map.put(timestamp, value)?;
        if old.is_none() {
            let time_index = match kind {
                ElementKind::Node => self.node_time_index.as_mut(),
                ElementKind::Edge => self.edge_time_index.as_mut(),
            };
            if let Some(time_index) = time_index {
                time_index.add_timestamp(point, elem_slot);
            }
        }
        Ok(old)
    }

    fn set_attribute_on(
        &mut self,
        kind: ElementKind,
        element: &AttrValue,
        column_id: &str,
        value: AttrValue,
        interval: Interval,
    ) -> Result<Option<AttrValue>> {
        let elem_slot = match kind {
            ElementKind::Node => self.resolve_node(element)?,
            ElementKind::Edge => self.resolve_edge(element)?,
        };
        let column = self
            .columns(kind)
            .get(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?
            .clone();
        if column.is_read_only() {
            return Err(Error::ReadOnlyColumn(column.id().to_string()));
        }
        let AttrType::IntervalMap(inner) = column.ty() else {
            return Err(Error::TypeMismatch {
                column: column.id().to_string(),
                expected: "interval map".to_string(),
                actual: column.ty().to_string(),
            });
        };
        let inner = inner.as_ref().clone();
        let attrs = match kind {
            ElementKind::Node => &mut self.nodes.get_mut(elem_slot).expect("live node").attrs,
            ElementKind::Edge => &mut self.edges.get_mut(elem_slot).expect("live edge").attrs,
        };
        let index = column.store_id() as usize;
        if attrs.len() <= index {
            attrs.resize(index + 1, None);
        }
        if attrs[index].is_none() {
            attrs[index] = Some(AttrValue::Intervals(crate::attr::time::IntervalMap::new(
                inner,
            )?));
        }
        let Some(AttrValue::Intervals(map)) = attrs[index].as_mut() else {
            return Err(Error::TypeMismatch {
                column: column.id().to_string(),
                expected: "interval map".to_string(),
                actual: "other".to_string(),
            });
        };
        let old = map.put(interval, value)?;
        if old.is_none() {
            let time_index = match kind {
                ElementKind::Node => self.node_time_index.as_mut(),
                ElementKind::Edge => self.edge_time_index.as_mut(),
            };
            if let Some(time_index) = time_index {
                time_index.add_interval(interval, elem_slot);
            }
        }
        Ok(old)
    }

    fn attribute(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column_id: &str,
    ) -> Result<Option<AttrValue>> {
        let elem_slot = match kind {
            ElementKind::Node => self.resolve_node(element)?,
            ElementKind::Edge => self.resolve_edge(element)?,
        };
        let column = self
            .columns(kind)
            .get(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;
        if kind == ElementKind::Edge
            && self.weight_column_slot == Some(column.store_id())
            && self.config.edge_weight_kind == WeightKind::Static
        {
            let record = self.edges.get(elem_slot).expect("live edge");
            return Ok(Some(AttrValue::F64(record.weight)));
        }
        let attrs = match kind {
            ElementKind::Node => &self.nodes.get(elem_slot).expect("live node").attrs,
            ElementKind::Edge => &self.edges.get(elem_slot).expect("live edge").attrs,
        };
        let stored = attrs
            .get(column.store_id() as usize)
            .and_then(Option::as_ref);
        Ok(stored.or(column.default_value()).cloned())
    }

    fn attribute_at(
        &self,
        kind: ElementKind,
        element: &AttrValue,
        column_id: &str,
        timestamp: f64,
    ) -> Result<Option<AttrValue>> {
        let column = self
            .columns(kind)
            .get(column_id)
            .ok_or_else(|| Error::ColumnNotFound(column_id.to_string()))?;
        if !column.ty().is_dynamic() {
            return Err(Error::TypeMismatch {
                column: column_id.to_string(),
                expected: "dynamic column".to_string(),
                actual: column.ty().to_string(),
            });
        }
        // A dynamic column with no recorded values answers None.
        match self.attribute(kind, element, column_id)? {
            Some(AttrValue::Timestamps(map)) => Ok(map.get(timestamp).cloned()),
            Some(AttrValue::Intervals(map)) => Ok(map.values_at(timestamp).next().cloned()),
            _ => Ok(None),
        }
    }
}

fn remove_time_entries(index: &mut TimeIndexStore, elem: u32, value: &AttrValue) {
    match value {
        AttrValue::Timestamps(map) => {
            for t in map.timestamps() {
                if let Ok(point) = TimePoint::new(t) {
                    index.remove_timestamp(point, elem);
                }
            }
        }
        AttrValue::Intervals(map) => {
            for interval in map.intervals() {
                index.remove_interval(interval, elem);
            }
        }
        _ => {}
    }
}

fn add_time_entries(index: &mut TimeIndexStore, elem: u32, value: &AttrValue) {
    match value {
        AttrValue::Timestamps(map) => {
            for t in map.timestamps() {
                if let Ok(point) = TimePoint::new(t) {
                    index.add_timestamp(point, elem);
                }
            }
        }
        AttrValue::Intervals(map) => {
            for interval in map.intervals() {
                index.add_interval(*interval, elem);
            }
        }
        _ => {}
    }
}

fn purge_time_entries(index: &mut TimeIndexStore, elem: u32, attrs: &[Option<AttrValue>]) {
    for value in attrs.iter().flatten() {
        remove_time_entries(index, elem, value);
    }
}
