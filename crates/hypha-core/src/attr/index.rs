//! Per-column secondary indices.
//!
//! Every indexed column owns a value -> element-bitmap index. Numeric
//! columns use an ordered map and answer min/max and range queries in
//! O(log n); the other indexable types use an unsorted equality index.
//! Non-indexed and dynamic columns carry the no-op variant, whose reads
//! stand for the whole element set.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

use crate::attr::column::Column;
use crate::attr::value::{AttrType, AttrValue, ValueKey};

/// Wrapper for f64 that implements Ord (total order over bit patterns).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedFloat(pub f64);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Comparable key for sorted numeric indices.
///
/// Integer widths widen to i64; the two float widths widen to f64. A
/// column is homogeneous, so cross-variant comparison only happens if a
/// caller mixes columns, and then falls back to numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Widened integer.
    Int(i64),
    /// Widened float.
    Float(OrderedFloat),
}

impl SortKey {
    /// Converts a numeric attribute value, if it is one.
    #[must_use]
    pub fn from_value(value: &AttrValue) -> Option<Self> {
        if let Some(i) = value.as_i64() {
            return Some(Self::Int(i));
        }
        value.as_f64().map(|f| Self::Float(OrderedFloat(f)))
    }

    /// Narrows the key back to a value of the column's type.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    fn to_value(self, ty: &AttrType) -> AttrValue {
        match (self, ty) {
            (Self::Int(i), AttrType::I8) => AttrValue::I8(i as i8),
            (Self::Int(i), AttrType::I16) => AttrValue::I16(i as i16),
            (Self::Int(i), AttrType::I32) => AttrValue::I32(i as i32),
            (Self::Int(i), _) => AttrValue::I64(i),
            (Self::Float(f), AttrType::F32) => AttrValue::F32(f.0 as f32),
            (Self::Float(f), _) => AttrValue::F64(f.0),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(a), Self::Float(b)) => OrderedFloat(*a as f64).cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Self::Float(a), Self::Int(b)) => a.cmp(&OrderedFloat(*b as f64)),
        }
    }
}

/// Secondary index for one column.
///
/// A tagged variant selected by column type; dispatch is a match, not a
/// virtual call.
#[derive(Debug)]
pub enum ColumnIndex {
    /// Column is not indexed; reads stand for the entire element set.
    Noop,
    /// Unsorted equality index.
    Hash {
        /// value -> elements with that value.
        map: FxHashMap<ValueKey, RoaringBitmap>,
        /// Total indexed entries.
        elements: u64,
    },
    /// Sorted numeric index with min/max support.
    Sorted {
        /// The column's numeric type, for key narrowing.
        ty: AttrType,
        /// key -> elements with that value.
        map: BTreeMap<SortKey, RoaringBitmap>,
        /// Total indexed entries.
        elements: u64,
    },
}

impl ColumnIndex {
    /// Picks the index variant for a column definition.
    #[must_use]
    pub fn for_column(column: &Column) -> Self {
        if !column.is_indexed() || column.is_dynamic() {
            return Self::Noop;
        }
        if column.ty().is_sortable() {
            return Self::Sorted {
                ty: column.ty().clone(),
                map: BTreeMap::new(),
                elements: 0,
            };
        }
        Self::Hash {
            map: FxHashMap::default(),
            elements: 0,
        }
    }

    /// Returns true when min/max queries are supported.
    #[must_use]
    pub fn is_sortable(&self) -> bool {
        matches!(self, Self::Sorted { .. })
    }

    /// Registers an element under a value.
    pub fn put(&mut self, value: &AttrValue, elem: u32) {
        match self {
            Self::Noop => {}
            Self::Hash { map, elements } => {
                let Ok(key) = ValueKey::new(value.clone()) else {
                    return;
                };
                if map.entry(key).or_default().insert(elem) {
                    *elements += 1;
                }
            }
            Self::Sorted { map, elements, .. } => {
                let Some(key) = SortKey::from_value(value) else {
                    return;
                };
                if map.entry(key).or_default().insert(elem) {
                    *elements += 1;
                }
            }
        }
    }

    /// Unregisters an element from a value, pruning empty postings.
    pub fn remove(&mut self, value: &AttrValue, elem: u32) {
        match self {
            Self::Noop => {}
            Self::Hash { map, elements } => {
                let Ok(key) = ValueKey::new(value.clone()) else {
                    return;
                };
                if let Some(bitmap) = map.get_mut(&key) {
                    if bitmap.remove(elem) {
                        *elements -= 1;
                    }
                    if bitmap.is_empty() {
                        map.remove(&key);
                    }
                }
            }
            Self::Sorted { map, elements, .. } => {
                let Some(key) = SortKey::from_value(value) else {
                    return;
                };
                if let Some(bitmap) = map.get_mut(&key) {
                    if bitmap.remove(elem) {
                        *elements -= 1;
                    }
                    if bitmap.is_empty() {
                        map.remove(&key);
                    }
                }
            }
        }
    }

    /// Moves an element from one value to another.
    pub fn replace(&mut self, old: Option<&AttrValue>, new: Option<&AttrValue>, elem: u32) {
        if let Some(old) = old {
            self.remove(old, elem);
        }
        if let Some(new) = new {
            self.put(new, elem);
        }
    }

    /// Elements carrying the value. `None` for the no-op variant (reads
    /// stand for the whole element set) and for unseen values.
    #[must_use]
    pub fn get(&self, value: &AttrValue) -> Option<&RoaringBitmap> {
        match self {
            Self::Noop => None,
            Self::Hash { map, .. } => {
                let key = ValueKey::new(value.clone()).ok()?;
                map.get(&key)
            }
            Self::Sorted { map, .. } => {
                let key = SortKey::from_value(value)?;
                map.get(&key)
            }
        }
    }

    /// Number of elements carrying the value.
    #[must_use]
    pub fn count(&self, value: &AttrValue) -> u64 {
        self.get(value).map_or(0, RoaringBitmap::len)
    }

    /// Distinct indexed values, in key order for the sorted variant.
    #[must_use]
    pub fn values(&self) -> Vec<AttrValue> {
        match self {
            Self::Noop => Vec::new(),
            Self::Hash { map, .. } => map.keys().map(|key| key.value().clone()).collect(),
            Self::Sorted { ty, map, .. } => map.keys().map(|key| key.to_value(ty)).collect(),
        }
    }

    /// Number of distinct indexed values.
    #[must_use]
    pub fn count_values(&self) -> usize {
        match self {
            Self::Noop => 0,
            Self::Hash { map, .. } => map.len(),
            Self::Sorted { map, .. } => map.len(),
        }
    }

    /// Number of indexed (element, value) entries.
    #[must_use]
    pub fn count_elements(&self) -> u64 {
        match self {
            Self::Noop => 0,
            Self::Hash { elements, .. } | Self::Sorted { elements, .. } => *elements,
        }
    }

    /// Smallest indexed value, for sorted indices.
    #[must_use]
    pub fn min_value(&self) -> Option<AttrValue> {
        match self {
            Self::Sorted { ty, map, .. } => {
                map.keys().next().map(|key| key.to_value(ty))
            }
            _ => None,
        }
    }

    /// Largest indexed value, for sorted indices.
    #[must_use]
    pub fn max_value(&self) -> Option<AttrValue> {
        match self {
            Self::Sorted { ty, map, .. } => {
                map.keys().next_back().map(|key| key.to_value(ty))
            }
            _ => None,
        }
    }
}

/// Indices for one element kind, aligned to column slots.
#[derive(Debug, Default)]
pub struct IndexStore {
    indices: Vec<Option<ColumnIndex>>,
}

impl IndexStore {
    /// Creates an empty index store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the index for a freshly added column.
    pub fn add_column(&mut self, slot: u32, column: &Column) {
        let slot = slot as usize;
        if self.indices.len() <= slot {
            self.indices.resize_with(slot + 1, || None);
        }
        self.indices[slot] = Some(ColumnIndex::for_column(column));
    }

    /// Drops the index of a removed column. The slot stays retired.
    pub fn remove_column(&mut self, slot: u32) {
        if let Some(entry) = self.indices.get_mut(slot as usize) {
            *entry = None;
        }
    }

    /// The index for a column slot, if the column is live.
    #[must_use]
    pub fn get(&self, slot: u32) -> Option<&ColumnIndex> {
        self.indices.get(slot as usize)?.as_ref()
    }

    /// Mutable access for the attribute setter.
    pub(crate) fn get_mut(&mut self, slot: u32) -> Option<&mut ColumnIndex> {
        self.indices.get_mut(slot as usize)?.as_mut()
    }

    /// Recreates every live column's index empty. Retired slots stay
    /// retired.
    pub(crate) fn rebuild(&mut self, columns: &crate::attr::column::ColumnTable) {
        self.indices.clear();
        for column in columns.iter() {
            self.add_column(column.store_id(), column);
        }
    }

    /// Unregisters every set value of a removed element.
    ///
    /// `attrs` is the element's attribute array, aligned to column slots.
    pub(crate) fn clear_element(&mut self, elem: u32, attrs: &[Option<AttrValue>]) {
        for (slot, value) in attrs.iter().enumerate() {
            if let (Some(value), Some(Some(index))) = (value, self.indices.get_mut(slot)) {
                index.remove(value, elem);
            }
        }
    }
}
