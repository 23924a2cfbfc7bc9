//! Edge type interning.
//!
//! Maps user-chosen type labels (any hashable attribute value) to dense
//! small integer ids. Ids freed by type removal are recycled through a
//! min-heap, so the next interned type takes the smallest free id.
//! Per-type and directed/undirected edge counts live here too.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::attr::value::{AttrValue, ValueKey};
use crate::error::{Error, Result};

/// Dense id of an interned edge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct TypeId(u16);

impl TypeId {
    /// Returns the raw id value.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Creates a TypeId from a raw value.
    #[must_use]
    pub fn from_u16(id: u16) -> Self {
        Self(id)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interning table for edge types.
#[derive(Debug, Default)]
pub(crate) struct EdgeTypeTable {
    labels: Vec<Option<ValueKey>>,
    by_label: FxHashMap<ValueKey, u16>,
    free: BinaryHeap<Reverse<u16>>,
    counts: Vec<u64>,
    directed_count: u64,
    undirected_count: u64,
}

impl EdgeTypeTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Interns a label, returning the existing id when already present.
    pub(crate) fn intern(&mut self, label: AttrValue) -> Result<TypeId> {
        let key = ValueKey::new(label)?;
        if let Some(&id) = self.by_label.get(&key) {
            return Ok(TypeId(id));
        }
        let id = match self.free.pop() {
            Some(Reverse(id)) => id,
            None => {
                let next = self.labels.len();
                u16::try_from(next).map_err(|_| {
                    Error::UnsupportedType("edge type id space exhausted".to_string())
                })?
            }
        };
        let index = id as usize;
        if self.labels.len() <= index {
            self.labels.resize_with(index + 1, || None);
            self.counts.resize(index + 1, 0);
        }
        self.labels[index] = Some(key.clone());
        self.counts[index] = 0;
        self.by_label.insert(key, id);
        Ok(TypeId(id))
    }

    /// Looks up a label without interning.
    pub(crate) fn get(&self, label: &AttrValue) -> Option<TypeId> {
        let key = ValueKey::new(label.clone()).ok()?;
        self.by_label.get(&key).map(|&id| TypeId(id))
    }

    /// Resolves an id back to its label.
    pub(crate) fn label(&self, ty: TypeId) -> Option<&AttrValue> {
        self.labels
            .get(ty.index())?
            .as_ref()
            .map(ValueKey::value)
    }

    /// Removes an unused type, recycling its id.
    pub(crate) fn remove(&mut self, label: &AttrValue) -> Result<TypeId> {
        let key = ValueKey::new(label.clone())?;
        let Some(&id) = self.by_label.get(&key) else {
            return Err(Error::NotOwned("edge type"));
        };
        if self.counts[id as usize] > 0 {
            return Err(Error::TypeInUse);
        }
        self.by_label.remove(&key);
        self.labels[id as usize] = None;
        self.free.push(Reverse(id));
        Ok(TypeId(id))
    }

    /// Edges of the given type.
    pub(crate) fn count(&self, ty: TypeId) -> u64 {
        self.counts.get(ty.index()).copied().unwrap_or(0)
    }

    pub(crate) fn inc(&mut self, ty: TypeId, directed: bool) {
        self.counts[ty.index()] += 1;
        if directed {
            self.directed_count += 1;
        } else {
            self.undirected_count += 1;
        }
    }

    pub(crate) fn dec(&mut self, ty: TypeId, directed: bool) {
        debug_assert!(self.counts[ty.index()] > 0, "type count underflow");
        self.counts[ty.index()] -= 1;
        if directed {
            self.directed_count -= 1;
        } else {
            self.undirected_count -= 1;
        }
    }

    /// Number of live types.
    pub(crate) fn len(&self) -> usize {
        self.by_label.len()
    }

    /// Live type ids in ascending order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()?;
                #[allow(clippy::cast_possible_truncation)]
                Some(TypeId(i as u16))
            })
    }

    pub(crate) fn directed_count(&self) -> u64 {
        self.directed_count
    }

    pub(crate) fn undirected_count(&self) -> u64 {
        self.undirected_count
    }

    pub(crate) fn is_directed_graph(&self) -> bool {
        self.undirected_count == 0
    }

    pub(crate) fn is_undirected_graph(&self) -> bool {
        self.directed_count == 0
    }

    pub(crate) fn is_mixed_graph(&self) -> bool {
        self.directed_count > 0 && self.undirected_count > 0
    }

    /// Zeroes every count. Used by wholesale edge clearing.
    pub(crate) fn reset_counts(&mut self) {
        for count in &mut self.counts {
            *count = 0;
        }
        self.directed_count = 0;
        self.undirected_count = 0;
    }
}
