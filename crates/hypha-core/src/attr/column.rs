//! Columnar attribute definitions.
//!
//! Each element kind (nodes, edges) owns a [`ColumnTable`]: an ordered
//! collection of typed columns with dense integer slots. Slots freed by
//! column removal are never reused, so a stale column handle can never
//! alias a newer column.

use rustc_hash::FxHashMap;

use crate::attr::value::{AttrType, AttrValue};
use crate::error::{Error, Result};

/// Where a column came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnOrigin {
    /// User data column.
    #[default]
    Data,
    /// Column owned by the store itself (e.g. the edge weight column).
    Property,
}

/// A typed attribute column.
#[derive(Debug, Clone)]
pub struct Column {
    id: String,
    title: String,
    ty: AttrType,
    origin: ColumnOrigin,
    default: Option<AttrValue>,
    indexed: bool,
    read_only: bool,
    store_id: u32,
}

impl Column {
    /// Creates a column definition. The id is lowercased; the title
    /// defaults to the original id text.
    pub fn new(id: &str, ty: AttrType) -> Self {
        Self {
            id: id.to_lowercase(),
            title: id.to_string(),
            ty,
            origin: ColumnOrigin::default(),
            default: None,
            indexed: false,
            read_only: false,
            store_id: u32::MAX,
        }
    }

    /// Sets the display title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Sets the origin tag (builder pattern).
    #[must_use]
    pub fn with_origin(mut self, origin: ColumnOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the default value (builder pattern).
    #[must_use]
    pub fn with_default(mut self, default: AttrValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the column as indexed (builder pattern).
    #[must_use]
    pub fn with_index(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Marks the column as read-only (builder pattern).
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The lowercased column id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The static column type.
    #[must_use]
    pub fn ty(&self) -> &AttrType {
        &self.ty
    }

    /// The origin tag.
    #[must_use]
    pub fn origin(&self) -> ColumnOrigin {
        self.origin
    }

    /// The default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&AttrValue> {
        self.default.as_ref()
    }

    /// Whether a secondary index is maintained.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    /// Whether writes are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether values are time-indexed.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.ty.is_dynamic()
    }

    /// The dense slot of this column in its table.
    #[must_use]
    pub fn store_id(&self) -> u32 {
        self.store_id
    }
}

/// Ordered table of columns for one element kind.
#[derive(Debug, Default)]
pub struct ColumnTable {
    columns: Vec<Option<Column>>,
    by_id: FxHashMap<String, u32>,
}

impl ColumnTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, assigning the next slot. Removed slots are not
    /// reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NullArgument`] for an empty id,
    /// [`Error::DuplicateColumn`] for an id already in the table, and
    /// [`Error::TypeMismatch`] when the default value disagrees with the
    /// column type.
    pub fn add(&mut self, mut column: Column) -> Result<u32> {
        if column.id.is_empty() {
            return Err(Error::NullArgument("column id"));
        }
        if let Some(default) = &column.default {
            if default.attr_type() != column.ty {
                return Err(Error::TypeMismatch {
                    column: column.id.clone(),
                    expected: column.ty.to_string(),
                    actual: default.attr_type().to_string(),
                });
            }
        }
        if self.by_id.contains_key(&column.id) {
            return Err(Error::DuplicateColumn(column.id.clone()));
        }
        let slot = u32::try_from(self.columns.len()).expect("column slot overflow");
        column.store_id = slot;
        self.by_id.insert(column.id.clone(), slot);
        self.columns.push(Some(column));
        Ok(slot)
    }

    /// Removes a column by id, returning its definition. The slot is
    /// retired permanently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] for an unknown id.
    pub fn remove(&mut self, id: &str) -> Result<Column> {
        let key = id.to_lowercase();
        let slot = self
            .by_id
            .remove(&key)
            .ok_or_else(|| Error::ColumnNotFound(key.clone()))?;
        let column = self.columns[slot as usize]
            .take()
            .expect("by_id pointed at an empty column slot");
        Ok(column)
    }

    /// Looks up a column by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Column> {
        let slot = *self.by_id.get(&id.to_lowercase())?;
        self.columns[slot as usize].as_ref()
    }

    /// Looks up a column by slot.
    #[must_use]
    pub fn get_by_index(&self, slot: u32) -> Option<&Column> {
        self.columns.get(slot as usize)?.as_ref()
    }

    /// Number of live columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true when no live column exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Total slots ever allocated, including retired ones.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.columns.len()
    }

    /// Live columns in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter_map(Option::as_ref)
    }
}
