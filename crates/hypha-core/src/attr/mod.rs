//! Columnar attributes: types, columns, indices, and time-indexed values.
//!
//! This module provides the attribute side of the graph engine:
//!
//! - **Type catalog**: the closed set of attribute types and values
//! - **Columns**: ordered typed columns per element kind
//! - **Indices**: per-column secondary indices with min/max for numerics
//! - **Time**: timestamp- and interval-indexed values with range search

pub mod column;
pub mod index;
pub mod time;
pub mod value;

#[cfg(test)]
mod column_tests;

pub use column::{Column, ColumnOrigin, ColumnTable};
pub use index::{ColumnIndex, IndexStore, OrderedFloat, SortKey};
pub use time::{
    format_interval_with_value, parse_interval_text, Interval, IntervalMap, TimePoint,
    TimestampMap,
};
pub use value::{standardize_id, ArrayValue, AttrType, AttrValue, ValueKey};
