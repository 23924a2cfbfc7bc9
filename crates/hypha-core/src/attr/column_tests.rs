//! Tests for the column table.

use super::column::*;
use super::value::{AttrType, AttrValue};
use crate::error::Error;

#[test]
fn test_add_column_assigns_dense_slots() {
    let mut table = ColumnTable::new();

    let a = table.add(Column::new("age", AttrType::I32)).unwrap();
    let b = table.add(Column::new("name", AttrType::Str)).unwrap();

    assert_eq!(a, 0);
    assert_eq!(b, 1);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("age").unwrap().store_id(), 0);
}

#[test]
fn test_column_id_is_case_insensitive() {
    let mut table = ColumnTable::new();
    table.add(Column::new("Weight", AttrType::F64)).unwrap();

    assert!(table.get("weight").is_some());
    assert!(table.get("WEIGHT").is_some());
    assert_eq!(table.get("weight").unwrap().title(), "Weight");
}

#[test]
fn test_duplicate_column_rejected() {
    let mut table = ColumnTable::new();
    table.add(Column::new("age", AttrType::I32)).unwrap();

    let err = table.add(Column::new("AGE", AttrType::I64)).unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn(_)));
    assert_eq!(table.len(), 1);
}

#[test]
fn test_empty_id_rejected() {
    let mut table = ColumnTable::new();
    assert!(matches!(
        table.add(Column::new("", AttrType::I32)),
        Err(Error::NullArgument(_))
    ));
}

#[test]
fn test_default_value_must_match_type() {
    let mut table = ColumnTable::new();
    let column = Column::new("age", AttrType::I32).with_default(AttrValue::from("x"));

    assert!(matches!(table.add(column), Err(Error::TypeMismatch { .. })));
}

#[test]
fn test_removed_slots_are_not_reused() {
    let mut table = ColumnTable::new();
    table.add(Column::new("a", AttrType::I32)).unwrap();
    table.add(Column::new("b", AttrType::I32)).unwrap();

    let removed = table.remove("a").unwrap();
    assert_eq!(removed.store_id(), 0);
    assert!(table.get("a").is_none());
    assert!(table.get_by_index(0).is_none());

    // The freed slot stays retired; the next column gets a fresh slot.
    let c = table.add(Column::new("c", AttrType::I32)).unwrap();
    assert_eq!(c, 2);
    assert_eq!(table.slot_count(), 3);
}

#[test]
fn test_remove_unknown_column() {
    let mut table = ColumnTable::new();
    assert!(matches!(
        table.remove("nope"),
        Err(Error::ColumnNotFound(_))
    ));
}

#[test]
fn test_iteration_is_in_slot_order() {
    let mut table = ColumnTable::new();
    table.add(Column::new("a", AttrType::I32)).unwrap();
    table.add(Column::new("b", AttrType::I32)).unwrap();
    table.add(Column::new("c", AttrType::I32)).unwrap();
    table.remove("b").unwrap();

    let ids: Vec<_> = table.iter().map(Column::id).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn test_builder_flags() {
    let column = Column::new("score", AttrType::F64)
        .with_title("Score")
        .with_origin(ColumnOrigin::Property)
        .with_default(AttrValue::F64(0.0))
        .with_index()
        .read_only();

    assert_eq!(column.title(), "Score");
    assert_eq!(column.origin(), ColumnOrigin::Property);
    assert_eq!(column.default_value(), Some(&AttrValue::F64(0.0)));
    assert!(column.is_indexed());
    assert!(column.is_read_only());
    assert!(!column.is_dynamic());
}

#[test]
fn test_dynamic_column_flag() {
    let column = Column::new(
        "presence",
        AttrType::TimestampMap(Box::new(AttrType::Bool)),
    );
    assert!(column.is_dynamic());
}
