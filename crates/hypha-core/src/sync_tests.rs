//! Tests for the reentrant graph lock and version counters.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::sync::{GraphLock, VersionCounters};

#[test]
fn test_read_tickets_nest_on_one_thread() {
    let lock = GraphLock::new(5_u32);

    let a = lock.read().unwrap();
    let b = lock.read().unwrap();
    assert_eq!(*a, 5);
    assert_eq!(*b, 5);
    assert_eq!(lock.read_depth(), 2);

    drop(b);
    assert_eq!(lock.read_depth(), 1);
    drop(a);
    assert_eq!(lock.read_depth(), 0);
}

#[test]
fn test_write_ticket_gives_mutable_access() {
    let lock = GraphLock::new(vec![1, 2, 3]);

    {
        let mut w = lock.write().unwrap();
        w.push(4);
    }

    let r = lock.read().unwrap();
    assert_eq!(*r, vec![1, 2, 3, 4]);
}

#[test]
fn test_upgrade_from_read_fails_fast() {
    let lock = GraphLock::new(0_u32);

    let _r = lock.read().unwrap();
    let err = lock.write().unwrap_err();
    assert!(err.is_programming_error());
    assert_eq!(err.code(), "HYPHA-010");
}

#[test]
fn test_reentrant_write_fails_fast() {
    let lock = GraphLock::new(0_u32);

    let _w = lock.write().unwrap();
    assert!(lock.write().is_err());
}

#[test]
fn test_read_while_writing_fails_fast() {
    let lock = GraphLock::new(0_u32);

    let _w = lock.write().unwrap();
    assert!(lock.read().is_err());
}

#[test]
fn test_write_lock_is_usable_after_read_release() {
    let lock = GraphLock::new(0_u32);

    {
        let _r = lock.read().unwrap();
    }
    let mut w = lock.write().unwrap();
    *w = 7;
    drop(w);

    assert_eq!(*lock.read().unwrap(), 7);
}

#[test]
fn test_cross_thread_write_exclusion() {
    let lock = Arc::new(GraphLock::new(0_u64));
    let mut handles = Vec::new();

    for _ in 0..4 {
        let lock = Arc::clone(&lock);
        handles.push(thread::spawn(move || {
            for _ in 0..1000 {
                let mut w = lock.write().unwrap();
                *w += 1;
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*lock.read().unwrap(), 4000);
}

#[test]
fn test_reader_sees_consistent_state_during_writes() {
    let lock = Arc::new(GraphLock::new((0_u64, 0_u64)));
    let writer = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || {
            for i in 1..=500 {
                let mut w = lock.write().unwrap();
                w.0 = i;
                w.1 = i;
            }
        })
    };

    for _ in 0..500 {
        let r = lock.read().unwrap();
        assert_eq!(r.0, r.1, "reader observed a torn write");
        drop(r);
        thread::sleep(Duration::from_micros(10));
    }
    writer.join().unwrap();
}

#[test]
fn test_version_counters_are_monotone() {
    let versions = VersionCounters::default();
    assert_eq!(versions.node(), 0);
    assert_eq!(versions.edge(), 0);

    let mut last = 0;
    for _ in 0..10 {
        let next = versions.bump_node();
        assert!(next > last);
        last = next;
    }
    assert_eq!(versions.node(), 10);
    assert_eq!(versions.edge(), 0);

    versions.bump_edge();
    assert_eq!(versions.edge(), 1);
}

#[test]
fn test_independent_locks_do_not_share_holds() {
    let a = GraphLock::new(1_u8);
    let b = GraphLock::new(2_u8);

    let _ra = a.read().unwrap();
    // Holding a read on `a` must not poison writes on `b`.
    let mut wb = b.write().unwrap();
    *wb = 3;
}
