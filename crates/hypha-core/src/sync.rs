//! Reentrant read/write locking and version counters.
//!
//! The whole graph state lives behind a single [`GraphLock`]: a
//! multi-reader/single-writer lock with recursive read acquisition and
//! fail-fast upgrade detection. Structural versions are plain atomics,
//! written while holding the write ticket and readable from anywhere, so
//! observers can poll for change without touching the lock.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Per-thread hold bookkeeping, keyed by lock id. Entries are removed
    /// when the last ticket for a lock drops, so the table stays small.
    static HOLDS: RefCell<HashMap<u64, ThreadHolds>> = RefCell::new(HashMap::new());
}

#[derive(Default)]
struct ThreadHolds {
    reads: usize,
    writing: bool,
}

fn with_holds<R>(lock_id: u64, f: impl FnOnce(&mut ThreadHolds) -> R) -> R {
    HOLDS.with(|holds| {
        let mut map = holds.borrow_mut();
        let entry = map.entry(lock_id).or_default();
        let result = f(entry);
        if entry.reads == 0 && !entry.writing {
            map.remove(&lock_id);
        }
        result
    })
}

/// Data-owning reentrant read/write lock.
///
/// Read tickets may nest on the same thread. Acquiring the write ticket
/// while the calling thread holds read tickets fails fast with
/// [`Error::LockUpgrade`] instead of deadlocking; the same applies to
/// re-entrant write acquisition and to a fresh read while writing (the
/// write ticket already gives mutable access).
///
/// The underlying lock is `parking_lot`'s, which does not starve writers
/// under read pressure.
pub struct GraphLock<T> {
    id: u64,
    inner: RwLock<T>,
}

impl<T> GraphLock<T> {
    /// Wraps a value in a new lock.
    pub fn new(value: T) -> Self {
        Self {
            id: NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed),
            inner: RwLock::new(value),
        }
    }

    /// Acquires a read ticket, blocking until no writer holds the lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockUpgrade`] if the calling thread holds the
    /// write ticket.
    pub fn read(&self) -> Result<ReadTicket<'_, T>> {
        let writing = with_holds(self.id, |h| h.writing);
        if writing {
            return Err(Error::LockUpgrade(
                "read acquisition while holding the write ticket",
            ));
        }
        let guard = self.inner.read_recursive();
        with_holds(self.id, |h| h.reads += 1);
        Ok(ReadTicket {
            guard,
            lock_id: self.id,
        })
    }

    /// Acquires the write ticket, blocking until all readers are gone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockUpgrade`] if the calling thread holds read
    /// tickets (upgrade) or the write ticket (re-entrant write).
    pub fn write(&self) -> Result<WriteTicket<'_, T>> {
        let misuse = with_holds(self.id, |h| {
            if h.writing {
                Some("re-entrant write acquisition")
            } else if h.reads > 0 {
                Some("upgrade from read to write")
            } else {
                None
            }
        });
        if let Some(reason) = misuse {
            return Err(Error::LockUpgrade(reason));
        }
        let guard = self.inner.write();
        with_holds(self.id, |h| h.writing = true);
        Ok(WriteTicket {
            guard,
            lock_id: self.id,
        })
    }

    /// Returns the calling thread's nested read count on this lock.
    #[must_use]
    pub fn read_depth(&self) -> usize {
        with_holds(self.id, |h| h.reads)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for GraphLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphLock").field("id", &self.id).finish()
    }
}

/// RAII read ticket. Dropping it releases one nested read hold.
pub struct ReadTicket<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    lock_id: u64,
}

impl<T> Deref for ReadTicket<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadTicket<'_, T> {
    fn drop(&mut self) {
        with_holds(self.lock_id, |h| {
            debug_assert!(h.reads > 0, "read ticket dropped without a hold");
            h.reads = h.reads.saturating_sub(1);
        });
    }
}

/// RAII write ticket giving exclusive mutable access.
#[derive(Debug)]
pub struct WriteTicket<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    lock_id: u64,
}

impl<T> Deref for WriteTicket<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteTicket<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for WriteTicket<'_, T> {
    fn drop(&mut self) {
        with_holds(self.lock_id, |h| h.writing = false);
    }
}

/// Monotone structural version counters.
///
/// Bumped under the write ticket on every successful structural mutation;
/// read from anywhere without synchronization. A stale read is benign: the
/// observer simply reports the change on its next poll.
#[derive(Debug, Default)]
pub struct VersionCounters {
    node: AtomicU64,
    edge: AtomicU64,
}

impl VersionCounters {
    /// Current node version.
    #[must_use]
    pub fn node(&self) -> u64 {
        self.node.load(Ordering::Acquire)
    }

    /// Current edge version.
    #[must_use]
    pub fn edge(&self) -> u64 {
        self.edge.load(Ordering::Acquire)
    }

    /// Increments the node version, returning the new value.
    pub(crate) fn bump_node(&self) -> u64 {
        self.node.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Increments the edge version, returning the new value.
    pub(crate) fn bump_edge(&self) -> u64 {
        self.edge.fetch_add(1, Ordering::AcqRel) + 1
    }
}
