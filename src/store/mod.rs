//! Backends that records are pulled from.
//!
//! A store is read-only from the exporter's side. Producers mutate it through
//! the backend's own API ([`CounterTable::increment`], [`ForkSlot::publish`]),
//! possibly while a session is walking it.

pub mod counters;
pub mod fork_slot;
pub mod memory;

use std::sync::Arc;

use crate::record::Record;

pub use counters::CounterTable;
pub use fork_slot::ForkSlot;
pub use memory::InMemoryStore;

/// Positional, read-only view of a set of records.
///
/// Enumeration is strictly by ascending position in `0..count()`.
pub trait RecordStore {
    /// Number of positions a session may visit. Fixed before any session begins.
    fn count(&self) -> usize;

    /// Snapshot of the record at `position`, or `None` if the slot has not been
    /// populated (or `position` is out of range).
    fn get(&self, position: usize) -> Option<Record>;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn get(&self, position: usize) -> Option<Record> {
        (**self).get(position)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn get(&self, position: usize) -> Option<Record> {
        (**self).get(position)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn get(&self, position: usize) -> Option<Record> {
        (**self).get(position)
    }
}
