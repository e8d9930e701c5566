//! Single-slot store holding the most recent fork event.
//!
//! The slot is shared between the producer that overwrites it and any number
//! of exporting sessions. Every access goes through an `RwLock`, and readers
//! copy the record out while holding the read lock, so a session never formats
//! a record that is half old and half new.

use parking_lot::RwLock;

use super::RecordStore;
use crate::record::{ForkRecord, Record};

#[derive(Default)]
pub struct ForkSlot {
    current: RwLock<Option<ForkRecord>>,
}

impl ForkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the current event in place.
    pub fn publish(&self, record: ForkRecord) {
        *self.current.write() = Some(record);
    }

    /// Consistent copy of the current event, or `None` if nothing was ever published.
    pub fn snapshot(&self) -> Option<ForkRecord> {
        *self.current.read()
    }

    pub fn is_populated(&self) -> bool {
        self.current.read().is_some()
    }
}

impl RecordStore for ForkSlot {
    /// Always 1: a "current event" stream has length one per session.
    fn count(&self) -> usize {
        1
    }

    fn get(&self, position: usize) -> Option<Record> {
        if position != 0 {
            return None;
        }
        self.snapshot().map(Record::Fork)
    }
}
