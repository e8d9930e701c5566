//! Per-syscall invocation counters.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Result};

use super::RecordStore;
use crate::record::{CounterRecord, Record};

/// Default table size. Matches the syscall table size the counters were sized for.
pub const DEFAULT_COUNTER_CAPACITY: usize = 550;

/// A fixed-size table of counters incremented by concurrent producers.
///
/// `capacity` is how many counters exist; `count` is how many of them a session
/// exports. The two are configured independently, `count <= capacity`.
///
/// Values are plain relaxed atomics: a session reading the table sees each
/// counter at some point during the walk, not a snapshot taken at start.
pub struct CounterTable {
    counters: Box<[AtomicU64]>,
    count: usize,
}

impl CounterTable {
    /// Table exporting every counter it holds.
    pub fn new(capacity: usize) -> Self {
        let counters = (0..capacity).map(|_| AtomicU64::new(0)).collect();
        CounterTable {
            counters,
            count: capacity,
        }
    }

    /// Table of `capacity` counters of which only the first `count` are exported.
    pub fn with_count(capacity: usize, count: usize) -> Result<Self> {
        if count > capacity {
            bail!(
                "Exported counter count {} exceeds table capacity {}",
                count,
                capacity
            );
        }
        let mut table = Self::new(capacity);
        table.count = count;
        Ok(table)
    }

    /// Table seeded with `values`; `values.len()` becomes both capacity and count.
    pub fn from_values(values: &[u64]) -> Self {
        let counters = values.iter().map(|&v| AtomicU64::new(v)).collect();
        CounterTable {
            counters,
            count: values.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.counters.len()
    }

    /// Bump counter `index` by one. Returns `false` if `index` is outside the table.
    pub fn increment(&self, index: usize) -> bool {
        self.add(index, 1)
    }

    /// Bump counter `index` by `n`. Returns `false` if `index` is outside the table.
    pub fn add(&self, index: usize, n: u64) -> bool {
        match self.counters.get(index) {
            Some(counter) => {
                counter.fetch_add(n, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn value(&self, index: usize) -> Option<u64> {
        self.counters
            .get(index)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    /// Sum over every counter in the table, exported or not.
    pub fn total(&self) -> u64 {
        self.counters
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .fold(0u64, u64::wrapping_add)
    }
}

impl RecordStore for CounterTable {
    fn count(&self) -> usize {
        self.count
    }

    fn get(&self, position: usize) -> Option<Record> {
        if position >= self.count {
            return None;
        }
        self.value(position).map(|value| {
            Record::Counter(CounterRecord {
                index: position,
                value,
            })
        })
    }
}
