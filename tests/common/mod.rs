//! Common test utilities for seqexport integration tests.

#![allow(dead_code)]

use seqexport::{
    format_record, CommName, CounterRecord, ForkRecord, InMemoryStore, RecordStore, SeqIter,
};

/// In-memory store of counter records with the given values at positions 0..n.
pub fn counter_store(values: &[u64]) -> InMemoryStore {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| CounterRecord { index, value })
        .collect()
}

/// The fork event used throughout the tests: bash (pid 100) forking pid 101.
pub fn bash_fork() -> ForkRecord {
    ForkRecord {
        clone_flags: 0x0000_0011,
        parent_pid: 100,
        child_pid: 101,
        parent_uid: 1000,
        command_name: CommName::from("bash"),
        child_return: 0,
    }
}

/// Every line of one uninterrupted walk over `store`.
pub fn walk_lines<S: RecordStore>(store: S) -> Vec<String> {
    SeqIter::new(store)
        .walk()
        .map(|(_, record)| format_record(&record))
        .collect()
}
