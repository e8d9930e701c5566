use crate::record::Record;

use super::RecordStore;

/// A store backed by a plain `Vec<Record>`.
///
/// This is useful for testing and for exporting a set of records that was
/// collected up front.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    records: Vec<Record>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: impl Into<Record>) {
        self.records.push(record.into());
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl<R: Into<Record>> FromIterator<R> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        InMemoryStore {
            records: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecordStore for InMemoryStore {
    fn count(&self) -> usize {
        self.records.len()
    }

    fn get(&self, position: usize) -> Option<Record> {
        self.records.get(position).copied()
    }
}
