//! Export settings and the counter seed file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::reader::{LineFormat, DEFAULT_CHUNK_SIZE};
use crate::store::counters::DEFAULT_COUNTER_CAPACITY;
use crate::store::CounterTable;

#[derive(Clone, Debug)]
pub struct Config {
    /// Bytes per chunk handed to the consumer
    pub chunk_size: usize,
    /// Rendering of each record
    pub format: LineFormat,
    /// Number of counters in the table
    pub counter_capacity: usize,
    /// Number of counters exported (None = all of them)
    pub counter_count: Option<usize>,
    /// JSON file with initial counter values
    pub counter_values: Option<PathBuf>,
    /// Concurrent producer threads bumping counters during the export
    pub producers: usize,
    /// How long producers run before the export starts, in milliseconds
    pub warmup_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: DEFAULT_CHUNK_SIZE,
            format: LineFormat::Text,
            counter_capacity: DEFAULT_COUNTER_CAPACITY,
            counter_count: None,
            counter_values: None,
            producers: 0,
            warmup_ms: 0,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("Chunk size must be greater than zero");
        }
        if let Some(count) = self.counter_count {
            if count > self.counter_capacity {
                bail!(
                    "Counter count {} exceeds counter capacity {}",
                    count,
                    self.counter_capacity
                );
            }
        }
        Ok(())
    }

    /// Build the counter table described by this config, seeded from
    /// `counter_values` if set.
    pub fn counter_table(&self) -> Result<CounterTable> {
        self.validate()?;
        let count = self.counter_count.unwrap_or(self.counter_capacity);
        let table = CounterTable::with_count(self.counter_capacity, count)?;

        if let Some(path) = &self.counter_values {
            let values = load_counter_values(path)?;
            if values.len() > self.counter_capacity {
                bail!(
                    "{} holds {} values but the counter capacity is {}",
                    path.display(),
                    values.len(),
                    self.counter_capacity
                );
            }
            for (index, value) in values.into_iter().enumerate() {
                table.add(index, value);
            }
        }
        Ok(table)
    }
}

/// Accepted shapes of a counter seed file: a bare array of values indexed by
/// position, or an object with a `values` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CounterSeed {
    List(Vec<u64>),
    Object { values: Vec<u64> },
}

pub fn load_counter_values(path: &Path) -> Result<Vec<u64>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_counter_values(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_counter_values(contents: &str) -> Result<Vec<u64>> {
    let seed: CounterSeed = serde_json::from_str(contents)?;
    Ok(match seed {
        CounterSeed::List(values) => values,
        CounterSeed::Object { values } => values,
    })
}
