//! Synthetic counter producers.
//!
//! Stand-ins for the syscall entry path: each producer thread bumps random
//! counters until told to stop, so an export can be exercised against a table
//! that is changing underneath it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use rand::Rng;
use tracing::debug;

use crate::store::CounterTable;

/// Increments performed between checks of the stop flag.
const BATCH: u64 = 256;

pub struct Producers {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<u64>>,
}

impl Producers {
    /// Start `threads` producers incrementing random counters of `table`.
    pub fn spawn(table: Arc<CounterTable>, threads: usize) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let handles = (0..threads)
            .map(|id| {
                let table = Arc::clone(&table);
                let stop = Arc::clone(&stop);
                thread::spawn(move || produce(id, &table, &stop))
            })
            .collect();
        Producers { stop, handles }
    }

    /// Flag shared with the producers; setting it makes them exit.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Stop all producers and return how many increments they made in total.
    pub fn join(self) -> Result<u64> {
        self.stop.store(true, Ordering::Relaxed);
        let mut total = 0u64;
        for handle in self.handles {
            total += handle
                .join()
                .map_err(|_| anyhow!("counter producer thread panicked"))?;
        }
        Ok(total)
    }
}

fn produce(id: usize, table: &CounterTable, stop: &AtomicBool) -> u64 {
    let capacity = table.capacity();
    if capacity == 0 {
        return 0;
    }

    let mut rng = rand::rng();
    let mut increments = 0u64;
    while !stop.load(Ordering::Relaxed) {
        for _ in 0..BATCH {
            table.increment(rng.random_range(0..capacity));
        }
        increments += BATCH;
        thread::yield_now();
    }
    debug!(producer = id, increments, "producer stopped");
    increments
}
