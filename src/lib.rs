//! seqexport - resumable, chunked export of backend records as text.
//!
//! A set of records (syscall invocation counters, or the most recent fork
//! event) is streamed to a consumer through a size-limited read channel. Each
//! read runs one session of a start/next/stop iterator, and the walk resumes
//! from a bookmark so no record is repeated or skipped across reads.
//!
//! # Modules
//!
//! - [`record`] - record types and their byte-exact line formats
//! - [`store`] - the [`RecordStore`] trait and its backends
//! - [`seq`] - the iterator state machine and [`Bookmark`]
//! - [`reader`] - chunked reader driving sessions, also an `io::Read`
//! - [`parse`] - consumer-side reading and line parsing
//!
//! # Example
//!
//! ```
//! use seqexport::{CounterTable, ExportReader};
//!
//! let table = CounterTable::from_values(&[5, 0, 42]);
//! let mut reader = ExportReader::new(&table);
//! assert_eq!(reader.read_chunk(4).unwrap().as_deref(), Some("5\n0\n"));
//! assert_eq!(reader.read_chunk(4).unwrap().as_deref(), Some("42\n"));
//! assert_eq!(reader.read_chunk(4).unwrap(), None);
//! ```

pub mod config;
pub mod errors;
pub mod parse;
pub mod process;
pub mod reader;
pub mod record;
pub mod seq;
pub mod simulate;
pub mod spawn;
pub mod store;

pub use config::Config;
pub use errors::ExportError;
pub use reader::{ExportReader, LineFormat};
pub use record::{format_record, CommName, CounterRecord, ForkRecord, Record};
pub use seq::{Bookmark, SeqIter, SeqState};
pub use store::{CounterTable, ForkSlot, InMemoryStore, RecordStore};
