//! Record data model and its text rendering.
//!
//! - [`models`]: the tagged [`Record`] type and its two kinds
//! - [`format`]: byte-exact line layouts for each kind

pub mod format;
pub mod models;

pub use format::{format_record, format_record_json, write_record};
pub use models::{CommName, CounterRecord, ForkRecord, Record, COMM_LEN};
