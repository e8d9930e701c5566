//! Text rendering of records.
//!
//! The layouts here are consumed textually by existing readers and must stay
//! byte-exact: one newline-terminated line per record.

use std::fmt;

use super::models::{CounterRecord, ForkRecord, Record};

/// Render one record into its line, including the trailing newline.
pub fn format_record(record: &Record) -> String {
    record.to_string()
}

/// Append one record's line to `out`.
pub fn write_record<W: fmt::Write>(out: &mut W, record: &Record) -> fmt::Result {
    match record {
        Record::Counter(counter) => write_counter(out, counter),
        Record::Fork(fork) => write_fork(out, fork),
    }
}

fn write_counter<W: fmt::Write>(out: &mut W, counter: &CounterRecord) -> fmt::Result {
    writeln!(out, "{}", counter.value)
}

fn write_fork<W: fmt::Write>(out: &mut W, fork: &ForkRecord) -> fmt::Result {
    writeln!(
        out,
        "flags = 0x{:08X}, user = {:5}, ppid = {:5}, cpid = {:5}, comm = {:>8}, return = {}",
        fork.clone_flags,
        fork.parent_uid,
        fork.parent_pid,
        fork.child_pid,
        fork.command_name,
        fork.child_return
    )
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_record(f, self)
    }
}

/// JSON rendering used by `--json` output, one object per line.
pub fn format_record_json(record: &Record) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}
