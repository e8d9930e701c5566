//! Record types served by the export stream.
//!
//! Two kinds of record exist: a per-syscall invocation counter and the most
//! recent process-creation (fork) event. Both are carried by the single tagged
//! [`Record`] type so every store, the iterator and the formatter deal with
//! one shape.

use std::fmt;

use serde::{Serialize, Serializer};

/// Capacity of a task command name, matching the kernel's `TASK_COMM_LEN`.
pub const COMM_LEN: usize = 16;

/// One syscall invocation counter.
///
/// # Fields
/// - `index`: position of the counter in its table (the syscall number)
/// - `value`: number of invocations observed so far
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CounterRecord {
    pub index: usize,
    pub value: u64,
}

/// Fixed-capacity command name.
///
/// The bytes are not guaranteed to be NUL terminated, so this is always
/// handled as a bounded buffer and never as a C string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CommName([u8; COMM_LEN]);

impl CommName {
    /// Copy at most [`COMM_LEN`] bytes out of `bytes`. Shorter input is NUL padded.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; COMM_LEN];
        let len = bytes.len().min(COMM_LEN);
        buf[..len].copy_from_slice(&bytes[..len]);
        CommName(buf)
    }

    pub fn raw(&self) -> &[u8; COMM_LEN] {
        &self.0
    }

    /// The displayable part of the name: everything before the first NUL or
    /// other non-printable byte, or all 16 bytes if there is none.
    pub fn visible_bytes(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .position(|&b| !is_printable(b))
            .unwrap_or(COMM_LEN);
        &self.0[..end]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.visible_bytes()).into_owned()
    }
}

fn is_printable(b: u8) -> bool {
    b == b' ' || b.is_ascii_graphic()
}

impl From<&str> for CommName {
    fn from(name: &str) -> Self {
        CommName::from_bytes(name.as_bytes())
    }
}

impl fmt::Debug for CommName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommName({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for CommName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width and alignment flags from the caller apply
        f.pad(&self.to_string_lossy())
    }
}

impl Serialize for CommName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// The most recent process-creation event.
///
/// # Fields
/// - `clone_flags`: flags passed to clone (SIGCHLD only for a plain fork)
/// - `parent_pid`: pid of the forking task
/// - `child_pid`: pid of the new task
/// - `parent_uid`: uid of the forking task
/// - `command_name`: comm of the forking task
/// - `child_return`: value fork returned to the parent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ForkRecord {
    pub clone_flags: u64,
    pub parent_pid: i32,
    pub child_pid: i32,
    pub parent_uid: u32,
    pub command_name: CommName,
    pub child_return: i64,
}

/// A record as handed out by a [`RecordStore`](crate::store::RecordStore).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Counter(CounterRecord),
    Fork(ForkRecord),
}

impl From<CounterRecord> for Record {
    fn from(record: CounterRecord) -> Self {
        Record::Counter(record)
    }
}

impl From<ForkRecord> for Record {
    fn from(record: ForkRecord) -> Self {
        Record::Fork(record)
    }
}
