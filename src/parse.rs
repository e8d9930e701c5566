//! Consumer side: reading an export and parsing its lines back into fields.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::errors::ExportError;
use crate::record::{CommName, ForkRecord};

/// Size of the single read the classic consumer performs.
pub const DEFAULT_MAX_LINE: usize = 100;

/// Static regex for fork lines. Compiled once at first use.
/// Pattern: flags = 0x{hex}, user = {uid}, ppid = {pid}, cpid = {pid}, comm = {comm}, return = {ret}
static FORK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^flags = 0x([0-9A-Fa-f]+), user = +(\d+), ppid = +(-?\d+), cpid = +(-?\d+), comm = (.*), return = (-?\d+)$",
    )
    .expect("Invalid fork line regex pattern")
});

/// Fields recovered from one fork line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedFork {
    pub clone_flags: u64,
    pub parent_uid: u32,
    pub parent_pid: i32,
    pub child_pid: i32,
    pub command_name: String,
    pub child_return: i64,
}

impl From<&ParsedFork> for ForkRecord {
    fn from(parsed: &ParsedFork) -> Self {
        ForkRecord {
            clone_flags: parsed.clone_flags,
            parent_pid: parsed.parent_pid,
            child_pid: parsed.child_pid,
            parent_uid: parsed.parent_uid,
            command_name: CommName::from(parsed.command_name.as_str()),
            child_return: parsed.child_return,
        }
    }
}

fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// Parse a counter line (`"<value>\n"`).
pub fn parse_counter_line(line: &str) -> Result<u64, ExportError> {
    strip_newline(line)
        .parse::<u64>()
        .map_err(|e| ExportError::parse(line, e.to_string()))
}

/// Parse a fork line back into its fields.
pub fn parse_fork_line(line: &str) -> Result<ParsedFork, ExportError> {
    let trimmed = strip_newline(line);
    let caps = FORK_LINE_RE
        .captures(trimmed)
        .ok_or_else(|| ExportError::parse(line, "does not match the fork record layout"))?;

    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let number_err = |name: &str, e: std::num::ParseIntError| {
        ExportError::parse(line, format!("bad {name}: {e}"))
    };

    Ok(ParsedFork {
        clone_flags: u64::from_str_radix(field(1), 16).map_err(|e| number_err("flags", e))?,
        parent_uid: field(2).parse().map_err(|e| number_err("user", e))?,
        parent_pid: field(3).parse().map_err(|e| number_err("ppid", e))?,
        child_pid: field(4).parse().map_err(|e| number_err("cpid", e))?,
        command_name: field(5).trim_start().to_string(),
        child_return: field(6).parse().map_err(|e| number_err("return", e))?,
    })
}

/// Open `path` and perform a single read of at most `max_len` bytes, the way a
/// simple consumer reads a one-record export.
pub fn read_export(path: &Path, max_len: usize) -> Result<Vec<u8>> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut buf = vec![0u8; max_len];
    let n = file
        .read(&mut buf)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    buf.truncate(n);
    Ok(buf)
}

/// Read `path` to the end using reads of at most `max_len` bytes each.
pub fn read_export_all(path: &Path, max_len: usize) -> Result<Vec<u8>> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut out = Vec::new();
    let mut buf = vec![0u8; max_len.max(1)];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{format_record, Record};
    use std::io::Write;

    const BASH_LINE: &str =
        "flags = 0x00000011, user =  1000, ppid =   100, cpid =   101, comm =     bash, return = 0\n";

    #[test]
    fn test_parse_counter_line() {
        assert_eq!(parse_counter_line("42\n").unwrap(), 42);
        assert_eq!(parse_counter_line("0").unwrap(), 0);
        assert!(matches!(
            parse_counter_line("-1\n"),
            Err(ExportError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_fork_line() {
        let parsed = parse_fork_line(BASH_LINE).unwrap();
        assert_eq!(
            parsed,
            ParsedFork {
                clone_flags: 0x11,
                parent_uid: 1000,
                parent_pid: 100,
                child_pid: 101,
                command_name: "bash".to_string(),
                child_return: 0,
            }
        );
    }

    #[test]
    fn test_parse_reverses_format() {
        let record = ForkRecord {
            clone_flags: 0x0180_0011,
            parent_pid: 31337,
            child_pid: -1,
            parent_uid: 65534,
            command_name: CommName::from("cc1plus"),
            child_return: -11,
        };
        let line = format_record(&Record::Fork(record));
        let parsed = parse_fork_line(&line).unwrap();
        assert_eq!(ForkRecord::from(&parsed), record);
    }

    #[test]
    fn test_parse_fork_line_rejects_garbage() {
        let err = parse_fork_line("42\n").unwrap_err();
        assert!(err.to_string().contains("fork record layout"), "{err}");
    }

    #[test]
    fn test_read_export_single_read_is_bounded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for _ in 0..3 {
            file.write_all(BASH_LINE.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        let first = read_export(file.path(), DEFAULT_MAX_LINE).unwrap();
        assert_eq!(first.len(), DEFAULT_MAX_LINE);

        let all = read_export_all(file.path(), 7).unwrap();
        assert_eq!(all, BASH_LINE.repeat(3).into_bytes());
    }

    #[test]
    fn test_read_export_missing_file() {
        let err = read_export(Path::new("/nonexistent/fork_info"), 10).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
