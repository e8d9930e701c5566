use thiserror::Error;

/// Recoverable failures of the export reader and the line parser.
///
/// Running out of records is not an error; it is reported as `None`.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("record at position {position} renders to {len} bytes, larger than the {capacity}-byte chunk")]
    RecordTooLarge {
        position: usize,
        len: usize,
        capacity: usize,
    },

    #[error("chunk capacity must be greater than zero")]
    ZeroCapacity,

    #[error("failed to render record as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed line {line:?}: {reason}")]
    Parse { line: String, reason: String },
}

impl ExportError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        ExportError::Parse {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}
