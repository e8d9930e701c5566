//! Chunked reader over an export.
//!
//! [`ExportReader`] is the transport side of the protocol. Each call to
//! [`read_chunk`](ExportReader::read_chunk) runs one session: it resumes the walk
//! after the last record it delivered, appends whole lines until the next one
//! would not fit, and stops. The line that did not fit is not lost; the next
//! chunk starts with it. Lines are never split across chunks.
//!
//! The reader also implements [`std::io::Read`] so an export can be handed to
//! anything that consumes bytes. Partially copied chunks are buffered, so a
//! caller reading a few bytes at a time sees the same byte stream.

use std::io;

use tracing::{debug, trace};

use crate::errors::ExportError;
use crate::record::{format_record, format_record_json, Record};
use crate::seq::{Bookmark, SeqIter};
use crate::store::RecordStore;

/// One page, the size a read of a procfs file is usually served in.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How each record is rendered into the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineFormat {
    /// The legacy text layouts.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

pub struct ExportReader<S> {
    store: S,
    format: LineFormat,
    chunk_capacity: usize,
    /// Last bookmark whose line was delivered.
    cursor: Option<Bookmark>,
    exhausted: bool,
    records_emitted: u64,
    pending: Vec<u8>,
    pending_offset: usize,
}

impl<S: RecordStore> ExportReader<S> {
    pub fn new(store: S) -> Self {
        ExportReader {
            store,
            format: LineFormat::Text,
            chunk_capacity: DEFAULT_CHUNK_SIZE,
            cursor: None,
            exhausted: false,
            records_emitted: 0,
            pending: Vec::new(),
            pending_offset: 0,
        }
    }

    /// Continue an export whose last delivered record was at `cursor`.
    pub fn resume_from(store: S, cursor: Bookmark) -> Self {
        let mut reader = Self::new(store);
        reader.cursor = Some(cursor);
        reader
    }

    pub fn with_format(mut self, format: LineFormat) -> Self {
        self.format = format;
        self
    }

    /// Chunk size used by the `io::Read` implementation.
    pub fn with_chunk_capacity(mut self, capacity: usize) -> Self {
        self.chunk_capacity = capacity;
        self
    }

    /// Bookmark of the last record delivered, `None` before the first one.
    pub fn cursor(&self) -> Option<Bookmark> {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn records_emitted(&self) -> u64 {
        self.records_emitted
    }

    /// Produce the next chunk of at most `capacity` bytes.
    ///
    /// Returns `Ok(None)` once every record has been delivered, which for an
    /// empty or unpopulated store is the very first call.
    pub fn read_chunk(&mut self, capacity: usize) -> Result<Option<String>, ExportError> {
        if capacity == 0 {
            return Err(ExportError::ZeroCapacity);
        }
        if self.exhausted {
            return Ok(None);
        }

        let mut iter = match self.cursor {
            Some(cursor) => SeqIter::resume(&self.store, cursor),
            None => SeqIter::new(&self.store),
        };
        let mut item = match self.cursor {
            Some(cursor) => iter.next(cursor),
            None => iter.start(),
        };

        let mut chunk = String::new();
        let mut last = None;
        loop {
            let Some((bookmark, record)) = item else {
                self.exhausted = true;
                break;
            };
            last = Some(bookmark);

            let line = self.render(&record)?;
            if chunk.len() + line.len() > capacity {
                if chunk.is_empty() {
                    iter.stop(last);
                    return Err(ExportError::RecordTooLarge {
                        position: bookmark.position(),
                        len: line.len(),
                        capacity,
                    });
                }
                trace!(position = bookmark.position(), "chunk full, deferring record");
                break;
            }

            chunk.push_str(&line);
            self.cursor = Some(bookmark);
            self.records_emitted += 1;
            item = iter.next(bookmark);
        }
        iter.stop(last);

        debug!(
            bytes = chunk.len(),
            cursor = self.cursor.map(Bookmark::position),
            exhausted = self.exhausted,
            "filled chunk"
        );
        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }

    /// Drain the remaining export into one string, `chunk_capacity` bytes at a time.
    pub fn read_to_end_string(&mut self) -> Result<String, ExportError> {
        let mut out = String::new();
        while let Some(chunk) = self.read_chunk(self.chunk_capacity)? {
            out.push_str(&chunk);
        }
        Ok(out)
    }

    fn render(&self, record: &Record) -> Result<String, ExportError> {
        match self.format {
            LineFormat::Text => Ok(format_record(record)),
            LineFormat::Json => Ok(format_record_json(record)?),
        }
    }
}

impl<S: RecordStore> io::Read for ExportReader<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending_offset >= self.pending.len() {
            let chunk = self
                .read_chunk(self.chunk_capacity)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            match chunk {
                Some(chunk) => {
                    self.pending = chunk.into_bytes();
                    self.pending_offset = 0;
                }
                None => return Ok(0),
            }
        }

        let available = &self.pending[self.pending_offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pending_offset += n;
        Ok(n)
    }
}
