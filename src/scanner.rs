//! Sequential header-record scanner.
//!
//! The record stream carries no count field.  After every record one byte
//! is inspected:
//!
//! - `0x00` ends the scan.
//! - `0x03` announces that exactly one more record follows.  After that
//!   record the next byte is consumed if it is a terminator, otherwise it
//!   is pushed back, and the scan ends either way.
//! - Anything else is the first byte of the next record and is pushed back
//!   before decoding continues.

use std::io::{self, Read, Seek};
use tracing::debug;

use crate::error::{KdzError, Result};
use crate::record::{PartitionRecord, RECORD_SIZE};

/// Announces that the next record is the last one.
pub const TERMINATOR_LAST: u8 = 0x03;
/// Ends the header region without an explicit last-record flag.
pub const TERMINATOR_END: u8 = 0x00;

/// How the header region was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// A last-record marker preceded the final record.
    LastRecord,
    CleanEnd,
}

impl Terminator {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            TERMINATOR_LAST => Some(Terminator::LastRecord),
            TERMINATOR_END => Some(Terminator::CleanEnd),
            _ => None,
        }
    }
}

// ── Pushback reader ───────────────────────────────────────────────────────────

/// Reader with a single byte of pushback.
pub struct PushbackReader<R> {
    inner:  R,
    peeked: Option<u8>,
}

impl<R: Read> PushbackReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, peeked: None }
    }

    /// Read one byte; `None` at end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Push back a byte obtained from [`read_byte`](Self::read_byte).
    ///
    /// Only one byte may be outstanding.
    pub fn unread(&mut self, b: u8) {
        debug_assert!(self.peeked.is_none(), "pushback buffer holds one byte");
        self.peeked = Some(b);
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> PushbackReader<R> {
    /// Logical position, accounting for a pushed-back byte.
    pub fn position(&mut self) -> io::Result<u64> {
        let pos = self.inner.stream_position()?;
        Ok(pos - self.peeked.is_some() as u64)
    }
}

impl<R: Read> Read for PushbackReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.peeked.take() {
            Some(b) => {
                buf[0] = b;
                Ok(1)
            }
            None => self.inner.read(buf),
        }
    }
}

// ── Scan ──────────────────────────────────────────────────────────────────────

/// Result of scanning the header region.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Records in scan order.
    pub partitions: Vec<PartitionRecord>,
    /// Minimum declared payload offset.
    pub data_start: u64,
    /// Stream position just past the last consumed header byte.
    pub header_end: u64,
    pub terminator: Terminator,
}

/// Decode header records from the current position until a terminator.
///
/// The stream must be positioned just after the magic prefix.  A region
/// that starts with a terminator byte is rejected as
/// [`KdzError::EmptyContainer`].
pub fn scan_headers<R: Read + Seek>(reader: &mut R) -> Result<ScanOutcome> {
    let mut input = PushbackReader::new(reader);

    match input.read_byte()? {
        None => return Err(KdzError::TruncatedHeader { offset: input.position()? }),
        Some(b) if Terminator::from_byte(b).is_some() => return Err(KdzError::EmptyContainer),
        Some(b) => input.unread(b),
    }

    let mut partitions = Vec::new();
    let mut data_start = u64::MAX;
    let mut last = false;

    let terminator = loop {
        let record_pos = input.position()?;
        let mut raw = [0u8; RECORD_SIZE];
        input.read_exact(&mut raw).map_err(|e| truncated(e, record_pos))?;

        let record = PartitionRecord::parse(&raw)?;
        debug!(
            index = partitions.len(),
            name = %record.name,
            offset = record.offset,
            length = record.length,
            "decoded header record"
        );
        data_start = data_start.min(record.offset);
        partitions.push(record);

        let next_pos = input.position()?;
        let next = input.read_byte()?;

        if last {
            // Trailing byte after the final record: consume a terminator,
            // leave anything else (or end of stream) for the gap.
            if let Some(b) = next {
                if Terminator::from_byte(b).is_none() {
                    input.unread(b);
                }
            }
            break Terminator::LastRecord;
        }

        match next {
            None => return Err(KdzError::TruncatedHeader { offset: next_pos }),
            Some(TERMINATOR_END) => break Terminator::CleanEnd,
            Some(TERMINATOR_LAST) => last = true,
            Some(b) => input.unread(b),
        }
    };

    let header_end = input.position()?;
    debug!(records = partitions.len(), data_start, header_end, ?terminator, "header scan complete");

    Ok(ScanOutcome { partitions, data_start, header_end, terminator })
}

fn truncated(e: io::Error, offset: u64) -> KdzError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => KdzError::TruncatedHeader { offset },
        _ => KdzError::Io(e),
    }
}
