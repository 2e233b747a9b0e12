//! Reconcile the end of the header region with the first payload offset.
//!
//! Producers are free to leave space between the header records and the
//! first payload.  Zero padding is ignored; anything else is reported as
//! extra data and preserved on full extraction.

use serde::Serialize;
use std::io::{self, Read};
use tracing::{debug, warn};

use crate::error::{KdzError, Result};

const GAP_CHUNK: usize = 64 * 1024;

/// Undeclared data between the header region and the first payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtraSpan {
    pub start: u64,
    pub end:   u64,
}

impl ExtraSpan {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Layout facts derived once per container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContainerMetadata {
    pub data_start: u64,
    pub header_end: u64,
    pub extra:      Option<ExtraSpan>,
}

impl ContainerMetadata {
    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }

    /// Bytes inspected between the header region and `data_start`.
    pub fn gap(&self) -> u64 {
        gap_len(self.header_end, self.data_start)
    }
}

/// `data_start - header_end - 1`, clamped at zero.
fn gap_len(header_end: u64, data_start: u64) -> u64 {
    data_start.saturating_sub(header_end).saturating_sub(1)
}

/// Inspect the gap that follows the header region.
///
/// `reader` must be positioned at `header_end`.  Exactly the gap bytes are
/// consumed.
pub fn reconcile<R: Read>(reader: &mut R, header_end: u64, data_start: u64) -> Result<ContainerMetadata> {
    if data_start < header_end {
        return Err(KdzError::OverlappingPayload { offset: data_start, header_end });
    }

    let gap = gap_len(header_end, data_start);
    let mut meta = ContainerMetadata { data_start, header_end, extra: None };
    if gap == 0 {
        return Ok(meta);
    }

    let mut buf = vec![0u8; GAP_CHUNK.min(gap as usize)];
    let mut remaining = gap;
    let mut non_zero = false;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        reader.read_exact(&mut buf[..n]).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => KdzError::TruncatedStream {
                offset:   header_end,
                expected: gap,
                actual:   gap - remaining,
            },
            _ => KdzError::Io(e),
        })?;
        non_zero |= buf[..n].iter().any(|&b| b != 0);
        remaining -= n as u64;
    }

    if non_zero {
        warn!(header_end, data_start, "data between headers and payload");
        meta.extra = Some(ExtraSpan { start: header_end, end: data_start });
    } else {
        debug!(gap, "zero padding between headers and payload");
    }
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn contiguous_payload_reads_nothing() {
        let mut cur = Cursor::new(Vec::new());
        let meta = reconcile(&mut cur, 100, 101).unwrap();
        assert!(!meta.has_extra());
        assert_eq!(meta.gap(), 0);
        assert_eq!(cur.position(), 0);

        let meta = reconcile(&mut cur, 100, 100).unwrap();
        assert_eq!(meta.gap(), 0);
    }

    #[test]
    fn zero_gap_is_not_extra() {
        let mut cur = Cursor::new(vec![0u8; 15]);
        let meta = reconcile(&mut cur, 100, 116).unwrap();
        assert!(!meta.has_extra());
        assert_eq!(cur.position(), 15);
    }

    #[test]
    fn non_zero_gap_is_extra() {
        let mut gap = vec![0u8; 15];
        gap[9] = 0x7f;
        let meta = reconcile(&mut Cursor::new(gap), 100, 116).unwrap();
        let span = meta.extra.unwrap();
        assert_eq!((span.start, span.end), (100, 116));
        assert_eq!(span.len(), 16);
    }

    #[test]
    fn overlap_is_rejected() {
        let err = reconcile(&mut Cursor::new(Vec::new()), 600, 512).unwrap_err();
        assert!(matches!(err, KdzError::OverlappingPayload { offset: 512, header_end: 600 }));
    }

    #[test]
    fn short_gap_is_truncated() {
        let err = reconcile(&mut Cursor::new(vec![0u8; 4]), 10, 30).unwrap_err();
        assert!(matches!(err, KdzError::TruncatedStream { expected: 19, actual: 0, .. }));
    }
}
