//! Synthetic container builder shared by the integration tests.

#![allow(dead_code)]

use kdzkit::record::{NAME_LEN, RECORD_SIZE};
use kdzkit::scanner::{TERMINATOR_END, TERMINATOR_LAST};

pub struct Part {
    pub name:   Vec<u8>,
    pub offset: u64,
    pub length: u64,
    pub reserved: [u64; 2],
}

impl Part {
    pub fn new(name: &str, offset: u64, length: u64) -> Self {
        Self { name: name.as_bytes().to_vec(), offset, length, reserved: [0, 0] }
    }
}

/// Deterministic payload byte for absolute position `pos`.
pub fn fill_byte(pos: u64) -> u8 {
    (pos.wrapping_mul(31) % 251) as u8
}

pub struct Built {
    pub bytes:      Vec<u8>,
    /// Position just past the header terminator bytes.
    pub header_end: u64,
}

/// Lay out `magic`, the records, the terminators, then payloads at their
/// declared offsets.  With `last` the final record is preceded by the
/// last-record marker.  `gap` overrides the bytes right after the header.
pub fn build(magic: [u8; 8], parts: &[Part], last: bool, gap: &[u8]) -> Built {
    let mut bytes = magic.to_vec();
    // The last-record marker sits before the final record, so it needs at
    // least two; a lone record always ends with a clean terminator.
    let marked = last && parts.len() >= 2;
    for (i, p) in parts.iter().enumerate() {
        if marked && i + 1 == parts.len() {
            bytes.push(TERMINATOR_LAST);
        }
        let mut rec = vec![0u8; RECORD_SIZE];
        rec[..p.name.len()].copy_from_slice(&p.name);
        rec[NAME_LEN..NAME_LEN + 8].copy_from_slice(&p.length.to_le_bytes());
        rec[NAME_LEN + 8..NAME_LEN + 16].copy_from_slice(&p.offset.to_le_bytes());
        rec[NAME_LEN + 16..NAME_LEN + 24].copy_from_slice(&p.reserved[0].to_le_bytes());
        rec[NAME_LEN + 24..].copy_from_slice(&p.reserved[1].to_le_bytes());
        bytes.extend(rec);
    }
    bytes.push(TERMINATOR_END);
    let header_end = bytes.len() as u64;
    bytes.extend_from_slice(gap);

    let end = parts.iter().map(|p| p.offset + p.length).max().unwrap_or(0) as usize;
    if bytes.len() < end {
        bytes.resize(end, 0);
    }
    for p in parts {
        for pos in p.offset..p.offset + p.length {
            bytes[pos as usize] = fill_byte(pos);
        }
    }
    Built { bytes, header_end }
}
