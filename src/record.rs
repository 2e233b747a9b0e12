//! Fixed binary layout of one KDZ header record.
//!
//! ```text
//! 0x000  name       [u8; 256]  NUL right-padded
//! 0x100  length     u64 LE     payload byte length
//! 0x108  offset     u64 LE     absolute payload start
//! 0x110  reserved0  u64 LE     must be zero
//! 0x118  reserved1  u64 LE     must be zero
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::Cursor;
use tracing::warn;

use crate::error::{KdzError, Result};

pub const NAME_LEN: usize = 256;
pub const RECORD_SIZE: usize = NAME_LEN + 4 * 8;

/// One decoded header record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionRecord {
    pub name:   String,
    pub length: u64,
    pub offset: u64,
    /// Set when a NUL byte appeared before the trailing padding run.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub malformed_name: bool,
}

impl PartitionRecord {
    /// Decode and validate one record.
    pub fn parse(raw: &[u8; RECORD_SIZE]) -> Result<Self> {
        let (name, malformed_name) = decode_name(&raw[..NAME_LEN]);

        let mut cursor = Cursor::new(&raw[NAME_LEN..]);
        let length = cursor.read_u64::<LittleEndian>()?;
        let offset = cursor.read_u64::<LittleEndian>()?;
        for field in ["reserved0", "reserved1"] {
            let value = cursor.read_u64::<LittleEndian>()?;
            if value != 0 {
                return Err(KdzError::CorruptHeader { field, value });
            }
        }

        Ok(Self { name, length, offset, malformed_name })
    }

    /// One past the last payload byte.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

/// Strip the trailing NUL run; flag NULs embedded before it.
fn decode_name(field: &[u8]) -> (String, bool) {
    let trimmed_len = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let trimmed = &field[..trimmed_len];

    let (usable, malformed) = match trimmed.iter().position(|&b| b == 0) {
        Some(nul) => (&trimmed[..nul], true),
        None => (trimmed, false),
    };
    let name = String::from_utf8_lossy(usable).into_owned();
    if malformed {
        warn!(name = %name, "extraneous data found in partition name");
    }
    (name, malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &[u8], length: u64, offset: u64, r0: u64, r1: u64) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[..name.len()].copy_from_slice(name);
        buf[NAME_LEN..NAME_LEN + 8].copy_from_slice(&length.to_le_bytes());
        buf[NAME_LEN + 8..NAME_LEN + 16].copy_from_slice(&offset.to_le_bytes());
        buf[NAME_LEN + 16..NAME_LEN + 24].copy_from_slice(&r0.to_le_bytes());
        buf[NAME_LEN + 24..].copy_from_slice(&r1.to_le_bytes());
        buf
    }

    #[test]
    fn parses_fields() {
        let rec = PartitionRecord::parse(&raw(b"boot.img", 100, 1024, 0, 0)).unwrap();
        assert_eq!(rec.name, "boot.img");
        assert_eq!(rec.length, 100);
        assert_eq!(rec.offset, 1024);
        assert!(!rec.malformed_name);
        assert_eq!(rec.end(), 1124);
    }

    #[test]
    fn record_size_is_fixed() {
        assert_eq!(RECORD_SIZE, 288);
    }

    #[test]
    fn reserved_fields_must_be_zero() {
        match PartitionRecord::parse(&raw(b"a", 1, 2, 0x55, 0)) {
            Err(KdzError::CorruptHeader { field, value }) => {
                assert_eq!(field, "reserved0");
                assert_eq!(value, 0x55);
            }
            other => panic!("unexpected: {other:?}"),
        }
        match PartitionRecord::parse(&raw(b"a", 1, 2, 0, 1 << 40)) {
            Err(KdzError::CorruptHeader { field, .. }) => assert_eq!(field, "reserved1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn embedded_nul_is_flagged_not_fatal() {
        let rec = PartitionRecord::parse(&raw(b"modem.img\0junk", 4, 8, 0, 0)).unwrap();
        assert_eq!(rec.name, "modem.img");
        assert!(rec.malformed_name);
    }

    #[test]
    fn full_width_name_without_padding() {
        let name = [b'x'; NAME_LEN];
        let rec = PartitionRecord::parse(&raw(&name, 0, 0, 0, 0)).unwrap();
        assert_eq!(rec.name.len(), NAME_LEN);
        assert!(!rec.malformed_name);
    }
}
