//! Error type shared by every stage of the KDZ pipeline.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KdzError>;

#[derive(Error, Debug)]
pub enum KdzError {
    /// The 8-byte prefix matched none of the known variants.
    #[error("Unsupported KDZ file format (received header \"{}\")", hex_spaced(.0))]
    UnsupportedFormat([u8; 8]),

    /// A reserved header field was non-zero.
    #[error("Corrupt header: field \"{field}\" is non-zero ({value:#x})")]
    CorruptHeader { field: &'static str, value: u64 },

    #[error("Truncated header region at offset {offset}")]
    TruncatedHeader { offset: u64 },

    #[error("Truncated stream at offset {offset}: expected {expected} bytes, got {actual}")]
    TruncatedStream { offset: u64, expected: u64, actual: u64 },

    /// The header region starts with a terminator byte.
    #[error("Container has no header records")]
    EmptyContainer,

    #[error("Payload at offset {offset} overlaps the header region ending at {header_end}")]
    OverlappingPayload { offset: u64, header_end: u64 },

    #[error("Partition name {0:?} is not usable as a file name")]
    UnsafeName(String),

    #[error("Partition index {index} is out of range ({count} partitions)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl KdzError {
    /// Errors that leave the container usable for other requests.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KdzError::IndexOutOfRange { .. } | KdzError::UnsafeName(_))
    }
}

/// `28 05 00 00 ...` style rendering used in diagnostics.
pub(crate) fn hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_shows_hex() {
        let err = KdzError::UnsupportedFormat([0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]);
        assert_eq!(
            err.to_string(),
            "Unsupported KDZ file format (received header \"de ad be ef 00 01 02 03\")"
        );
    }

    #[test]
    fn corrupt_header_names_field() {
        let err = KdzError::CorruptHeader { field: "reserved1", value: 0x1f00 };
        assert!(err.to_string().contains("\"reserved1\""));
        assert!(err.to_string().contains("0x1f00"));
    }

    #[test]
    fn recoverable_kinds() {
        assert!(KdzError::IndexOutOfRange { index: 4, count: 2 }.is_recoverable());
        assert!(!KdzError::EmptyContainer.is_recoverable());
    }
}
