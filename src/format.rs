//! Container variant detection from the 8-byte magic prefix.

use std::fmt;
use std::io::{self, Read};

use crate::error::{KdzError, Result};

pub const MAGIC_LEN: usize = 8;

pub const MAGIC_V0: [u8; MAGIC_LEN] = [0x28, 0x05, 0x00, 0x00, 0x34, 0x31, 0x25, 0x80];
pub const MAGIC_V1: [u8; MAGIC_LEN] = [0x18, 0x05, 0x00, 0x00, 0x32, 0x79, 0x44, 0x50];
pub const MAGIC_V2: [u8; MAGIC_LEN] = [0x28, 0x05, 0x00, 0x00, 0x24, 0x38, 0x22, 0x25];

/// Known KDZ container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KdzVersion {
    V0,
    V1,
    V2,
}

impl KdzVersion {
    pub const ALL: [KdzVersion; 3] = [KdzVersion::V0, KdzVersion::V1, KdzVersion::V2];

    /// Exact match only; anything else is [`KdzError::UnsupportedFormat`].
    pub fn from_magic(magic: &[u8; MAGIC_LEN]) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.magic() == *magic)
            .ok_or(KdzError::UnsupportedFormat(*magic))
    }

    /// Read the prefix from `reader` and detect the variant.
    ///
    /// Advances the stream by exactly 8 bytes on success.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; MAGIC_LEN];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => KdzError::TruncatedHeader { offset: 0 },
            _ => KdzError::Io(e),
        })?;
        Self::from_magic(&magic)
    }

    pub fn magic(&self) -> [u8; MAGIC_LEN] {
        match self {
            KdzVersion::V0 => MAGIC_V0,
            KdzVersion::V1 => MAGIC_V1,
            KdzVersion::V2 => MAGIC_V2,
        }
    }

    /// Numeric identifier written to the manifest.
    pub fn id(&self) -> u8 {
        match self {
            KdzVersion::V0 => 0,
            KdzVersion::V1 => 1,
            KdzVersion::V2 => 2,
        }
    }
}

impl fmt::Display for KdzVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.id())
    }
}
