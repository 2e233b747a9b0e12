//! `.kdz.params` manifest: enough state to lay the payloads back out.
//!
//! Entries are ordered by payload offset while each one remembers the
//! scan-order slot of its header record, since the two orders can differ.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::format::KdzVersion;
use crate::record::{PartitionRecord, RECORD_SIZE};

pub const MANIFEST_FILE_NAME: &str = ".kdz.params";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Position in payload-offset order.
    pub payload: usize,
    pub name:    String,
    /// Position of the header record in scan order.
    pub header:  usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub source:     String,
    pub version:    u8,
    pub data_start: u64,
    pub entries:    Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(source: &str, version: KdzVersion, data_start: u64, partitions: &[PartitionRecord]) -> Self {
        let mut by_offset: Vec<(usize, &PartitionRecord)> = partitions.iter().enumerate().collect();
        // Stable: equal offsets keep scan order.
        by_offset.sort_by_key(|(_, p)| p.offset);

        let entries = by_offset
            .into_iter()
            .enumerate()
            .map(|(payload, (header, p))| ManifestEntry { payload, name: p.name.clone(), header })
            .collect();

        Self { source: source.to_owned(), version: version.id(), data_start, entries }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the manifest into `dir`, returning its path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE_NAME);
        fs::write(&path, self.render())?;
        Ok(path)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# saved parameters from the file \"{}\"", self.source)?;
        writeln!(f, "version={}", self.version)?;
        writeln!(f, "# dataStart only has to leave room for the header records: 8 bytes of")?;
        writeln!(f, "# magic, {RECORD_SIZE} bytes per record and the terminator bytes. A")?;
        writeln!(f, "# smaller value still repacks, just not byte-identical to the source.")?;
        writeln!(f, "dataStart={}", self.data_start)?;
        writeln!(f, "# embedded files")?;
        for e in &self.entries {
            writeln!(f, "payload{}={}", e.payload, e.name)?;
            writeln!(f, "payload{}head={}", e.payload, e.header)?;
        }
        Ok(())
    }
}
