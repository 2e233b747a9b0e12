//! Open container handle over any seekable stream.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{KdzError, Result};
use crate::extract::{self, copy_payload, copy_span, DEFAULT_CHUNK_SIZE};
use crate::format::KdzVersion;
use crate::manifest::Manifest;
use crate::reconcile::{reconcile, ContainerMetadata};
use crate::record::PartitionRecord;
use crate::scanner::{scan_headers, Terminator};

/// A parsed KDZ container.
///
/// The partition list and metadata are fixed at open time.  Every
/// extraction seeks the single underlying stream, so calls take `&mut self`.
pub struct KdzReader<R: Read + Seek> {
    reader:     R,
    version:    KdzVersion,
    partitions: Vec<PartitionRecord>,
    metadata:   ContainerMetadata,
    terminator: Terminator,
    chunk_size: usize,
}

impl<R: Read + Seek> KdzReader<R> {
    /// Detect the variant, scan every header record and inspect the gap
    /// before the first payload.  Any structural problem fails the open.
    pub fn new(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let version = KdzVersion::read(&mut reader)?;
        debug!(%version, "detected container variant");

        let scan = scan_headers(&mut reader)?;
        let metadata = reconcile(&mut reader, scan.header_end, scan.data_start)?;

        Ok(Self {
            reader,
            version,
            partitions: scan.partitions,
            metadata,
            terminator: scan.terminator,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.set_chunk_size(chunk_size);
        self
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    pub fn version(&self) -> KdzVersion {
        self.version
    }

    pub fn partitions(&self) -> &[PartitionRecord] {
        &self.partitions
    }

    pub fn metadata(&self) -> &ContainerMetadata {
        &self.metadata
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    pub fn partition(&self, index: usize) -> Result<&PartitionRecord> {
        self.partitions.get(index).ok_or(KdzError::IndexOutOfRange {
            index,
            count: self.partitions.len(),
        })
    }

    /// Copy partition `index` to `sink`; returns the byte count.
    pub fn extract_partition<W: Write>(&mut self, index: usize, sink: &mut W) -> Result<u64> {
        let record = self.partition(index)?.clone();
        copy_payload(&mut self.reader, &record, sink, self.chunk_size)
    }

    /// Extract partition `index` into `dir/<name>`.
    pub fn extract_to_dir(&mut self, index: usize, dir: &Path) -> Result<PathBuf> {
        let record = self.partition(index)?.clone();
        extract::extract_to_dir(&mut self.reader, &record, dir, self.chunk_size)
    }

    /// Copy the extra-data span verbatim.  Writes nothing when the gap was
    /// all zero.
    pub fn extract_extra<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        match self.metadata.extra {
            Some(span) => copy_span(&mut self.reader, span.start, span.len(), sink, self.chunk_size),
            None => Ok(0),
        }
    }

    pub fn manifest(&self, source: &str) -> Manifest {
        Manifest::new(source, self.version, self.metadata.data_start, &self.partitions)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
