//! Bounded-chunk payload copying.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{KdzError, Result};
use crate::record::PartitionRecord;

/// Default copy buffer: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Copy exactly `length` bytes starting at `offset` from `reader` to `sink`.
///
/// Returns the number of bytes written, always `length` on success.
pub fn copy_span<R, W>(reader: &mut R, offset: u64, length: u64, sink: &mut W, chunk_size: usize) -> Result<u64>
where
    R: Read + Seek,
    W: Write,
{
    reader.seek(SeekFrom::Start(offset))?;

    let chunk = chunk_size.max(1) as u64;
    let mut buf = vec![0u8; chunk.min(length) as usize];
    let mut copied = 0u64;

    while copied < length {
        let n = (length - copied).min(chunk) as usize;
        reader.read_exact(&mut buf[..n]).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => KdzError::TruncatedStream {
                offset,
                expected: length,
                actual:   copied,
            },
            _ => KdzError::Io(e),
        })?;
        sink.write_all(&buf[..n])?;
        copied += n as u64;
    }
    sink.flush()?;
    Ok(copied)
}

/// Copy one partition's payload to `sink`.
pub fn copy_payload<R, W>(reader: &mut R, record: &PartitionRecord, sink: &mut W, chunk_size: usize) -> Result<u64>
where
    R: Read + Seek,
    W: Write,
{
    copy_span(reader, record.offset, record.length, sink, chunk_size)
}

/// Resolve the output path for a partition name inside `dir`.
///
/// Names must be a single plain path component.
pub fn output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if unsafe_name {
        return Err(KdzError::UnsafeName(name.to_owned()));
    }
    Ok(dir.join(name))
}

/// Extract `record` from `reader` into `dir/<name>`.
///
/// The file is created (or truncated) before copying; a failed copy leaves
/// it in place.
pub fn extract_to_dir<R: Read + Seek>(
    reader:     &mut R,
    record:     &PartitionRecord,
    dir:        &Path,
    chunk_size: usize,
) -> Result<PathBuf> {
    let path = output_path(dir, &record.name)?;
    info!("Extracting {} to {}", record.name, path.display());
    let mut out = BufWriter::new(File::create(&path)?);
    copy_payload(reader, record, &mut out, chunk_size)?;
    Ok(path)
}
