//! Multi-partition extraction with one read handle per partition.
//!
//! Payloads never overlap the header region and are only read, so each
//! worker opens its own handle on the container and seeks independently.
//! With the `parallel` feature the work runs on Rayon's global pool;
//! without it the same calls run in sequence.  Containers that repeat a
//! partition name are always extracted in sequence so the last record
//! wins the shared output file.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::extract::extract_to_dir;
use crate::record::PartitionRecord;
use tracing::warn;

fn extract_one(source: &Path, record: &PartitionRecord, dir: &Path, chunk_size: usize) -> Result<PathBuf> {
    let mut reader = BufReader::new(File::open(source)?);
    extract_to_dir(&mut reader, record, dir, chunk_size)
}

/// Extract `partitions` from the container at `source` into `dir`.
///
/// Output paths come back in partition order.  If any partition fails the
/// first error is returned; partitions already written stay on disk.
pub fn extract_partitions(
    source:     &Path,
    partitions: &[PartitionRecord],
    dir:        &Path,
    chunk_size: usize,
) -> Result<Vec<PathBuf>> {
    if has_duplicate_names(partitions) {
        warn!("partition names repeat, extracting sequentially");
        return extract_sequential(source, partitions, dir, chunk_size);
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        partitions
            .par_iter()
            .map(|record| extract_one(source, record, dir, chunk_size))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        extract_sequential(source, partitions, dir, chunk_size)
    }
}

fn extract_sequential(
    source:     &Path,
    partitions: &[PartitionRecord],
    dir:        &Path,
    chunk_size: usize,
) -> Result<Vec<PathBuf>> {
    partitions
        .iter()
        .map(|record| extract_one(source, record, dir, chunk_size))
        .collect()
}

fn has_duplicate_names(partitions: &[PartitionRecord]) -> bool {
    let mut seen = HashSet::with_capacity(partitions.len());
    partitions.iter().any(|p| !seen.insert(p.name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extracts_independent_spans() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("blob.bin");
        let data: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        fs::write(&source, &data).unwrap();

        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();
        let parts = vec![
            PartitionRecord { name: "hi".into(), length: 1000, offset: 3000, malformed_name: false },
            PartitionRecord { name: "lo".into(), length: 10, offset: 0, malformed_name: false },
        ];

        let paths = extract_partitions(&source, &parts, &out, 64).unwrap();
        assert_eq!(paths, vec![out.join("hi"), out.join("lo")]);
        assert_eq!(fs::read(out.join("hi")).unwrap(), &data[3000..4000]);
        assert_eq!(fs::read(out.join("lo")).unwrap(), &data[..10]);
    }

    #[test]
    fn repeated_name_keeps_last_record() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("blob.bin");
        let data: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        fs::write(&source, &data).unwrap();

        let out = tmp.path().join("out");
        fs::create_dir(&out).unwrap();
        let parts: Vec<_> = (0..8u64)
            .map(|i| PartitionRecord { name: "same".into(), length: 300 - i * 10, offset: i * 400, malformed_name: false })
            .collect();
        assert!(has_duplicate_names(&parts));
        assert!(!has_duplicate_names(&parts[..1]));

        let paths = extract_partitions(&source, &parts, &out, 32).unwrap();
        assert_eq!(paths.len(), 8);
        assert_eq!(fs::read(out.join("same")).unwrap(), &data[2800..3030]);
    }
}
