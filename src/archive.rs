//! High-level [`KdzArchive`] API over a file on disk.
//!
//! ```no_run
//! use kdzkit::archive::{ExtractOptions, KdzArchive};
//!
//! let mut kdz = KdzArchive::open("firmware.kdz")?;
//! for (i, p) in kdz.list().iter().enumerate() {
//!     println!("{i:2} : {} ({} bytes)", p.name, p.length);
//! }
//! kdz.extract_all(&ExtractOptions::default())?;
//! # Ok::<(), kdzkit::KdzError>(())
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::extract::DEFAULT_CHUNK_SIZE;
use crate::format::KdzVersion;
use crate::manifest::Manifest;
use crate::reader::KdzReader;
use crate::reconcile::ContainerMetadata;
use crate::record::PartitionRecord;

pub const DEFAULT_OUTPUT_DIR: &str = "kdzextracted";
pub const EXTRAS_FILE_NAME: &str = "kdz_extras.bin";

// ── ExtractOptions ────────────────────────────────────────────────────────────

/// Configuration for extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub output_dir:     PathBuf,
    pub chunk_size:     usize,
    /// Write `kdz_extras.bin` on full extraction when extra data exists.
    pub write_extras:   bool,
    /// Write `.kdz.params` on full extraction.
    pub write_manifest: bool,
    /// Extract with one read handle per partition (feature `parallel`).
    pub parallel:       bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir:     PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunk_size:     DEFAULT_CHUNK_SIZE,
            write_extras:   true,
            write_manifest: true,
            parallel:       false,
        }
    }
}

// ── ExtractSummary ────────────────────────────────────────────────────────────

/// Files produced by [`KdzArchive::extract_all`].
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub payloads: Vec<PathBuf>,
    pub extras:   Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

// ── KdzArchive ────────────────────────────────────────────────────────────────

pub struct KdzArchive {
    path:   PathBuf,
    reader: KdzReader<BufReader<File>>,
}

impl KdzArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let reader = KdzReader::new(BufReader::new(File::open(&path)?))?;
        Ok(Self { path, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> KdzVersion {
        self.reader.version()
    }

    pub fn list(&self) -> &[PartitionRecord] {
        self.reader.partitions()
    }

    pub fn metadata(&self) -> &ContainerMetadata {
        self.reader.metadata()
    }

    pub fn reader(&self) -> &KdzReader<BufReader<File>> {
        &self.reader
    }

    /// Extract one partition into `opts.output_dir`, creating it if needed.
    ///
    /// The index is validated before anything touches the filesystem.
    pub fn extract_single(&mut self, index: usize, opts: &ExtractOptions) -> Result<PathBuf> {
        self.reader.partition(index)?;
        fs::create_dir_all(&opts.output_dir)?;
        self.reader.set_chunk_size(opts.chunk_size);
        self.reader.extract_to_dir(index, &opts.output_dir)
    }

    /// Extract every partition, then the extra data and the manifest.
    ///
    /// Stops at the first failing payload.  Files already written are left
    /// in place and neither extras nor manifest are written.
    pub fn extract_all(&mut self, opts: &ExtractOptions) -> Result<ExtractSummary> {
        fs::create_dir_all(&opts.output_dir)?;
        let mut summary = ExtractSummary::default();

        if opts.parallel {
            summary.payloads = crate::parallel::extract_partitions(
                &self.path,
                self.reader.partitions(),
                &opts.output_dir,
                opts.chunk_size,
            )?;
        } else {
            self.reader.set_chunk_size(opts.chunk_size);
            for index in 0..self.reader.partitions().len() {
                summary.payloads.push(self.reader.extract_to_dir(index, &opts.output_dir)?);
            }
        }

        if opts.write_extras && self.reader.metadata().has_extra() {
            let path = opts.output_dir.join(EXTRAS_FILE_NAME);
            info!("Extracting extra data to {}", path.display());
            let mut out = BufWriter::new(File::create(&path)?);
            self.reader.extract_extra(&mut out)?;
            summary.extras = Some(path);
        }

        if opts.write_manifest {
            summary.manifest = Some(self.manifest().write_to(&opts.output_dir)?);
        }

        Ok(summary)
    }

    pub fn manifest(&self) -> Manifest {
        self.reader.manifest(&self.path.display().to_string())
    }
}
