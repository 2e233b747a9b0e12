pub mod error;
pub mod format;
pub mod record;
pub mod scanner;
pub mod reconcile;
pub mod extract;
pub mod manifest;
pub mod reader;
pub mod archive;
pub mod parallel;

pub use error::{KdzError, Result};
pub use format::KdzVersion;
pub use record::PartitionRecord;
pub use reader::KdzReader;
pub use archive::{ExtractOptions, KdzArchive};
pub use manifest::Manifest;
