// capzip_core/src/domain.rs
use crate::policy::{ArchiveExt, SizeCeiling};
use crate::stats::Stats;
use std::path::{Path, PathBuf};

/// One pipeline invocation. Immutable once built.
#[derive(Clone, Debug)]
pub struct ArchiveJob {
    source_paths: Vec<PathBuf>,
    extension: ArchiveExt,
    ceiling: SizeCeiling,
}

impl ArchiveJob {
    pub fn new(source_paths: Vec<PathBuf>, extension: ArchiveExt, ceiling: SizeCeiling) -> Self {
        Self {
            source_paths,
            extension,
            ceiling,
        }
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn extension(&self) -> ArchiveExt {
        self.extension
    }

    pub fn ceiling(&self) -> SizeCeiling {
        self.ceiling
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivePart {
    pub index: u32,
    pub path: PathBuf,
    pub offset: u64,
    pub len: u64,
}

impl ArchivePart {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

#[derive(Clone, Debug)]
pub struct SplitReport {
    pub container_len: u64,
    pub packet_size: u64,
    pub parts: Vec<ArchivePart>,
    /// blake3 of the container bytes that were split.
    pub digest: [u8; 32],
}

#[derive(Clone, Debug)]
pub struct FinalArchive {
    pub path: PathBuf,
    pub split: Option<SplitReport>,
    pub stats: Stats,
}

impl FinalArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn was_split(&self) -> bool {
        self.split.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct EntryRow {
    pub name: String,
    pub u_size: u64,
    pub c_size: u64,
}
