use std::path::{Path, PathBuf};
use zip::result::ZipError;

/// One file to place in a container under `name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub src: PathBuf,
    pub name: String,
}

/// Which path was being handled when a container write failed.
#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub source: ZipError,
}

impl WriteFailure {
    pub fn new(path: &Path, source: impl Into<ZipError>) -> Self {
        Self {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

pub trait ContainerWriter: Send + Sync {
    /// Write `entries` in order into a fresh container at `dest`; returns its byte length.
    fn write_container(&self, entries: &[Entry], dest: &Path) -> Result<u64, WriteFailure>;
}

pub mod deflate;
