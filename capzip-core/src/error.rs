use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline step an error belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Build,
    Split,
    Repackage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Build => "build",
            Stage::Split => "split",
            Stage::Repackage => "repackage",
        })
    }
}

#[derive(Error, Debug)]
pub enum CapzipError {
    #[error("build: source not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("build: source is not a regular file: {}", .path.display())]
    NotAFile { path: PathBuf },

    #[error("invalid size ceiling {input:?}: {reason}")]
    InvalidSizeCeiling { input: String, reason: String },

    #[error("build: failed on {}: {source}", .path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("split: failed writing {}: {source}", .path.display())]
    PartWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("repackage: failed on {}: {source}", .path.display())]
    Repackage {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

impl CapzipError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CapzipError::SourceNotFound { .. }
            | CapzipError::NotAFile { .. }
            | CapzipError::Build { .. } => Some(Stage::Build),
            CapzipError::PartWrite { .. } => Some(Stage::Split),
            CapzipError::Repackage { .. } => Some(Stage::Repackage),
            _ => None,
        }
    }

    /// The filesystem path implicated by the failure, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CapzipError::SourceNotFound { path }
            | CapzipError::NotAFile { path }
            | CapzipError::Build { path, .. }
            | CapzipError::PartWrite { path, .. }
            | CapzipError::Repackage { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, CapzipError>;
