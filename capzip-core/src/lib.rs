#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod policy;
pub mod stats;

pub mod util {
    pub mod hash_forward;
}

pub mod codec;

pub mod pack {
    pub mod repackage;
    pub mod split;
    pub mod writer;
}

pub mod read {
    pub mod rejoin;
}

pub mod list;
pub mod pipeline;

// Re-exports: stable API surface
pub use codec::deflate::ZipContainerWriter;
pub use codec::{ContainerWriter, Entry};
pub use domain::{ArchiveJob, ArchivePart, FinalArchive, SplitReport};
pub use error::{CapzipError, Result, Stage};
pub use list::{list, list_entries};
pub use pack::repackage::Repackager;
pub use pack::split::{SizeEnforcer, plan_parts};
pub use pack::writer::build_container;
pub use pipeline::{ArchivePipeline, PipelineState};
pub use policy::{ArchiveExt, FallbackCeiling, PipelineConfig, SizeCeiling};
pub use read::rejoin::{RejoinReport, rejoin};
