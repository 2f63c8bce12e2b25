use crate::codec::{ContainerWriter, Entry};
use crate::domain::ArchivePart;
use crate::error::{CapzipError, Result};
use std::fs;
use std::path::Path;

/// Wraps split parts into the final deliverable container.
pub struct Repackager<W: ContainerWriter> {
    writer: W,
}

impl<W: ContainerWriter> Repackager<W> {
    /// Parts are already compressed, so [`ZipContainerWriter::stored`] is the usual writer.
    ///
    /// [`ZipContainerWriter::stored`]: crate::codec::deflate::ZipContainerWriter::stored
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Parts go in index order. Every part is deleted once the final container is
    /// complete; on failure all parts stay on disk.
    pub fn repackage(&self, parts: &[ArchivePart], dest: &Path) -> Result<u64> {
        let mut ordered: Vec<&ArchivePart> = parts.iter().collect();
        ordered.sort_by_key(|p| p.index);

        let entries: Vec<Entry> = ordered
            .iter()
            .map(|p| Entry {
                src: p.path.clone(),
                name: p
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
            .collect();

        tracing::info!(parts = entries.len(), "repackaging into {}", dest.display());
        let len = self
            .writer
            .write_container(&entries, dest)
            .map_err(|f| CapzipError::Repackage {
                path: f.path,
                source: f.source,
            })?;

        for p in ordered {
            fs::remove_file(&p.path).map_err(|e| CapzipError::Repackage {
                path: p.path.clone(),
                source: e.into(),
            })?;
            tracing::debug!("removed part {}", p.path.display());
        }
        Ok(len)
    }
}
