use super::{ContainerWriter, Entry, WriteFailure};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use time::OffsetDateTime;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

/// Zip container writer; entries are deflated unless built with [`ZipContainerWriter::stored`].
#[derive(Clone, Debug)]
pub struct ZipContainerWriter {
    pub method: CompressionMethod,
    pub level: Option<i64>,
    /// When true, every entry gets the zip epoch as its timestamp.
    pub deterministic: bool,
}

impl Default for ZipContainerWriter {
    fn default() -> Self {
        Self::new(None, false)
    }
}

impl ZipContainerWriter {
    pub fn new(level: Option<i64>, deterministic: bool) -> Self {
        Self {
            method: CompressionMethod::Deflated,
            level,
            deterministic,
        }
    }

    /// No compression; used for payloads that are already compressed, like split parts.
    pub fn stored(deterministic: bool) -> Self {
        Self {
            method: CompressionMethod::Stored,
            level: None,
            deterministic,
        }
    }

    fn options_for(&self, md: &fs::Metadata) -> SimpleFileOptions {
        let mut opts = SimpleFileOptions::default()
            .compression_method(self.method)
            .compression_level(self.level)
            .last_modified_time(self.mtime_from(md))
            .large_file(md.len() >= u32::MAX as u64);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            opts = opts.unix_permissions(md.permissions().mode() & 0o7777);
        }
        opts
    }

    fn mtime_from(&self, md: &fs::Metadata) -> DateTime {
        if self.deterministic {
            return DateTime::default();
        }
        md.modified()
            .ok()
            .and_then(|t| DateTime::try_from(OffsetDateTime::from(t)).ok())
            .unwrap_or_default()
    }
}

impl ContainerWriter for ZipContainerWriter {
    fn write_container(&self, entries: &[Entry], dest: &Path) -> Result<u64, WriteFailure> {
        let out = File::create(dest).map_err(|e| WriteFailure::new(dest, e))?;
        let mut zw = ZipWriter::new(BufWriter::new(out));

        for entry in entries {
            let fail = |e: std::io::Error| WriteFailure::new(&entry.src, e);
            let src = File::open(&entry.src).map_err(fail)?;
            let md = src.metadata().map_err(fail)?;
            zw.start_file(entry.name.as_str(), self.options_for(&md))
                .map_err(|e| WriteFailure::new(&entry.src, e))?;
            let copied = std::io::copy(&mut BufReader::new(src), &mut zw).map_err(fail)?;
            tracing::debug!(entry = %entry.name, bytes = copied, "entry written");
        }

        let buf = zw.finish().map_err(|e| WriteFailure::new(dest, e))?;
        let file = buf
            .into_inner()
            .map_err(|e| WriteFailure::new(dest, e.into_error()))?;
        file.sync_all().map_err(|e| WriteFailure::new(dest, e))?;
        let len = file.metadata().map_err(|e| WriteFailure::new(dest, e))?.len();
        Ok(len)
    }
}
