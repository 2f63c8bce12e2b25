use crate::domain::{ArchivePart, SplitReport};
use crate::error::{CapzipError, Result};
use crate::policy::SizeCeiling;
use crate::util::hash_forward::HashingForward;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// `(offset, len)` windows covering `total` bytes in `packet`-sized steps.
pub fn plan_parts(total: u64, packet: u64) -> Vec<(u64, u64)> {
    assert!(packet > 0, "packet size must be positive");
    let mut spans = Vec::with_capacity(total.div_ceil(packet) as usize);
    let mut off = 0u64;
    while off < total {
        let len = packet.min(total - off);
        spans.push((off, len));
        off += len;
    }
    spans
}

/// `<container><index:03>`, e.g. `output.zip007`.
pub fn part_path(container: &Path, index: u32) -> PathBuf {
    let mut name = container
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!("{index:03}"));
    container.with_file_name(name)
}

/// Splits an oversize container into numbered parts.
#[derive(Clone, Debug, Default)]
pub struct SizeEnforcer {
    buf_size: Option<usize>,
}

impl SizeEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    /// IO buffer used for copying windows; defaults to 64 KiB.
    pub fn with_buffer(buf_size: usize) -> Self {
        Self {
            buf_size: Some(buf_size.max(1)),
        }
    }

    /// No-op unless the container is strictly larger than `ceiling`. On split, the
    /// original container is removed once every part is on disk.
    pub fn enforce(&self, container: &Path, ceiling: SizeCeiling) -> Result<Option<SplitReport>> {
        let total = fs::metadata(container)?.len();
        let packet = match ceiling.bytes() {
            Some(c) if total > c => c,
            _ => {
                tracing::info!(size = total, ?ceiling, "container within ceiling");
                return Ok(None);
            }
        };
        tracing::info!(size = total, packet, "container exceeds ceiling, splitting");

        let report = self.split(container, total, packet)?;
        fs::remove_file(container)?;
        tracing::info!(
            parts = report.parts.len(),
            "removed {}",
            container.display()
        );
        Ok(Some(report))
    }

    fn split(&self, container: &Path, total: u64, packet: u64) -> Result<SplitReport> {
        let cap = self.buf_size.unwrap_or(1 << 16);
        let mut reader = BufReader::with_capacity(cap, File::open(container)?);
        let mut hasher = blake3::Hasher::new();
        let mut parts = Vec::new();

        for (i, (offset, len)) in plan_parts(total, packet).into_iter().enumerate() {
            let index = u32::try_from(i).map_err(|_| {
                CapzipError::Format(format!("too many parts for {}", container.display()))
            })?;
            let path = part_path(container, index);
            write_part(&mut reader, &path, len, &mut hasher)
                .map_err(|source| CapzipError::PartWrite {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(index, offset, len, "created {}", path.display());
            parts.push(ArchivePart {
                index,
                path,
                offset,
                len,
            });
        }

        Ok(SplitReport {
            container_len: total,
            packet_size: packet,
            parts,
            digest: *hasher.finalize().as_bytes(),
        })
    }
}

fn write_part<R: Read>(
    reader: &mut R,
    path: &Path,
    len: u64,
    hasher: &mut blake3::Hasher,
) -> std::io::Result<()> {
    let out = BufWriter::new(File::create(path)?);
    let mut fwd = HashingForward::new(out, hasher);
    let copied = std::io::copy(&mut reader.take(len), &mut fwd)?;
    if copied != len {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("container ended after {copied} of {len} bytes"),
        ));
    }
    fwd.flush()?;
    let file = fwd.into_inner().into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}
