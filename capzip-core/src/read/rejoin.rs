use crate::error::{CapzipError, Result};
use crate::util::hash_forward::HashingForward;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use zip::ZipArchive;

#[derive(Clone, Debug)]
pub struct RejoinReport {
    pub parts: usize,
    pub bytes: u64,
    pub digest: [u8; 32],
}

/// Trailing decimal index of a part entry name (`output.zip012` -> 12).
pub fn part_index(name: &str) -> Option<u32> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits < 3 {
        return None;
    }
    name[name.len() - digits..].parse().ok()
}

/// Concatenate the parts stored in a final container back into `dest`.
pub fn rejoin(final_archive: &Path, dest: &Path) -> Result<RejoinReport> {
    let zerr = |e: zip::result::ZipError| {
        CapzipError::Format(format!("{}: {e}", final_archive.display()))
    };
    let mut zr = ZipArchive::new(BufReader::new(File::open(final_archive)?)).map_err(zerr)?;

    let mut order = Vec::with_capacity(zr.len());
    for i in 0..zr.len() {
        let name = zr.by_index(i).map_err(zerr)?.name().to_string();
        let idx = part_index(&name)
            .ok_or_else(|| CapzipError::Format(format!("entry {name:?} is not a numbered part")))?;
        order.push((idx, i));
    }
    order.sort_unstable();
    for (expected, (idx, _)) in order.iter().enumerate() {
        if *idx as usize != expected {
            return Err(CapzipError::Format(format!(
                "part {expected:03} missing from {}",
                final_archive.display()
            )));
        }
    }

    let mut hasher = blake3::Hasher::new();
    let mut fwd = HashingForward::new(BufWriter::new(File::create(dest)?), &mut hasher);
    for (idx, i) in &order {
        let mut part = zr.by_index(*i).map_err(zerr)?;
        let n = std::io::copy(&mut part, &mut fwd)?;
        tracing::debug!(index = idx, bytes = n, "appended part");
    }
    fwd.flush()?;
    let bytes = fwd.written;
    drop(fwd);

    tracing::info!(parts = order.len(), bytes, "rejoined into {}", dest.display());
    Ok(RejoinReport {
        parts: order.len(),
        bytes,
        digest: *hasher.finalize().as_bytes(),
    })
}
