use crate::codec::{ContainerWriter, Entry, WriteFailure};
use crate::error::{CapzipError, Result};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use zip::result::ZipError;

/// Entry name for a source path: normal components only, `/`-joined.
pub fn entry_name(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// `dir/name.ext` -> `dir/name~n.ext`; the suffix goes on the last component only.
fn with_suffix(name: &str, n: usize) -> String {
    let (dir, file) = match name.rfind('/') {
        Some(i) => name.split_at(i + 1),
        None => ("", name),
    };
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{dir}{}~{n}{}", &file[..dot], &file[dot..]),
        _ => format!("{dir}{file}~{n}"),
    }
}

/// Entry names for `sources`, in order. Paths that flatten to the same name
/// (`a.txt` and `../a.txt`, or one path listed twice) get `~1`, `~2`, ... suffixes.
pub fn unique_entry_names(sources: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::with_capacity(sources.len());
    let mut names = Vec::with_capacity(sources.len());
    for src in sources {
        let base = entry_name(src);
        let mut name = base.clone();
        let mut n = 0;
        while !taken.insert(name.clone()) {
            n += 1;
            name = with_suffix(&base, n);
        }
        if n > 0 {
            tracing::warn!(path = %src.display(), entry = %name, "entry name taken, renamed");
        }
        names.push(name);
    }
    names
}

/// Check every source up front so a bad path never leaves a container behind.
pub fn verify_sources(sources: &[PathBuf]) -> Result<()> {
    for src in sources {
        match fs::metadata(src) {
            Ok(md) if md.is_file() => {}
            Ok(_) => return Err(CapzipError::NotAFile { path: src.clone() }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!(path = %src.display(), "source not found");
                return Err(CapzipError::SourceNotFound { path: src.clone() });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Compress `sources` into a single container at `dest`. Returns the container length.
pub fn build_container<W: ContainerWriter + ?Sized>(
    writer: &W,
    sources: &[PathBuf],
    dest: &Path,
) -> Result<u64> {
    verify_sources(sources)?;

    let entries: Vec<Entry> = sources
        .iter()
        .zip(unique_entry_names(sources))
        .map(|(src, name)| Entry {
            src: src.clone(),
            name,
        })
        .collect();

    let len = writer
        .write_container(&entries, dest)
        .map_err(|f| build_error(f, dest))?;

    for e in &entries {
        tracing::info!(file = %e.name, "added to {}", dest.display());
    }
    Ok(len)
}

fn build_error(f: WriteFailure, dest: &Path) -> CapzipError {
    // source vanished between verification and write
    let vanished = matches!(&f.source, ZipError::Io(e) if e.kind() == ErrorKind::NotFound);
    if vanished && f.path != dest {
        return CapzipError::SourceNotFound { path: f.path };
    }
    CapzipError::Build {
        path: f.path,
        source: f.source,
    }
}
