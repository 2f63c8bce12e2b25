use crate::domain::EntryRow;
use crate::error::{CapzipError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

pub fn list_entries(container: &Path) -> Result<Vec<EntryRow>> {
    let f = File::open(container)?;
    let mut zr = ZipArchive::new(BufReader::new(f))
        .map_err(|e| CapzipError::Format(format!("{}: {e}", container.display())))?;
    let mut rows = Vec::with_capacity(zr.len());
    for i in 0..zr.len() {
        let e = zr
            .by_index(i)
            .map_err(|e| CapzipError::Format(format!("entry #{i}: {e}")))?;
        rows.push(EntryRow {
            name: e.name().to_string(),
            u_size: e.size(),
            c_size: e.compressed_size(),
        });
    }
    Ok(rows)
}

pub fn list(container: &Path) -> Result<()> {
    for row in list_entries(container)? {
        println!("{}  {} bytes  packed={}", row.name, row.u_size, row.c_size);
    }
    Ok(())
}
