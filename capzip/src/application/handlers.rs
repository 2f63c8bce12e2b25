use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use capzip_core::error::{CapzipError, Result};
use capzip_core::{
    ArchiveExt, ArchiveJob, ArchivePipeline, FallbackCeiling, FinalArchive, PipelineConfig,
    Repackager, SizeCeiling, SizeEnforcer, ZipContainerWriter, list, rejoin,
};
use tracing_subscriber::EnvFilter;

use crate::presentation::cli::FallbackArg;

pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let res = match log_file {
        Some(path) => {
            let f = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(f))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    res.map_err(|e| CapzipError::Format(format!("logging init: {e}")))
}

fn fallback_from(arg: FallbackArg) -> FallbackCeiling {
    match arg {
        FallbackArg::Unlimited => FallbackCeiling::Unlimited,
        FallbackArg::FourGib => FallbackCeiling::Default4GiB,
    }
}

pub fn handle_pack(
    inputs: Vec<PathBuf>,
    ext: String,
    max_size_kb: Option<String>,
    fallback: FallbackArg,
    work_dir: PathBuf,
    level: Option<i64>,
    deterministic: bool,
) -> Result<FinalArchive> {
    let config = PipelineConfig {
        work_dir,
        fallback_ceiling: fallback_from(fallback),
        compression_level: level,
        deterministic,
        ..Default::default()
    };
    let ceiling = match max_size_kb {
        Some(s) => SizeCeiling::parse_kib_or(&s, config.fallback_ceiling),
        None => config.fallback_ceiling.ceiling(),
    };
    let job = ArchiveJob::new(inputs, ArchiveExt::parse_or_default(&ext), ceiling);

    let writer = ZipContainerWriter::new(config.compression_level, config.deterministic);
    let repackager = Repackager::new(ZipContainerWriter::stored(config.deterministic));
    let mut pipeline = ArchivePipeline::new(writer, SizeEnforcer::new(), repackager, config);
    let fin = pipeline.run(&job)?;

    match &fin.split {
        Some(r) => tracing::info!(
            parts = r.parts.len(),
            packet = r.packet_size,
            total = r.container_len,
            "pack: {}",
            fin.path.display()
        ),
        None => tracing::info!(
            files = fin.stats.files,
            bytes = fin.stats.final_bytes,
            "pack: {}",
            fin.path.display()
        ),
    }
    Ok(fin)
}

pub fn handle_list(archive: PathBuf) -> Result<()> {
    list(&archive)
}

pub fn handle_join(archive: PathBuf, out: PathBuf) -> Result<()> {
    let report = rejoin(&archive, &out)?;
    tracing::info!(
        parts = report.parts,
        bytes = report.bytes,
        blake3 = %hex::encode(report.digest),
        "join: {} -> {}",
        archive.display(),
        out.display()
    );
    Ok(())
}
