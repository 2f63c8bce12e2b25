use crate::codec::ContainerWriter;
use crate::codec::deflate::ZipContainerWriter;
use crate::domain::{ArchiveJob, FinalArchive};
use crate::error::{Result, Stage};
use crate::pack::repackage::Repackager;
use crate::pack::split::SizeEnforcer;
use crate::pack::writer::build_container;
use crate::policy::PipelineConfig;
use crate::stats::Stats;
use std::fs;
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Building,
    Splitting,
    Repackaging,
    Done,
    Failed { stage: Stage },
}

/// build -> enforce size -> repackage if split.
pub struct ArchivePipeline<W: ContainerWriter, R: ContainerWriter = ZipContainerWriter> {
    writer: W,
    enforcer: SizeEnforcer,
    repackager: Repackager<R>,
    config: PipelineConfig,
    state: PipelineState,
}

impl<W: ContainerWriter, R: ContainerWriter> ArchivePipeline<W, R> {
    pub fn new(
        writer: W,
        enforcer: SizeEnforcer,
        repackager: Repackager<R>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            writer,
            enforcer,
            repackager,
            config,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&mut self, job: &ArchiveJob) -> Result<FinalArchive> {
        let started = Instant::now();
        let res = self.run_stages(job);
        match &res {
            Ok(_) => self.state = PipelineState::Done,
            Err(e) => {
                // the stage we were in when it broke
                let stage = e.stage().unwrap_or(match self.state {
                    PipelineState::Splitting => Stage::Split,
                    PipelineState::Repackaging => Stage::Repackage,
                    _ => Stage::Build,
                });
                tracing::error!(%stage, error = %e, "pipeline failed");
                self.state = PipelineState::Failed { stage };
            }
        }
        res.map(|mut fin| {
            fin.stats.elapsed_ms = started.elapsed().as_millis() as u64;
            fin
        })
    }

    fn run_stages(&mut self, job: &ArchiveJob) -> Result<FinalArchive> {
        let ext = job.extension();
        let container = self.config.container_path(ext);

        self.state = PipelineState::Building;
        tracing::info!(
            files = job.source_paths().len(),
            %ext,
            ceiling = ?job.ceiling(),
            "building {}",
            container.display()
        );
        let container_len = build_container(&self.writer, job.source_paths(), &container)?;

        let mut stats = Stats {
            files: job.source_paths().len() as u64,
            container_bytes: container_len,
            ..Default::default()
        };
        for src in job.source_paths() {
            stats.logical_bytes += fs::metadata(src)?.len();
        }
        stats.compression_ratio = Stats::ratio(stats.logical_bytes, container_len);

        if !job.ceiling().exceeded_by(container_len) {
            stats.final_bytes = container_len;
            tracing::info!("archive ready: {}", container.display());
            return Ok(FinalArchive {
                path: container,
                split: None,
                stats,
            });
        }

        self.state = PipelineState::Splitting;
        let Some(report) = self.enforcer.enforce(&container, job.ceiling())? else {
            // container shrank on disk between build and split
            stats.final_bytes = container_len;
            return Ok(FinalArchive {
                path: container,
                split: None,
                stats,
            });
        };

        self.state = PipelineState::Repackaging;
        let final_path = self.config.final_path(ext);
        let final_len = self.repackager.repackage(&report.parts, &final_path)?;

        stats.parts = report.parts.len() as u64;
        stats.final_bytes = final_len;
        tracing::info!(parts = stats.parts, "archive ready: {}", final_path.display());
        Ok(FinalArchive {
            path: final_path,
            split: Some(report),
            stats,
        })
    }
}
