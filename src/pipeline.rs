use crate::config::ProductionConfig;
use crate::error::Result;
use crate::manifest::{ManifestEmitter, ProductionLayout, Timeline};
use crate::render::{NoDelay, RenderJob, RenderOutcome, RenderStrategy, Throttle};
use crate::scene::SceneCatalog;
use crate::video::{MediaTool, Sequencer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<RenderOutcome>,
    /// Set only when every scene was produced and the merge succeeded
    pub final_output: Option<PathBuf>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn produced(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_produced()).count()
    }

    pub fn failed(&self) -> Vec<&RenderOutcome> {
        self.outcomes.iter().filter(|o| !o.is_produced()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed().into_iter().map(|o| o.name()).collect()
    }

    pub fn all_produced(&self) -> bool {
        self.produced() == self.total()
    }

    pub fn is_complete(&self) -> bool {
        self.all_produced() && self.final_output.is_some()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generated {} out of {} scenes", self.produced(), self.total())?;
        let failed = self.failed_names();
        if !failed.is_empty() {
            write!(f, "; failed: {}", failed.join(", "))?;
        }
        if let Some(path) = &self.final_output {
            write!(f, "; final video: {}", path.display())?;
        }
        Ok(())
    }
}

/// Catalog → manifests → per-scene renders → final merge, strictly in order.
pub struct Pipeline {
    config: ProductionConfig,
    catalog: SceneCatalog,
    strategy: Box<dyn RenderStrategy>,
    throttle: Box<dyn Throttle>,
    tool: Arc<dyn MediaTool>,
}

impl Pipeline {
    pub fn new(
        config: ProductionConfig,
        catalog: SceneCatalog,
        strategy: Box<dyn RenderStrategy>,
        tool: Arc<dyn MediaTool>,
    ) -> Self {
        Self {
            config,
            catalog,
            strategy,
            throttle: Box::new(NoDelay),
            tool,
        }
    }

    /// Pause applied between consecutive scene renders.
    pub fn with_throttle(mut self, throttle: Box<dyn Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Writes the directory tree, the three manifests and the helper shell
    /// scripts. Any failure here is fatal.
    pub async fn emit_manifests(&self) -> Result<Timeline> {
        self.config.validate()?;
        ManifestEmitter::new(&self.config)
            .emit_all(&self.catalog, self.config.spacing_seconds)
            .await
    }

    /// One attempt per scene in catalog order. Failures are recorded, never
    /// propagated.
    pub async fn render_scenes(&self, timeline: &Timeline) -> Vec<RenderOutcome> {
        let jobs = RenderJob::plan(&self.catalog, timeline, &self.config);
        let count = jobs.len();
        let mut outcomes = Vec::with_capacity(count);

        for (idx, job) in jobs.iter().enumerate() {
            if idx > 0 {
                self.throttle.pause().await;
            }

            let result = self.strategy.render(job).await;
            if let Err(e) = &result {
                error!("Scene {} ({}) not produced: {}", job.scene_id, job.name, e);
            } else {
                info!("Scene {} done ({}/{})", job.scene_id, idx + 1, count);
            }
            outcomes.push(RenderOutcome::from_result(job, result));
        }

        outcomes
    }

    pub async fn run(&self) -> Result<RunSummary> {
        info!(
            "Starting production: {} scenes, {}s spacing, {} backend",
            self.catalog.len(),
            self.config.spacing_seconds,
            self.strategy.name()
        );

        let timeline = self.emit_manifests().await?;
        let outcomes = self.render_scenes(&timeline).await;

        let mut summary = RunSummary {
            outcomes,
            final_output: None,
        };
        info!("Generated {} out of {} scenes", summary.produced(), summary.total());

        if !summary.all_produced() {
            warn!(
                "Skipping final merge; failed scenes: {}",
                summary.failed_names().join(", ")
            );
            warn!("Re-run to retry; every output is overwritten");
            return Ok(summary);
        }

        let sequencer = Sequencer::new(
            ProductionLayout::new(&self.config.root),
            self.config.video.clone(),
            self.tool.clone(),
        )
        .with_filler_audio(self.strategy.segments_have_audio());

        let final_output = match sequencer.assemble(&timeline, &self.config.final_name).await {
            Ok(path) => path,
            Err(e) => {
                error!("Final merge failed: {}", e);
                error!("{}", summary);
                return Err(e);
            }
        };
        info!(
            "Final video created: {} (~{}s)",
            final_output.display(),
            timeline.total_duration
        );
        summary.final_output = Some(final_output);

        Ok(summary)
    }
}
