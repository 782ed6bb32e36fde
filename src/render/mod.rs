//! Per-scene rendering.
//!
//! A [`RenderStrategy`] turns one [`RenderJob`] into a video file. Two
//! strategies exist: [`LocalEncode`] (still image + voiceover through the
//! media tool) and [`RemoteGeneration`] (text-to-video service). Each job
//! gets exactly one attempt per run.

mod local;
mod remote;

pub use local::LocalEncode;
pub use remote::RemoteGeneration;

use crate::config::ProductionConfig;
use crate::error::Result;
use crate::manifest::{compose_prompt, ProductionLayout, Timeline};
use crate::scene::SceneCatalog;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Everything either strategy needs to produce one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    pub scene_id: u32,
    pub name: String,
    pub prompt: String,
    pub seed: u64,
    pub duration: f64,
    pub aspect_ratio: String,
    pub resolution: String,
    pub fps: u32,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

impl RenderJob {
    /// One job per timeline entry, in timeline order. Paths are resolved
    /// against the production root.
    pub fn plan(
        catalog: &SceneCatalog,
        timeline: &Timeline,
        config: &ProductionConfig,
    ) -> Vec<RenderJob> {
        let layout = ProductionLayout::new(&config.root);

        catalog
            .iter()
            .zip(&timeline.scenes)
            .map(|(scene, entry)| RenderJob {
                scene_id: entry.scene_id,
                name: entry.name.clone(),
                prompt: scene.video_prompt.clone().unwrap_or_else(|| {
                    compose_prompt(&scene.visual_description, &config.style_suffix)
                }),
                seed: config.seed,
                duration: entry.duration,
                aspect_ratio: config.video.aspect_ratio.clone(),
                resolution: config.video.resolution_label.clone(),
                fps: config.video.fps,
                image_path: layout.resolve(&entry.image_path),
                audio_path: layout.resolve(&entry.audio_path),
                output_path: layout.resolve(&entry.output_path),
            })
            .collect()
    }
}

/// Result of the single attempt made for a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Produced { scene_id: u32, name: String, path: PathBuf },
    NotProduced { scene_id: u32, name: String, reason: String },
}

impl RenderOutcome {
    pub fn from_result(job: &RenderJob, result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => RenderOutcome::Produced {
                scene_id: job.scene_id,
                name: job.name.clone(),
                path,
            },
            Err(e) => RenderOutcome::NotProduced {
                scene_id: job.scene_id,
                name: job.name.clone(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, RenderOutcome::Produced { .. })
    }

    pub fn scene_id(&self) -> u32 {
        match self {
            RenderOutcome::Produced { scene_id, .. }
            | RenderOutcome::NotProduced { scene_id, .. } => *scene_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RenderOutcome::Produced { name, .. } | RenderOutcome::NotProduced { name, .. } => name,
        }
    }

    /// Path of the produced file; `None` when the scene failed.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            RenderOutcome::Produced { path, .. } => Some(path),
            RenderOutcome::NotProduced { .. } => None,
        }
    }
}

/// Produces the video file for one scene.
#[async_trait]
pub trait RenderStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the segments this strategy writes carry an audio stream.
    /// Filler clips must match so stream-copy concatenation accepts them.
    fn segments_have_audio(&self) -> bool;

    async fn render(&self, job: &RenderJob) -> Result<PathBuf>;
}

/// Pacing between consecutive external submissions.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pause(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Throttle for NoDelay {
    async fn pause(&self) {}
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
