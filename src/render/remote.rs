use super::{RenderJob, RenderStrategy};
use crate::api::{GenerationRequest, VideoService};
use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Generates a scene with the hosted text-to-video service and downloads the
/// result to the scene's output path.
pub struct RemoteGeneration {
    service: Arc<dyn VideoService>,
}

impl RemoteGeneration {
    pub fn new(service: Arc<dyn VideoService>) -> Self {
        Self { service }
    }

    pub fn request(job: &RenderJob) -> GenerationRequest {
        let seconds = job.duration.round().max(1.0) as u32;
        if (job.duration - seconds as f64).abs() > f64::EPSILON {
            warn!(
                "Scene {} duration {}s sent as {}s; the service takes whole seconds",
                job.scene_id, job.duration, seconds
            );
        }

        GenerationRequest {
            prompt: job.prompt.clone(),
            seed: job.seed,
            duration: seconds,
            aspect_ratio: job.aspect_ratio.clone(),
            resolution: job.resolution.clone(),
            fps: job.fps,
        }
    }
}

#[async_trait]
impl RenderStrategy for RemoteGeneration {
    fn name(&self) -> &'static str {
        "remote"
    }

    /// Generated clips are video-only.
    fn segments_have_audio(&self) -> bool {
        false
    }

    async fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        info!("Generating scene {}: {}", job.scene_id, job.name);
        let preview: String = job.prompt.chars().take(100).collect();
        info!("Prompt: {}...", preview);

        let request = Self::request(job);
        let video = self.service.generate(&request).await?;

        for note in video.deviations(&request) {
            warn!("Scene {} result deviates from request: {}", job.scene_id, note);
        }

        self.service.download(&video.url, &job.output_path).await?;
        info!("Scene {} saved: {}", job.scene_id, job.output_path.display());
        Ok(job.output_path.clone())
    }
}
