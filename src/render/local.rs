use super::{RenderJob, RenderStrategy};
use crate::config::VideoSettings;
use crate::error::{Result, VideoError};
use crate::video::ffmpeg::{segment_args, MediaTool};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Encodes a scene from its rendered still image and voiceover track.
pub struct LocalEncode {
    tool: Arc<dyn MediaTool>,
    video: VideoSettings,
}

impl LocalEncode {
    pub fn new(tool: Arc<dyn MediaTool>, video: VideoSettings) -> Self {
        Self { tool, video }
    }
}

async fn require_input(scene: &str, path: &Path) -> Result<()> {
    if tokio::fs::metadata(path).await.is_err() {
        return Err(VideoError::InputMissing {
            scene: scene.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[async_trait]
impl RenderStrategy for LocalEncode {
    fn name(&self) -> &'static str {
        "local"
    }

    fn segments_have_audio(&self) -> bool {
        true
    }

    async fn render(&self, job: &RenderJob) -> Result<PathBuf> {
        require_input(&job.name, &job.image_path).await?;
        require_input(&job.name, &job.audio_path).await?;

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Encoding segment for scene {}: {}", job.scene_id, job.name);
        let args = segment_args(
            &job.image_path,
            &job.audio_path,
            job.duration,
            &job.output_path,
            &self.video,
        );
        self.tool.run(&args).await?;

        info!("Created segment: {}", job.output_path.display());
        Ok(job.output_path.clone())
    }
}
