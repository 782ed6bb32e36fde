//! Manifests derived from the scene catalog.
//!
//! Three JSON files are written under the production root: image prompts and
//! audio scripts for the upstream generation steps, and the video timeline
//! that drives rendering and concatenation. Every `output_path`, `image_path`
//! and `audio_path` they contain is relative to that root.

mod paths;
mod scripts;

pub use paths::*;
pub use scripts::{merge_script, segment_script};

use crate::config::{ProductionConfig, VideoSettings};
use crate::error::Result;
use crate::scene::SceneCatalog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePromptEntry {
    pub scene_id: u32,
    pub name: String,
    /// Visual description followed by the style suffix
    pub prompt: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioScriptEntry {
    pub scene_id: u32,
    pub name: String,
    pub text: String,
    pub tone_direction: String,
    pub duration: f64,
    pub output_path: PathBuf,
}

/// A scene placed on the timeline. Paths are relative to the production root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub scene_id: u32,
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    pub end_time: f64,
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Computed length including spacing
    pub total_duration: f64,
    /// Declared length; not enforced
    pub target_duration: f64,
    pub spacing_seconds: f64,
    pub fps: u32,
    pub resolution: String,
    pub scenes: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

pub struct ManifestEmitter {
    layout: ProductionLayout,
    style_suffix: String,
    video: VideoSettings,
    target_duration: f64,
    final_name: String,
}

impl ManifestEmitter {
    pub fn new(config: &ProductionConfig) -> Self {
        Self {
            layout: ProductionLayout::new(&config.root),
            style_suffix: config.style_suffix.clone(),
            video: config.video.clone(),
            target_duration: config.target_duration,
            final_name: config.final_name.clone(),
        }
    }

    pub fn layout(&self) -> &ProductionLayout {
        &self.layout
    }

    /// Creates the production directory tree.
    pub async fn prepare(&self) -> Result<()> {
        for dir in self.layout.directories() {
            tokio::fs::create_dir_all(&dir).await?;
        }
        info!("Directory structure ready under {}", self.layout.root().display());
        Ok(())
    }

    pub fn image_prompts(&self, catalog: &SceneCatalog) -> Vec<ImagePromptEntry> {
        catalog
            .iter()
            .map(|scene| ImagePromptEntry {
                scene_id: scene.id,
                name: scene.name.clone(),
                prompt: compose_prompt(&scene.visual_description, &self.style_suffix),
                output_path: ProductionLayout::image_path(scene),
            })
            .collect()
    }

    pub fn audio_scripts(&self, catalog: &SceneCatalog) -> Vec<AudioScriptEntry> {
        catalog
            .iter()
            .map(|scene| AudioScriptEntry {
                scene_id: scene.id,
                name: scene.name.clone(),
                text: scene.voiceover_text.clone(),
                tone_direction: scene.tone_notes.clone(),
                duration: scene.duration,
                output_path: ProductionLayout::audio_path(scene),
            })
            .collect()
    }

    pub fn timeline(&self, catalog: &SceneCatalog, spacing_seconds: f64) -> Timeline {
        let scenes = catalog
            .iter()
            .zip(catalog.start_times(spacing_seconds))
            .map(|(scene, start_time)| TimelineEntry {
                scene_id: scene.id,
                name: scene.name.clone(),
                start_time,
                duration: scene.duration,
                end_time: start_time + scene.duration,
                image_path: ProductionLayout::image_path(scene),
                audio_path: ProductionLayout::audio_path(scene),
                output_path: ProductionLayout::segment_path(scene),
            })
            .collect();

        Timeline {
            total_duration: catalog.total_duration(spacing_seconds),
            target_duration: self.target_duration,
            spacing_seconds,
            fps: self.video.fps,
            resolution: self.video.resolution(),
            scenes,
        }
    }

    pub async fn emit_image_prompts(
        &self,
        catalog: &SceneCatalog,
    ) -> Result<Vec<ImagePromptEntry>> {
        let entries = self.image_prompts(catalog);
        let path = self.layout.manifest(IMAGE_PROMPTS_FILE);
        write_json(&path, &entries).await?;
        info!("Image prompts saved to {}", path.display());
        Ok(entries)
    }

    pub async fn emit_audio_scripts(
        &self,
        catalog: &SceneCatalog,
    ) -> Result<Vec<AudioScriptEntry>> {
        let entries = self.audio_scripts(catalog);
        let path = self.layout.manifest(AUDIO_SCRIPTS_FILE);
        write_json(&path, &entries).await?;
        info!("Audio scripts saved to {}", path.display());
        Ok(entries)
    }

    pub async fn emit_timeline(
        &self,
        catalog: &SceneCatalog,
        spacing_seconds: f64,
    ) -> Result<Timeline> {
        for (id, declared, computed) in catalog.timing_drift(spacing_seconds) {
            warn!(
                "Scene {} declares start {}s but the timeline places it at {}s",
                id, declared, computed
            );
        }

        let timeline = self.timeline(catalog, spacing_seconds);
        if (timeline.total_duration - timeline.target_duration).abs() > f64::EPSILON {
            info!(
                "Timeline runs {}s (declared target {}s)",
                timeline.total_duration, timeline.target_duration
            );
        }

        let path = self.layout.manifest(TIMELINE_FILE);
        write_json(&path, &timeline).await?;
        info!("Video timeline saved to {}", path.display());
        Ok(timeline)
    }

    /// Writes `create-segments.sh` and `merge-segments.sh` for running the
    /// local encode by hand.
    pub async fn emit_shell_scripts(&self, timeline: &Timeline) -> Result<Vec<PathBuf>> {
        let segment = self.layout.manifest(SEGMENT_SCRIPT_FILE);
        let merge = self.layout.manifest(MERGE_SCRIPT_FILE);

        write_executable(&segment, &segment_script(timeline, &self.video)).await?;
        write_executable(&merge, &merge_script(timeline, &self.video, &self.final_name)).await?;

        info!("FFmpeg scripts written: {}, {}", segment.display(), merge.display());
        Ok(vec![segment, merge])
    }

    /// Directory tree, the three manifests and both shell scripts, in that
    /// order. Stops at the first failure.
    pub async fn emit_all(&self, catalog: &SceneCatalog, spacing_seconds: f64) -> Result<Timeline> {
        self.prepare().await?;
        self.emit_image_prompts(catalog).await?;
        self.emit_audio_scripts(catalog).await?;
        let timeline = self.emit_timeline(catalog, spacing_seconds).await?;
        self.emit_shell_scripts(&timeline).await?;
        Ok(timeline)
    }
}

pub fn compose_prompt(description: &str, style_suffix: &str) -> String {
    let description = description.trim();
    if style_suffix.is_empty() {
        description.to_string()
    } else {
        format!("{} {}", description, style_suffix)
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path).await?;
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    tokio::fs::write(path, json).await?;
    Ok(())
}

async fn write_executable(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, contents).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    }

    Ok(())
}
