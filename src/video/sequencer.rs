use crate::config::VideoSettings;
use crate::error::{Result, VideoError};
use crate::manifest::{ProductionLayout, Timeline, CONCAT_LIST_FILE};
use crate::video::ffmpeg::{concat_args, filler_args, MediaTool};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Ordered segment references for the concat demuxer. Paths are relative to
/// the directory holding the list file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatManifest {
    pub entries: Vec<PathBuf>,
}

impl ConcatManifest {
    /// One entry per scene in timeline order, with the shared filler clip
    /// between consecutive scenes when `spacing_seconds > 0`.
    pub fn build(timeline: &Timeline, spacing_seconds: f64) -> Self {
        let filler =
            (spacing_seconds > 0.0).then(|| ProductionLayout::filler_path(spacing_seconds));

        let mut entries = Vec::with_capacity(timeline.len() * 2);
        for (i, scene) in timeline.scenes.iter().enumerate() {
            if i > 0 {
                if let Some(filler) = &filler {
                    entries.push(filler.clone());
                }
            }
            entries.push(scene.output_path.clone());
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concat demuxer syntax, one `file '...'` line per entry.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
            .collect()
    }

    /// Entries that do not exist under `base`.
    pub fn missing(&self, base: &Path) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|p| !base.join(p).is_file())
            .cloned()
            .collect()
    }
}

/// Orders rendered segments into the final cut.
pub struct Sequencer {
    layout: ProductionLayout,
    video: VideoSettings,
    tool: Arc<dyn MediaTool>,
    filler_audio: bool,
}

impl Sequencer {
    pub fn new(layout: ProductionLayout, video: VideoSettings, tool: Arc<dyn MediaTool>) -> Self {
        Self {
            layout,
            video,
            tool,
            filler_audio: true,
        }
    }

    /// Whether the filler clip gets a silent audio track. Set it to match the
    /// scene segments; defaults to `true`.
    pub fn with_filler_audio(mut self, filler_audio: bool) -> Self {
        self.filler_audio = filler_audio;
        self
    }

    /// Encodes the blank filler clip once; returns its root-relative path.
    pub async fn build_filler(&self, spacing_seconds: f64) -> Result<PathBuf> {
        let relative = ProductionLayout::filler_path(spacing_seconds);
        let output = self.layout.resolve(&relative);
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Creating {}s filler segment...", spacing_seconds);
        self.tool
            .run(&filler_args(spacing_seconds, &output, &self.video, self.filler_audio))
            .await?;
        Ok(relative)
    }

    pub fn build_concat_manifest(
        &self,
        timeline: &Timeline,
        spacing_seconds: f64,
    ) -> ConcatManifest {
        ConcatManifest::build(timeline, spacing_seconds)
    }

    pub async fn write_manifest(&self, manifest: &ConcatManifest) -> Result<PathBuf> {
        let path = self.layout.manifest(CONCAT_LIST_FILE);
        tokio::fs::write(&path, manifest.render()).await?;
        info!("Concat list saved to {} ({} entries)", path.display(), manifest.len());
        Ok(path)
    }

    /// Stream-copies every listed segment into `final_output`.
    pub async fn concatenate(&self, manifest_path: &Path, final_output: &Path) -> Result<()> {
        info!("Concatenating video segments...");
        if let Some(parent) = final_output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.tool.run(&concat_args(manifest_path, final_output)).await?;
        info!("Concatenated video: {}", final_output.display());
        Ok(())
    }

    /// Filler, concat list and final merge in one step. Returns the absolute
    /// path of the merged file.
    pub async fn assemble(&self, timeline: &Timeline, final_name: &str) -> Result<PathBuf> {
        let spacing = timeline.spacing_seconds;
        if spacing > 0.0 && timeline.len() > 1 {
            self.build_filler(spacing).await?;
        }

        let manifest = self.build_concat_manifest(timeline, spacing);
        if let Some(path) = manifest.missing(self.layout.root()).into_iter().next() {
            return Err(VideoError::InputMissing {
                scene: "concat".to_string(),
                path: self.layout.resolve(path),
            });
        }

        let manifest_path = self.write_manifest(&manifest).await?;
        let final_output = self.layout.resolve(ProductionLayout::final_path(final_name));
        self.concatenate(&manifest_path, &final_output).await?;
        Ok(final_output)
    }
}
