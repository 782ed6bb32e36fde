use crate::scene::Scene;
use std::path::{Path, PathBuf};

pub const IMAGE_PROMPTS_FILE: &str = "image-generation-prompts.json";
pub const AUDIO_SCRIPTS_FILE: &str = "audio-scripts.json";
pub const TIMELINE_FILE: &str = "video-timeline.json";
pub const CONCAT_LIST_FILE: &str = "concat-list.txt";
pub const SEGMENT_SCRIPT_FILE: &str = "create-segments.sh";
pub const MERGE_SCRIPT_FILE: &str = "merge-segments.sh";

/// Directory tree of one production. Per-scene paths are relative to the
/// root and depend only on the scene id and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionLayout {
    root: PathBuf,
}

impl ProductionLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directories created before anything is written.
    pub fn directories(&self) -> Vec<PathBuf> {
        [
            "images",
            "audio/voiceover",
            "audio/background",
            "video-segments",
            "spacing",
            "final",
        ]
        .iter()
        .map(|d| self.root.join(d))
        .collect()
    }

    pub fn image_path(scene: &Scene) -> PathBuf {
        PathBuf::from(format!("images/scene-{}.png", scene.slug()))
    }

    pub fn audio_path(scene: &Scene) -> PathBuf {
        PathBuf::from(format!("audio/voiceover/scene-{}.wav", scene.slug()))
    }

    pub fn segment_path(scene: &Scene) -> PathBuf {
        PathBuf::from(format!("video-segments/segment-{}.mp4", scene.slug()))
    }

    /// Filler clip shared by every gap of the given length.
    pub fn filler_path(spacing_seconds: f64) -> PathBuf {
        PathBuf::from(format!("spacing/black-{}sec.mp4", spacing_seconds))
    }

    pub fn final_path(final_name: &str) -> PathBuf {
        PathBuf::from(format!("final/{}.mp4", final_name))
    }

    /// Resolves a root-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn manifest(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}
