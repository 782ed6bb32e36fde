use crate::error::{Result, VideoError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

const BUNDLED_CATALOG: &str = include_str!("../../catalog/understand-me.json");

/// One timed unit of the production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Catalog position, starting at 1
    pub id: u32,
    /// Short identifier used in every derived file name
    pub name: String,
    /// Declared start time in seconds. The timeline always recomputes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    /// Length of the scene in seconds
    pub duration: f64,
    /// Narration; empty for purely visual scenes
    #[serde(default)]
    pub voiceover_text: String,
    /// Shot description used as the image prompt
    pub visual_description: String,
    /// Delivery guidance for the narrator
    #[serde(default)]
    pub tone_notes: String,
    /// Full shot prompt for text-to-video generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_prompt: Option<String>,
}

impl Scene {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        duration: f64,
        visual_description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            start_time: None,
            duration,
            voiceover_text: String::new(),
            visual_description: visual_description.into(),
            tone_notes: String::new(),
            video_prompt: None,
        }
    }

    pub fn with_voiceover(mut self, text: impl Into<String>, tone: impl Into<String>) -> Self {
        self.voiceover_text = text.into();
        self.tone_notes = tone.into();
        self
    }

    pub fn with_video_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.video_prompt = Some(prompt.into());
        self
    }

    /// Zero-padded id plus name, e.g. `03-dual_isolation`.
    pub fn slug(&self) -> String {
        format!("{:02}-{}", self.id, self.name)
    }
}

/// Immutable, ordered list of scenes for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCatalog {
    scenes: Vec<Scene>,
}

impl SceneCatalog {
    /// Builds a catalog ordered by id. Rejects empty catalogs, non-positive
    /// durations and duplicate ids or names.
    pub fn new(mut scenes: Vec<Scene>) -> Result<Self> {
        if scenes.is_empty() {
            return Err(VideoError::Catalog("catalog contains no scenes".to_string()));
        }

        scenes.sort_by_key(|s| s.id);

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for scene in &scenes {
            if scene.id == 0 {
                return Err(VideoError::Catalog(format!(
                    "scene '{}' has id 0; ids start at 1",
                    scene.name
                )));
            }
            if scene.name.trim().is_empty() {
                return Err(VideoError::Catalog(format!("scene {} has an empty name", scene.id)));
            }
            if !(scene.duration.is_finite() && scene.duration > 0.0) {
                return Err(VideoError::Catalog(format!(
                    "scene {} ('{}') has non-positive duration {}",
                    scene.id, scene.name, scene.duration
                )));
            }
            if !ids.insert(scene.id) {
                return Err(VideoError::Catalog(format!("duplicate scene id {}", scene.id)));
            }
            if !names.insert(scene.name.as_str()) {
                return Err(VideoError::Catalog(format!("duplicate scene name '{}'", scene.name)));
            }
        }

        for (pos, scene) in scenes.iter().enumerate() {
            let expected = pos as u32 + 1;
            if scene.id != expected {
                warn!(
                    "Scene ids are not contiguous: found id {} at position {}",
                    scene.id, expected
                );
                break;
            }
        }

        Ok(Self { scenes })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenes: Vec<Scene> = serde_json::from_str(json)
            .map_err(|e| VideoError::Catalog(format!("Failed to parse scene catalog: {}", e)))?;
        Self::new(scenes)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            VideoError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// The ten-scene Understand.me promotional catalog.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    /// Cumulative start time of every scene when `spacing` seconds separate
    /// consecutive scenes.
    pub fn start_times(&self, spacing: f64) -> Vec<f64> {
        let mut cursor = 0.0;
        self.scenes
            .iter()
            .map(|scene| {
                let start = cursor;
                cursor += scene.duration + spacing;
                start
            })
            .collect()
    }

    /// Sum of durations plus `spacing * (n - 1)`.
    pub fn total_duration(&self, spacing: f64) -> f64 {
        let scenes: f64 = self.scenes.iter().map(|s| s.duration).sum();
        let gaps = self.scenes.len().saturating_sub(1) as f64;
        scenes + spacing * gaps
    }

    /// Scenes whose declared start time disagrees with the computed one,
    /// as `(id, declared, computed)`.
    pub fn timing_drift(&self, spacing: f64) -> Vec<(u32, f64, f64)> {
        self.scenes
            .iter()
            .zip(self.start_times(spacing))
            .filter_map(|(scene, computed)| {
                let declared = scene.start_time?;
                ((declared - computed).abs() > 1e-6).then_some((scene.id, declared, computed))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a SceneCatalog {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}
