use crate::error::{Result, VideoError};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ROOT: &str = "understand-me-video";
pub const DEFAULT_MODEL: &str = "fal-ai/minimax/hailuo-02/pro/text-to-video";
pub const DEFAULT_STYLE_SUFFIX: &str =
    "Cinematic, therapeutic atmosphere, warm lighting, professional quality";
pub const DEFAULT_FINAL_NAME: &str = "understand-me-promotional-video-3min";

/// Output format shared by every segment, the filler and the final cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSettings {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// Aspect ratio label sent to the generation service.
    pub aspect_ratio: String,
    /// Resolution label sent to the generation service.
    pub resolution_label: String,
    pub audio_sample_rate: u32,
    pub audio_bitrate: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            width: 1920,
            height: 1080,
            aspect_ratio: "16:9".to_string(),
            resolution_label: "1080p".to_string(),
            audio_sample_rate: 44100,
            audio_bitrate: "192k".to_string(),
        }
    }
}

impl VideoSettings {
    /// `WIDTHxHEIGHT`, as written into the timeline and the lavfi color source.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Everything a production run needs besides the scene catalog.
#[derive(Debug, Clone)]
pub struct ProductionConfig {
    pub root: PathBuf,
    pub video: VideoSettings,
    /// Blank gap between consecutive scenes in the final cut; 0 disables it.
    pub spacing_seconds: f64,
    /// Declared length of the production. Informational only.
    pub target_duration: f64,
    pub style_suffix: String,
    pub final_name: String,
    pub seed: u64,
    pub model: String,
    pub request_delay: Duration,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            video: VideoSettings::default(),
            spacing_seconds: 8.0,
            target_duration: 180.0,
            style_suffix: DEFAULT_STYLE_SUFFIX.to_string(),
            final_name: DEFAULT_FINAL_NAME.to_string(),
            seed: 42,
            model: DEFAULT_MODEL.to_string(),
            request_delay: Duration::from_secs(5),
        }
    }
}

impl ProductionConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_spacing(mut self, spacing_seconds: f64) -> Self {
        self.spacing_seconds = spacing_seconds;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.video;
        if v.fps == 0 {
            return Err(VideoError::Config("fps must be non-zero".to_string()));
        }
        if v.width == 0 || v.height == 0 {
            return Err(VideoError::Config(
                "width/height must be non-zero".to_string(),
            ));
        }
        if v.width % 2 != 0 || v.height % 2 != 0 {
            // yuv420p output needs even dimensions
            return Err(VideoError::Config(format!(
                "width/height must be even, got {}",
                v.resolution()
            )));
        }
        if !self.spacing_seconds.is_finite() || self.spacing_seconds < 0.0 {
            return Err(VideoError::Config(format!(
                "spacing must be a non-negative number of seconds, got {}",
                self.spacing_seconds
            )));
        }
        if self.final_name.trim().is_empty() {
            return Err(VideoError::Config("final name must not be empty".to_string()));
        }
        Ok(())
    }
}
