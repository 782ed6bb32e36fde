//! Scene-driven promotional video production.
//!
//! A [`SceneCatalog`] is turned into image-prompt, audio-script and timeline
//! manifests, each scene is rendered once through a [`RenderStrategy`], and
//! the segments are merged with the media tool when every scene succeeded.

pub mod api;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod video;

pub use config::{ProductionConfig, VideoSettings};
pub use error::{Result, VideoError};
pub use manifest::{ManifestEmitter, Timeline, TimelineEntry};
pub use pipeline::{Pipeline, RunSummary};
pub use render::{
    FixedDelay, LocalEncode, NoDelay, RemoteGeneration, RenderJob, RenderOutcome, RenderStrategy,
    Throttle,
};
pub use scene::{Scene, SceneCatalog};
