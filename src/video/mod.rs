pub mod ffmpeg;
pub mod sequencer;

pub use ffmpeg::{Ffmpeg, MediaTool};
pub use sequencer::{ConcatManifest, Sequencer};
