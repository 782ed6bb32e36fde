pub mod fal;

pub use fal::{FalClient, GeneratedVideo, GenerationRequest, VideoService};
