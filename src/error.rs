use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Scene '{scene}' is missing input file: {}", path.display())]
    InputMissing { scene: String, path: PathBuf },

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Scene catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VideoError>;
