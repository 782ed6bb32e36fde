use crate::config::VideoSettings;
use crate::error::{Result, VideoError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// External media-encoding tool, invoked with a complete argument list.
#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<()>;
}

/// The system `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaTool for Ffmpeg {
    async fn run(&self, args: &[String]) -> Result<()> {
        debug!("{} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                VideoError::Ffmpeg(format!(
                    "Failed to run {} (is it installed and on PATH?): {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Ffmpeg(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                tail(&stderr, 20)
            )));
        }

        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

fn scale_pad_filter(video: &VideoSettings) -> String {
    let (w, h) = (video.width, video.height);
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1"
    )
}

/// Loops a still image over a voiceover track for `duration` seconds,
/// letterboxed to the target resolution.
pub fn segment_args(
    image: &Path,
    audio: &Path,
    duration: f64,
    output: &Path,
    video: &VideoSettings,
) -> Vec<String> {
    vec![
        "-y".into(),
        "-loop".into(),
        "1".into(),
        "-i".into(),
        image.display().to_string(),
        "-i".into(),
        audio.display().to_string(),
        "-t".into(),
        duration.to_string(),
        "-r".into(),
        video.fps.to_string(),
        "-vf".into(),
        scale_pad_filter(video),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        video.audio_bitrate.clone(),
        "-ar".into(),
        video.audio_sample_rate.to_string(),
        "-ac".into(),
        "2".into(),
        output.display().to_string(),
    ]
}

/// Black frames, encoded like a scene segment so stream-copy concatenation
/// accepts it. `with_audio` adds a silent stereo track and must match whether
/// the scene segments carry audio.
pub fn filler_args(
    duration: f64,
    output: &Path,
    video: &VideoSettings,
    with_audio: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!(
            "color=c=black:s={}:r={}:d={}",
            video.resolution(),
            video.fps,
            duration
        ),
    ];
    if with_audio {
        args.extend([
            "-f".into(),
            "lavfi".into(),
            "-i".into(),
            format!("anullsrc=r={}:cl=stereo", video.audio_sample_rate),
        ]);
    }
    args.extend([
        "-t".into(),
        duration.to_string(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]);
    if with_audio {
        args.extend([
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            video.audio_bitrate.clone(),
        ]);
    }
    args.push(output.display().to_string());
    args
}

/// Stream-copy concatenation over a concat demuxer list.
pub fn concat_args(list: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.display().to_string(),
        "-c".into(),
        "copy".into(),
        output.display().to_string(),
    ]
}
