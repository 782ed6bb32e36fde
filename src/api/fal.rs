use crate::error::{Result, VideoError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const FAL_QUEUE_API: &str = "https://queue.fal.run";

/// Parameters of one text-to-video job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: u64,
    /// Whole seconds
    pub duration: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    pub fps: u32,
}

/// Finished job as reported by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedVideo {
    pub url: String,
    pub content_type: Option<String>,
    /// Seed echoed back by the service, if any
    pub seed: Option<u64>,
}

impl GeneratedVideo {
    /// Differences between what was asked for and what came back.
    pub fn deviations(&self, request: &GenerationRequest) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(seed) = self.seed {
            if seed != request.seed {
                notes.push(format!("requested seed {} but service used {}", request.seed, seed));
            }
        }
        if let Some(content_type) = &self.content_type {
            if !content_type.starts_with("video/") {
                notes.push(format!("unexpected content type '{}'", content_type));
            }
        }
        notes
    }
}

/// Hosted generative-video backend.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Submits the job and blocks until it finishes.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedVideo>;

    /// Fetches a finished video to `output_path`.
    async fn download(&self, url: &str, output_path: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FalClient {
    api_key: String,
    model: String,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
    status_url: Option<String>,
    response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    queue_position: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    video: Option<VideoFile>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    url: String,
    content_type: Option<String>,
}

impl FalClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(300)).build()?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: FAL_QUEUE_API.to_string(),
            poll_interval: Duration::from_secs(5),
            // 10 minutes at the default interval
            max_polls: 120,
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn auth(&self) -> String {
        format!("Key {}", self.api_key)
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResponse> {
        let url = format!("{}/{}", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::Api(format!(
                "Submission failed (HTTP {}): {}",
                status, error_text
            )));
        }

        Ok(response.json().await?)
    }

    async fn wait_for_completion(&self, status_url: &str) -> Result<()> {
        for i in 0..self.max_polls {
            let response = self
                .client
                .get(status_url)
                .header("Authorization", self.auth())
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await?;
                warn!("Failed to get job status (HTTP {}): {}", status, error_text);
            } else {
                let job: StatusResponse = response.json().await?;
                match job.status.as_str() {
                    "COMPLETED" => return Ok(()),
                    "IN_QUEUE" | "IN_PROGRESS" => {
                        debug!(
                            "Job status: {} (queue position {:?}, poll {}/{})",
                            job.status,
                            job.queue_position,
                            i + 1,
                            self.max_polls
                        );
                    }
                    other => {
                        return Err(VideoError::Api(format!("Job ended with status {}", other)));
                    }
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(VideoError::Api(format!(
            "Job did not complete after {} polls",
            self.max_polls
        )))
    }

    async fn fetch_result(&self, response_url: &str) -> Result<GeneratedVideo> {
        let response = self
            .client
            .get(response_url)
            .header("Authorization", self.auth())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(VideoError::Api(format!(
                "Failed to fetch result (HTTP {}): {}",
                status, error_text
            )));
        }

        let result: ResultResponse = response.json().await?;
        let video = result
            .video
            .ok_or_else(|| VideoError::Api("No video URL in response".to_string()))?;

        Ok(GeneratedVideo {
            url: video.url,
            content_type: video.content_type,
            seed: result.seed,
        })
    }
}

#[async_trait]
impl VideoService for FalClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedVideo> {
        let submitted = self.submit(request).await?;
        info!("Generation job submitted: {}", submitted.request_id);

        let request_base = format!(
            "{}/{}/requests/{}",
            self.base_url, self.model, submitted.request_id
        );
        let status_url = submitted
            .status_url
            .unwrap_or_else(|| format!("{}/status", request_base));
        let response_url = submitted.response_url.unwrap_or(request_base);

        self.wait_for_completion(&status_url).await?;
        self.fetch_result(&response_url).await
    }

    async fn download(&self, url: &str, output_path: &Path) -> Result<()> {
        info!("Downloading video from: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(VideoError::Api(format!(
                "Download failed (HTTP {})",
                response.status()
            )));
        }
        let data = response.bytes().await?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, data).await?;
        info!("Video saved to: {}", output_path.display());
        Ok(())
    }
}
