use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use understand_me_video::api::{GeneratedVideo, GenerationRequest, VideoService};
use understand_me_video::manifest::{CONCAT_LIST_FILE, TIMELINE_FILE};
use understand_me_video::video::MediaTool;
use understand_me_video::{
    LocalEncode, Pipeline, ProductionConfig, RemoteGeneration, RenderOutcome, Result, Scene,
    SceneCatalog, Throttle, Timeline, VideoError,
};

/// Stands in for ffmpeg: records each call and writes the output file.
/// Calls with an argument containing `fail_on` exit with an error instead.
#[derive(Default)]
struct FileTool {
    calls: Mutex<Vec<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl FileTool {
    fn failing_on(pattern: &'static str) -> Self {
        Self {
            fail_on: Some(pattern),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn concat_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.contains(&"concat".to_string())).count()
    }

    fn filler_calls(&self) -> usize {
        self.filler_args().len()
    }

    fn filler_args(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains(&"lavfi".to_string()))
            .collect()
    }
}

#[async_trait]
impl MediaTool for FileTool {
    async fn run(&self, args: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(args.to_vec());
        if let Some(pattern) = self.fail_on {
            if args.iter().any(|a| a.contains(pattern)) {
                return Err(VideoError::Ffmpeg(
                    "ffmpeg exited with exit status: 1: Invalid data found".to_string(),
                ));
            }
        }
        if let Some(output) = args.last() {
            std::fs::write(output, b"media")?;
        }
        Ok(())
    }
}

/// Fails every prompt containing `FAIL`; otherwise "downloads" a stub file.
#[derive(Default)]
struct FakeService {
    submitted: Mutex<Vec<GenerationRequest>>,
}

#[async_trait]
impl VideoService for FakeService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedVideo> {
        self.submitted.lock().unwrap().push(request.clone());
        if request.prompt.contains("FAIL") {
            return Err(VideoError::Api("job ended with status FAILED".to_string()));
        }
        Ok(GeneratedVideo {
            url: format!("https://cdn.example/{}.mp4", request.prompt),
            content_type: Some("video/mp4".to_string()),
            seed: Some(request.seed),
        })
    }

    async fn download(&self, _url: &str, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, b"mp4").await?;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct CountingThrottle {
    pauses: Arc<AtomicUsize>,
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

fn catalog(durations: &[f64]) -> SceneCatalog {
    let scenes = durations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let id = i as u32 + 1;
            Scene::new(id, format!("scene_{id}"), *d, format!("shot {id}"))
                .with_voiceover(format!("line {id}"), "calm")
                .with_video_prompt(format!("prompt-{id}"))
        })
        .collect();
    SceneCatalog::new(scenes).unwrap()
}

fn config(root: &Path, spacing: f64) -> ProductionConfig {
    ProductionConfig::default().with_root(root).with_spacing(spacing)
}

/// Writes the still image for every scene and the voiceover for every scene
/// except `without_audio`.
fn stage_local_inputs(root: &Path, catalog: &SceneCatalog, without_audio: Option<u32>) {
    std::fs::create_dir_all(root.join("images")).unwrap();
    std::fs::create_dir_all(root.join("audio/voiceover")).unwrap();
    for scene in catalog.iter() {
        let slug = scene.slug();
        std::fs::write(root.join(format!("images/scene-{slug}.png")), b"png").unwrap();
        if without_audio != Some(scene.id) {
            let audio = root.join(format!("audio/voiceover/scene-{slug}.wav"));
            std::fs::write(audio, b"wav").unwrap();
        }
    }
}

fn concat_lines(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join(CONCAT_LIST_FILE))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn three_scene_timeline_matches_expected_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let tool = Arc::new(FileTool::default());
    let pipeline = Pipeline::new(
        config(dir.path(), 8.0),
        catalog(&[10.0, 14.0, 14.0]),
        Box::new(RemoteGeneration::new(Arc::new(FakeService::default()))),
        tool,
    );

    let timeline = pipeline.emit_manifests().await.unwrap();
    let starts: Vec<f64> = timeline.scenes.iter().map(|s| s.start_time).collect();
    let ends: Vec<f64> = timeline.scenes.iter().map(|s| s.end_time).collect();
    assert_eq!(starts, vec![0.0, 18.0, 40.0]);
    assert_eq!(ends, vec![10.0, 32.0, 54.0]);
    assert_eq!(timeline.total_duration, 54.0);

    let json = std::fs::read_to_string(dir.path().join(TIMELINE_FILE)).unwrap();
    let written: Timeline = serde_json::from_str(&json).unwrap();
    assert_eq!(written, timeline);
}

#[tokio::test]
async fn missing_audio_fails_one_scene_and_processing_continues() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&[4.0, 4.0, 4.0, 4.0]);
    let cfg = config(dir.path(), 0.0);
    stage_local_inputs(dir.path(), &catalog, Some(3));

    let tool = Arc::new(FileTool::default());
    let strategy = LocalEncode::new(tool.clone(), cfg.video.clone());
    let pipeline = Pipeline::new(cfg, catalog, Box::new(strategy), tool.clone());

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.total(), 4);
    assert_eq!(summary.produced(), 3);
    assert_eq!(summary.failed_names(), vec!["scene_3"]);
    match &summary.outcomes[2] {
        RenderOutcome::NotProduced { scene_id, reason, .. } => {
            assert_eq!(*scene_id, 3);
            assert!(reason.contains("missing input file"), "{reason}");
        }
        other => panic!("scene 3 should have failed: {other:?}"),
    }
    assert!(summary.outcomes[3].is_produced());
    assert!(dir.path().join("video-segments/segment-04-scene_4.mp4").is_file());

    // three segment encodes, no merge
    assert_eq!(tool.calls().len(), 3);
    assert_eq!(tool.concat_calls(), 0);
    assert!(summary.final_output.is_none());
}

#[tokio::test]
async fn spaced_remote_run_merges_with_interleaved_filler() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(FakeService::default());
    let tool = Arc::new(FileTool::default());
    let pipeline = Pipeline::new(
        config(dir.path(), 8.0),
        catalog(&[10.0, 14.0, 14.0, 19.0]),
        Box::new(RemoteGeneration::new(service.clone())),
        tool.clone(),
    );

    let summary = pipeline.run().await.unwrap();
    assert!(summary.is_complete());

    let lines = concat_lines(dir.path());
    assert_eq!(lines.len(), 2 * 4 - 1);
    assert_eq!(lines[0], "file 'video-segments/segment-01-scene_1.mp4'");
    for gap in [1, 3, 5] {
        assert_eq!(lines[gap], "file 'spacing/black-8sec.mp4'");
    }

    assert_eq!(tool.filler_calls(), 1);
    assert_eq!(tool.concat_calls(), 1);
    let final_output = summary.final_output.unwrap();
    assert!(final_output.ends_with("final/understand-me-promotional-video-3min.mp4"));
    assert!(final_output.is_file());

    let submitted = service.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 4);
    assert!(submitted.iter().all(|r| r.seed == 42));
    let durations: Vec<u32> = submitted.iter().map(|r| r.duration).collect();
    assert_eq!(durations, vec![10, 14, 14, 19]);
}

#[tokio::test]
async fn unspaced_remote_run_lists_only_scenes() {
    let dir = tempfile::tempdir().unwrap();
    let tool = Arc::new(FileTool::default());
    let pipeline = Pipeline::new(
        config(dir.path(), 0.0),
        catalog(&[6.0, 6.0, 6.0]),
        Box::new(RemoteGeneration::new(Arc::new(FakeService::default()))),
        tool.clone(),
    );

    let summary = pipeline.run().await.unwrap();
    assert!(summary.is_complete());
    assert_eq!(concat_lines(dir.path()).len(), 3);
    assert_eq!(tool.filler_calls(), 0);
    assert_eq!(tool.concat_calls(), 1);
}

#[tokio::test]
async fn any_remote_failure_skips_concatenation() {
    let dir = tempfile::tempdir().unwrap();
    let mut scenes = catalog(&[10.0, 10.0, 10.0, 10.0]).scenes().to_vec();
    scenes[1].video_prompt = Some("FAIL-2".to_string());
    scenes[3].video_prompt = Some("FAIL-4".to_string());

    let service = Arc::new(FakeService::default());
    let tool = Arc::new(FileTool::default());
    let pipeline = Pipeline::new(
        config(dir.path(), 8.0),
        SceneCatalog::new(scenes).unwrap(),
        Box::new(RemoteGeneration::new(service.clone())),
        tool.clone(),
    );

    let summary = pipeline.run().await.unwrap();

    // every scene still gets its one attempt
    assert_eq!(service.submitted.lock().unwrap().len(), 4);
    assert_eq!(summary.failed().len(), 2);
    assert_eq!(summary.failed_names(), vec!["scene_2", "scene_4"]);
    assert!(tool.calls().is_empty());
    assert!(!dir.path().join(CONCAT_LIST_FILE).exists());
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn throttle_pauses_between_consecutive_scenes_only() {
    let dir = tempfile::tempdir().unwrap();
    let throttle = CountingThrottle::default();
    let pipeline = Pipeline::new(
        config(dir.path(), 0.0),
        catalog(&[5.0, 5.0, 5.0]),
        Box::new(RemoteGeneration::new(Arc::new(FakeService::default()))),
        Arc::new(FileTool::default()),
    )
    .with_throttle(Box::new(throttle.clone()));

    let timeline = pipeline.emit_manifests().await.unwrap();
    let outcomes = pipeline.render_scenes(&timeline).await;

    assert_eq!(outcomes.len(), 3);
    assert_eq!(throttle.pauses.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_config_aborts_before_any_render() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(FakeService::default());
    let pipeline = Pipeline::new(
        config(dir.path(), -2.0),
        catalog(&[5.0]),
        Box::new(RemoteGeneration::new(service.clone())),
        Arc::new(FileTool::default()),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, VideoError::Config(_)));
    assert!(service.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn encoder_error_fails_one_scene_and_later_scenes_still_render() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&[4.0, 4.0, 4.0]);
    let cfg = config(dir.path(), 0.0);
    stage_local_inputs(dir.path(), &catalog, None);

    let tool = Arc::new(FileTool::failing_on("segment-02-"));
    let strategy = LocalEncode::new(tool.clone(), cfg.video.clone());
    let pipeline = Pipeline::new(cfg, catalog, Box::new(strategy), tool.clone());

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.failed_names(), vec!["scene_2"]);
    match &summary.outcomes[1] {
        RenderOutcome::NotProduced { reason, .. } => {
            assert!(reason.starts_with("FFmpeg error"), "{reason}");
        }
        other => panic!("scene 2 should have failed: {other:?}"),
    }
    assert!(summary.outcomes[2].is_produced());
    assert_eq!(tool.calls().len(), 3);
    assert_eq!(tool.concat_calls(), 0);
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn failed_merge_surfaces_as_run_error() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(FakeService::default());
    let tool = Arc::new(FileTool::failing_on(CONCAT_LIST_FILE));
    let pipeline = Pipeline::new(
        config(dir.path(), 0.0),
        catalog(&[6.0, 6.0, 6.0]),
        Box::new(RemoteGeneration::new(service.clone())),
        tool.clone(),
    );

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, VideoError::Ffmpeg(_)));
    assert_eq!(service.submitted.lock().unwrap().len(), 3);
    assert_eq!(tool.concat_calls(), 1);
    assert_eq!(concat_lines(dir.path()).len(), 3);
    assert!(!dir
        .path()
        .join("final/understand-me-promotional-video-3min.mp4")
        .exists());
}

#[tokio::test]
async fn remote_run_filler_has_no_audio_track() {
    let dir = tempfile::tempdir().unwrap();
    let tool = Arc::new(FileTool::default());
    let pipeline = Pipeline::new(
        config(dir.path(), 8.0),
        catalog(&[6.0, 6.0]),
        Box::new(RemoteGeneration::new(Arc::new(FakeService::default()))),
        tool.clone(),
    );

    let summary = pipeline.run().await.unwrap();
    assert!(summary.is_complete());

    let fillers = tool.filler_args();
    assert_eq!(fillers.len(), 1);
    assert!(!fillers[0].iter().any(|a| a.contains("anullsrc")));
    assert!(!fillers[0].contains(&"-c:a".to_string()));
}

#[tokio::test]
async fn local_run_filler_carries_silent_audio() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&[4.0, 4.0]);
    let cfg = config(dir.path(), 8.0);
    stage_local_inputs(dir.path(), &catalog, None);

    let tool = Arc::new(FileTool::default());
    let strategy = LocalEncode::new(tool.clone(), cfg.video.clone());
    let pipeline = Pipeline::new(cfg, catalog, Box::new(strategy), tool.clone());

    let summary = pipeline.run().await.unwrap();
    assert!(summary.is_complete());

    let fillers = tool.filler_args();
    assert_eq!(fillers.len(), 1);
    assert!(fillers[0].contains(&"anullsrc=r=44100:cl=stereo".to_string()));
    assert_eq!(concat_lines(dir.path()).len(), 3);
}
