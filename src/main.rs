use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use understand_me_video::api::FalClient;
use understand_me_video::config::{DEFAULT_FINAL_NAME, DEFAULT_MODEL, DEFAULT_ROOT};
use understand_me_video::video::Ffmpeg;
use understand_me_video::{
    FixedDelay, LocalEncode, ManifestEmitter, Pipeline, ProductionConfig, RemoteGeneration,
    RenderStrategy, SceneCatalog,
};

#[derive(Parser, Debug)]
#[command(name = "understand-me-video")]
#[command(about = "Promotional video production from a scene catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write manifests and ffmpeg shell scripts without rendering anything
    Plan(ProductionArgs),
    /// Render every scene and merge them into the final video
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ProductionArgs {
    /// Project root for all generated files
    #[arg(short, long, default_value = DEFAULT_ROOT)]
    root: PathBuf,

    /// Scene catalog JSON file (defaults to the bundled catalog)
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Seconds of black filler between scenes; 0 disables it
    #[arg(short, long, default_value_t = 8.0)]
    spacing: f64,

    /// Final video file name, without extension
    #[arg(long, default_value = DEFAULT_FINAL_NAME)]
    final_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Encode each scene from its still image and voiceover
    Local,
    /// Generate each scene with the hosted text-to-video service
    Remote,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    production: ProductionArgs,

    #[arg(short, long, value_enum, default_value_t = Backend::Local)]
    backend: Backend,

    /// ffmpeg binary
    #[arg(long, env = "FFMPEG_BIN", default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// fal.ai API key
    #[arg(long, env = "FAL_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Text-to-video model id
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Queue API base URL
    #[arg(long, env = "FAL_BASE_URL")]
    base_url: Option<String>,

    /// Seed shared by every scene
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Seconds to wait between remote submissions
    #[arg(long, default_value_t = 5)]
    request_delay: u64,
}

impl ProductionArgs {
    fn config(&self) -> ProductionConfig {
        ProductionConfig {
            final_name: self.final_name.clone(),
            ..ProductionConfig::default()
                .with_root(&self.root)
                .with_spacing(self.spacing)
        }
    }

    async fn catalog(&self) -> anyhow::Result<SceneCatalog> {
        let catalog = match &self.catalog {
            Some(path) => SceneCatalog::from_path(path)
                .await
                .with_context(|| format!("Failed to load scene catalog {}", path.display()))?,
            None => SceneCatalog::bundled().context("Bundled scene catalog is invalid")?,
        };
        info!("Loaded {} scenes", catalog.len());
        Ok(catalog)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "understand_me_video=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let complete = match cli.command {
        Command::Plan(args) => plan(args).await?,
        Command::Render(args) => render(args).await?,
    };

    if !complete {
        std::process::exit(1);
    }
    Ok(())
}

async fn plan(args: ProductionArgs) -> anyhow::Result<bool> {
    let config = args.config();
    config.validate()?;
    let catalog = args.catalog().await?;

    let timeline = ManifestEmitter::new(&config)
        .emit_all(&catalog, config.spacing_seconds)
        .await
        .context("Failed to write production manifests")?;

    info!("Production setup complete ({}s timeline)", timeline.total_duration);
    info!("Next steps:");
    info!("1. Generate images from image-generation-prompts.json");
    info!("2. Generate voiceover from audio-scripts.json");
    info!("3. Run ./create-segments.sh to encode each scene");
    info!("4. Run ./merge-segments.sh to build the final video");
    info!("All files are under {}", config.root.display());
    Ok(true)
}

async fn render(args: RenderArgs) -> anyhow::Result<bool> {
    let mut config = args.production.config();
    config.seed = args.seed;
    config.model = args.model.clone();
    config.request_delay = Duration::from_secs(args.request_delay);
    config.validate()?;

    let catalog = args.production.catalog().await?;

    let ffmpeg = Ffmpeg::new(&args.ffmpeg);
    if !ffmpeg.is_available().await {
        anyhow::bail!(
            "{} is required but was not found; set FFMPEG_BIN or --ffmpeg",
            ffmpeg.program().display()
        );
    }
    let tool = Arc::new(ffmpeg);

    let strategy: Box<dyn RenderStrategy> = match args.backend {
        Backend::Local => Box::new(LocalEncode::new(tool.clone(), config.video.clone())),
        Backend::Remote => {
            let Some(api_key) = args.api_key.clone() else {
                anyhow::bail!(
                    "FAL_KEY not found. Set it via --api-key or the FAL_KEY environment variable"
                );
            };
            let mut client = FalClient::new(api_key, &config.model)?;
            if let Some(base_url) = &args.base_url {
                client = client.with_base_url(base_url);
            }
            info!("Using consistent seed {} with model {}", config.seed, config.model);
            Box::new(RemoteGeneration::new(Arc::new(client)))
        }
    };
    let delay = match args.backend {
        Backend::Local => Duration::ZERO,
        Backend::Remote => config.request_delay,
    };

    let pipeline = Pipeline::new(config, catalog, strategy, tool)
        .with_throttle(Box::new(FixedDelay(delay)));

    let summary = match pipeline.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Video production failed: {}", e);
            return Ok(false);
        }
    };

    if summary.is_complete() {
        info!("{}", summary);
    } else {
        warn!("{}", summary);
    }
    Ok(summary.is_complete())
}
