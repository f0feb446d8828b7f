use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reel_core::config::{ConfigManager, ToolPaths};
use reel_core::events::{PipelineEvent, Severity};
use reel_core::logging::init_tracing;
use reel_core::orchestrator::{BatchController, BatchProcessor, BatchRequest, RandomSelector};
use reel_core::probe::{FfprobeProbe, MediaProbe};
use reel_core::snapshot;

const DEFAULT_CONFIG: &str = "reelsmith.toml";

#[derive(Parser)]
#[command(
    name = "reelsmith",
    version,
    about = "Assemble narrated short videos from a folder of scene clips"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate videos for a product folder
    Generate {
        /// Folder containing scene folders A, B, C...
        product_dir: PathBuf,

        /// Number of videos to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Settings file (created with defaults if missing)
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Print events as JSON lines
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Seed for reproducible asset selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print a directory tree snapshot as JSON
    Snapshot {
        dir: PathBuf,

        /// Maximum folder depth
        #[arg(long, default_value_t = 3)]
        depth: usize,
    },

    /// Print the duration of a media file in seconds
    Probe {
        file: PathBuf,

        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Create the settings file if missing and print its location
    Config {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Generate {
            product_dir,
            count,
            config,
            json,
            seed,
        } => generate(&product_dir, count, &config, json, seed),
        Commands::Snapshot { dir, depth } => {
            let _guard = init_tracing(Default::default(), None);
            let snapshot = snapshot::scan(&dir, depth)
                .with_context(|| format!("cannot scan {}", dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Probe { file, config } => {
            let manager = load_config(&config)?;
            let _guard = init_tracing(manager.settings().logging.level, None);
            let tools = ToolPaths::resolve(&manager.settings().tools);
            let secs = FfprobeProbe::new(tools.ffprobe)
                .duration(&file)
                .with_context(|| format!("cannot probe {}", file.display()))?;
            println!("{:.3}", secs);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { config } => {
            let manager = load_config(&config)?;
            println!("{}", manager.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: &Path) -> Result<ConfigManager> {
    let mut manager = ConfigManager::new(path);
    manager
        .load_or_create()
        .with_context(|| format!("cannot load settings from {}", path.display()))?;
    Ok(manager)
}

fn generate(
    product_dir: &Path,
    count: usize,
    config: &Path,
    json: bool,
    seed: Option<u64>,
) -> Result<ExitCode> {
    let manager = load_config(config)?;
    let settings = manager.settings().clone();
    let log_dir = manager.log_dir();
    let _guard = init_tracing(settings.logging.level, log_dir.as_deref());

    let tools = ToolPaths::resolve(&settings.tools);
    tracing::info!(
        "Using ffmpeg at {}, ffprobe at {}",
        tools.ffmpeg.display(),
        tools.ffprobe.display()
    );

    let mut processor = BatchProcessor::system(settings, &tools);
    if let Some(seed) = seed {
        processor = processor.with_selector(Arc::new(RandomSelector::seeded(seed)));
    }
    let mut controller = BatchController::new(processor);
    if let Some(dir) = log_dir {
        controller = controller.with_log_dir(dir);
    }

    let events = controller.subscribe();
    let handle = controller.start(BatchRequest::new(product_dir, count))?;

    for event in events.iter() {
        print_event(&event, json)?;
        if event.is_terminal() {
            break;
        }
    }

    let summary = handle.wait()?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "{} of {} video(s) produced",
            summary.produced.len(),
            summary.requested
        );
        for failed in &summary.failed {
            eprintln!("  output {}: {}", failed.index, failed.error);
        }
    }

    if summary.all_failed() {
        bail!("every output failed");
    }
    Ok(ExitCode::SUCCESS)
}

fn print_event(event: &PipelineEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        PipelineEvent::Log { message, severity } => match severity {
            Severity::Warning | Severity::Error => eprintln!("{}", message),
            _ => println!("{}", message),
        },
        PipelineEvent::Progress { operation, percent } => println!("  {}: {}%", operation, percent),
        PipelineEvent::State { .. } => {}
    }
    Ok(())
}
