use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gesture_keypoints::core::assembler::DatasetAssembler;
use gesture_keypoints::core::capture_loop::RecordingSession;
use gesture_keypoints::core::config::PipelineConfig;
use gesture_keypoints::core::normalizer::KeypointNormalizer;
use gesture_keypoints::models::dataset::ClassName;
use gesture_keypoints::platform::{BlankCapture, LogSink, ReplayDetector};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gesture-keypoints")]
#[command(about = "Record, normalize and assemble hand-gesture keypoint datasets", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.gesture_keypoints/config/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record samples of one class from a replayed detector stream.
    Record {
        #[arg(short, long)]
        class: String,
        /// JSON-lines file, one array of detected hands per frame
        #[arg(long)]
        replay: PathBuf,
        #[arg(short = 'n', long, default_value_t = 1)]
        recordings: usize,
    },

    /// Normalize raw samples into `{class}_latest.npy` archives.
    Normalize {
        #[arg(short, long, conflicts_with = "all", required_unless_present = "all")]
        class: Option<String>,
        /// Normalize every raw class directory
        #[arg(long)]
        all: bool,
    },

    /// Merge every latest archive into one labeled dataset.
    Assemble {
        /// Write data.npy, labels.npy and classes.json here
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Print or write the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    /// Write the default configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => PipelineConfig::default_path().context("Failed to resolve config path"),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::load().context("Failed to load default config")?,
    };
    log::debug!("Using config {:?}", config);
    Ok(config)
}

fn parse_class(name: &str) -> Result<ClassName> {
    ClassName::parse(name).with_context(|| format!("Invalid class name '{}'", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Record {
            class,
            replay,
            recordings,
        } => {
            let config = load_config(&cli)?;
            let class_name = parse_class(class)?;

            let detector = ReplayDetector::open(replay)
                .with_context(|| format!("Failed to open replay {}", replay.display()))?;
            if detector.is_empty() {
                bail!("Replay {} contains no frames", replay.display());
            }
            let capture = BlankCapture::new(640, 480, Some(detector.len() as u64));

            let mut session = RecordingSession::new(
                &config,
                Box::new(capture),
                Box::new(detector),
                Box::new(LogSink),
            );
            let saved = session
                .run(&class_name, *recordings)
                .await
                .context("Recording session failed")?;

            for path in &saved {
                println!("{}", path.display());
            }
            if saved.len() < *recordings {
                log::warn!(
                    "Replay ended early: {} of {} samples recorded",
                    saved.len(),
                    recordings
                );
            }
        }

        Command::Normalize { class, all } => {
            let config = load_config(&cli)?;
            let normalizer = KeypointNormalizer::new(&config);

            let reports = match (class, *all) {
                (Some(class), false) => {
                    vec![normalizer.normalize_class(&parse_class(class)?)?]
                }
                _ => normalizer.normalize_all()?,
            };

            for report in reports {
                println!(
                    "{}: {} recordings -> {}",
                    report.class_name,
                    report.recordings,
                    report.latest_path.display()
                );
            }
        }

        Command::Assemble { export } => {
            let config = load_config(&cli)?;
            let dataset = DatasetAssembler::new(&config)
                .assemble()
                .context("Dataset assembly failed")?;

            println!("data: {:?}", dataset.data.shape());
            println!("labels: {:?}", dataset.labels.shape());
            for (id, count) in dataset.class_counts() {
                let name = dataset
                    .class_name(id)
                    .map(|c| c.as_str())
                    .unwrap_or("?");
                println!("{} => {} ({} samples)", id, name, count);
            }

            if let Some(dir) = export {
                let written = dataset
                    .export(dir)
                    .with_context(|| format!("Failed to export dataset to {}", dir.display()))?;
                for path in written {
                    println!("wrote {}", path.display());
                }
            }
        }

        Command::Config { action } => match action {
            ConfigAction::Show => {
                let config = load_config(&cli)?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Init { force } => {
                let path = config_path(&cli)?;
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                PipelineConfig::default()
                    .save_to(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}
