use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use facecensor::config::{DEFAULT_EXPANSION_FACTOR, DEFAULT_EXPORT_PREFIX};
use facecensor::{Completion, JsonFileDetector, PipelineController, RedactConfig};

#[derive(Parser)]
#[command(name = "facecensor")]
#[command(about = "Black out detected faces in an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Saved detector reply: {"boxes": [{"box_2d": [ymin, xmin, ymax, xmax]}]}
    #[arg(short, long, value_name = "JSON")]
    detections: PathBuf,

    /// Directory the redacted PNG is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Fraction by which each detected box is enlarged before masking
    #[arg(short, long, default_value_t = DEFAULT_EXPANSION_FACTOR)]
    expansion: f64,

    /// Filename prefix of the exported image
    #[arg(long, default_value = DEFAULT_EXPORT_PREFIX)]
    prefix: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = RedactConfig::new()
        .with_expansion_factor(args.expansion)?
        .with_export_prefix(args.prefix)?;
    let mut controller = PipelineController::new(config)?;

    controller.ingest_path(&args.image_path).await?;

    let detector = JsonFileDetector::new(&args.detections);
    let completion = controller.run_detection(&detector).await;

    for line in controller.status().lines() {
        println!("» {}", line);
    }

    match completion? {
        Completion::Redacted { dropped, .. } if dropped > 0 => {
            println!("» WARNING: {} malformed boxes ignored", dropped);
        }
        Completion::Redacted { .. } => {}
        Completion::Stale => anyhow::bail!("detection result was discarded"),
    }

    match controller.export_to(&args.out_dir).await {
        Ok(path) => println!("» EXPORTED: {}", path.display()),
        Err(e) => {
            for line in controller.status().lines() {
                println!("» {}", line);
            }
            return Err(e.into());
        }
    }

    Ok(())
}
