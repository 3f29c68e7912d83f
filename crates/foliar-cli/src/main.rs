use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use foliar_ai::{Classifier, OnnxPipeline};
use foliar_core::{DecisionPolicy, DiagnosisReport};

mod display;

#[derive(Parser)]
#[command(name = "foliar", version, about = "Leaf disease diagnosis from photographs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Diagnose a leaf photograph
    Diagnose {
        /// Image file to diagnose
        image: PathBuf,

        /// Directory holding model.onnx, classifier.json, and an
        /// optional knowledge.json override
        #[arg(long, env = "FOLIAR_MODEL_DIR", default_value = "models")]
        model_dir: PathBuf,

        /// Print the raw JSON report instead of the card view
        #[arg(long)]
        json: bool,

        /// Reject every prediction below this confidence
        #[arg(long)]
        reject_below: Option<f32>,

        /// Reject "Healthy" predictions below this confidence
        #[arg(long)]
        healthy_reject_below: Option<f32>,
    },
    /// Show the fitted label set and embedding dimension
    Info {
        #[arg(long, env = "FOLIAR_MODEL_DIR", default_value = "models")]
        model_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("foliar v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Diagnose {
            image,
            model_dir,
            json,
            reject_below,
            healthy_reject_below,
        } => diagnose(&image, &model_dir, json, reject_below, healthy_reject_below),
        Command::Info { model_dir } => info(&model_dir),
    }
}

fn diagnose(
    image: &Path,
    model_dir: &Path,
    json: bool,
    reject_below: Option<f32>,
    healthy_reject_below: Option<f32>,
) -> anyhow::Result<()> {
    let mut policy = DecisionPolicy::default();
    if let Some(threshold) = reject_below {
        policy.reject_below = threshold;
    }
    if let Some(threshold) = healthy_reject_below {
        policy.healthy_reject_below = threshold;
    }

    let mut pipeline = OnnxPipeline::load(model_dir, policy)
        .with_context(|| format!("loading model artifacts from {}", model_dir.display()))?;

    let result = pipeline.diagnose_path(image);
    let report = DiagnosisReport::from(&result);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display::print_report(&report);
    }

    Ok(())
}

fn info(model_dir: &Path) -> anyhow::Result<()> {
    let classifier = Classifier::load(&model_dir.join("classifier.json"))
        .with_context(|| format!("loading classifier from {}", model_dir.display()))?;

    println!("Embedding dimension: {}", classifier.dim());
    println!("Labels ({}):", classifier.labels().len());
    for label in classifier.labels() {
        println!("  {label}");
    }

    Ok(())
}
