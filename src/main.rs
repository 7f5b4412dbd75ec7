//! Command-line front end.
//!
//!   ferrite-classify classify --model model.json photo.jpg other.png
//!   ferrite-classify init-model --width 32 --height 32 --labels falldown,none --out model.json
//!
//! Set `RUST_LOG=debug` to see per-stage timings.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ferrite_classify::{
    init_tracing, ActivationFunction, ImageInput, ModelMetadata, Network, Pipeline,
    PipelineConfig, PixelBuffer, TargetOrder,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "ferrite-classify")]
#[command(about = "Classify images with a pre-trained model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one or more image files
    Classify(ClassifyArgs),
    /// Write an untrained dense model, for smoke-testing a pipeline
    InitModel(InitModelArgs),
}

#[derive(Args)]
struct ClassifyArgs {
    /// JSON model file
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Label file (JSON array or one label per line)
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Pipeline config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model input width
    #[arg(long)]
    width: Option<u32>,

    /// Model input height
    #[arg(long)]
    height: Option<u32>,

    /// Plane order of the model input: rgb or bgr
    #[arg(long, value_parser = parse_target_order)]
    channel_order: Option<TargetOrder>,

    /// Number of ranked classes to print
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Print one JSON object per image instead of text
    #[arg(long)]
    json: bool,

    /// Images to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Args)]
struct InitModelArgs {
    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Comma-separated class labels
    #[arg(long, value_delimiter = ',', required = true)]
    labels: Vec<String>,

    /// Size of an optional ReLU hidden layer
    #[arg(long)]
    hidden: Option<usize>,

    #[arg(long, value_parser = parse_target_order, default_value = "rgb")]
    channel_order: TargetOrder,

    /// Free-form description stored in the model metadata
    #[arg(long)]
    description: Option<String>,

    /// Output path
    #[arg(short, long)]
    out: PathBuf,
}

fn parse_target_order(s: &str) -> Result<TargetOrder, String> {
    match s.to_ascii_lowercase().as_str() {
        "rgb" => Ok(TargetOrder::Rgb),
        "bgr" => Ok(TargetOrder::Bgr),
        other => Err(format!("unknown channel order '{other}', expected rgb or bgr")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    match Cli::parse().command {
        Command::Classify(args) => classify(args),
        Command::InitModel(args) => init_model(args),
    }
}

fn classify(args: ClassifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };
    if args.model.is_some() {
        config.model_path = args.model;
    }
    if args.labels.is_some() {
        config.labels_path = args.labels;
    }
    config.target_width = args.width.or(config.target_width);
    config.target_height = args.height.or(config.target_height);
    config.channel_order = args.channel_order.or(config.channel_order);
    let top_k = args.top_k.or(config.top_k).unwrap_or(1);

    let pipeline = Pipeline::from_config(&config)?;

    let mut failures = 0usize;
    for path in &args.images {
        let ranked = PixelBuffer::open(path).and_then(|image| pipeline.classify_top_k(&image, top_k));
        match ranked {
            Ok(ranked) if args.json => {
                let line = serde_json::json!({
                    "image": path.display().to_string(),
                    "predictions": ranked,
                });
                println!("{line}");
            }
            Ok(ranked) => {
                println!("{}", path.display());
                for (i, r) in ranked.iter().enumerate() {
                    println!("  {}. {} ({:.4})", i + 1, r.label, r.confidence);
                }
            }
            Err(e) if e.is_input_error() => {
                failures += 1;
                warn!(image = %path.display(), "skipped: {e}");
            }
            Err(e) => {
                failures += 1;
                error!(image = %path.display(), "classification failed: {e}");
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} images failed", args.images.len()).into());
    }
    Ok(())
}

fn init_model(args: InitModelArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.width == 0 || args.height == 0 {
        return Err("width and height must be non-zero".into());
    }
    let inputs = 3 * args.width as usize * args.height as usize;
    let classes = args.labels.len();

    let layers = match args.hidden {
        Some(hidden) => vec![
            (hidden, inputs, ActivationFunction::ReLU),
            (classes, hidden, ActivationFunction::Softmax),
        ],
        None => vec![(classes, inputs, ActivationFunction::Softmax)],
    };
    let network = Network::new(layers).with_metadata(ModelMetadata {
        description: args.description,
        input: Some(ImageInput {
            width: args.width,
            height: args.height,
            channel_order: args.channel_order,
        }),
        output_labels: Some(args.labels),
        input_name: None,
        output_name: None,
    });
    network.save_json(&args.out)?;

    info!(
        path = %args.out.display(),
        inputs,
        classes,
        "wrote untrained model"
    );
    Ok(())
}
