//! ferrite-classify Studio
//!
//! A small browser front end for a classification pipeline: pick an image,
//! see the predicted label, its confidence and the ranked class scores.
//! Served by a synchronous tiny_http server; no JavaScript frameworks required.
//!
//! Run with:
//!   cargo run --bin studio --release -- --model model.json
//! Then open http://127.0.0.1:7878

mod state;
mod render;
mod routes;
mod handlers;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ferrite_classify::{init_tracing, Pipeline, PipelineConfig};
use tiny_http::Server;
use tracing::info;

use state::StudioState;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Browser front end for an image classification pipeline")]
struct Args {
    /// JSON model file
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Label file (JSON array or one label per line)
    #[arg(short, long)]
    labels: Option<PathBuf>,

    /// Pipeline config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

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

    // Model and labels are loaded once and shared by every request.
    let pipeline = Pipeline::from_config(&config)?;
    let model_name = config
        .model_path
        .as_ref()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_owned();
    let top_k = config.top_k.unwrap_or(5);
    let shared_state = Arc::new(StudioState::new(pipeline, model_name, top_k));

    let server = Server::http(&args.addr).map_err(|e| e.to_string())?;
    info!(addr = %args.addr, "studio listening, open http://{}", args.addr);

    // Each request runs on its own thread; classification requests queue on
    // the pipeline's in-flight slot, page loads never wait for them.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}
