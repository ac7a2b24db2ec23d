use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use doodlegen_core::{Categories, LocalBucket, Pipeline, ProceduralSketch, SketchModel};
use doodlegen_server::{app, AppState};

// Define command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Doodlegen sketch generation server")]
struct Args {
    /// Host address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Local root for per-request staging directories
    #[arg(long, default_value = "./images")]
    images_root: PathBuf,

    /// Root directory of the filesystem-backed bucket
    #[arg(long, default_value = "./bucket")]
    bucket_root: PathBuf,

    /// Category list file (one label per line); defaults to the built-in list
    #[arg(long)]
    categories: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doodlegen_server=info,doodlegen_core=info".into()),
        )
        .init();

    let args = Args::parse();

    // Both collaborator handles are built once here and shared read-only
    // across all requests.
    let model = match &args.categories {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            ProceduralSketch::new(Categories::from_lines(&text))
        }
        None => ProceduralSketch::with_default_categories(),
    };
    info!(categories = model.categories().len(), "model initialized");

    let store = LocalBucket::new(&args.bucket_root);
    let pipeline = Pipeline::new(Arc::new(model), Arc::new(store), &args.images_root);

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let bind_address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&bind_address).await?;
    info!("started server on {}", listener.local_addr()?);
    axum::serve(listener, app(state).into_make_service()).await?;

    Ok(())
}
