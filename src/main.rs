use std::path::PathBuf;

use clap::Parser;
use housing_classifier::artifacts::ArtifactBundle;
use housing_classifier::pipeline::InferencePipeline;
use housing_classifier::server::{self, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "housing-classifier")]
#[command(about = "HTTP inference service for a housing price-segment classifier")]
struct CliArgs {
    /// Host address to bind the server
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind; defaults to the PORT environment variable, then 8000
    #[arg(long, default_value_t = default_port())]
    port: u16,

    /// Path to the trained classifier artifact
    #[arg(long, default_value = "model.json")]
    model: PathBuf,

    /// Path to the fitted imputer artifact
    #[arg(long, default_value = "imputer.json")]
    imputer: PathBuf,

    /// Path to the fitted scaler artifact
    #[arg(long, default_value = "scaler.json")]
    scaler: PathBuf,
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000)
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    server::init_logging();

    log::info!(
        "loading artifacts: model={} imputer={} scaler={}",
        args.model.display(),
        args.imputer.display(),
        args.scaler.display()
    );
    let bundle = ArtifactBundle::load(&args.model, &args.imputer, &args.scaler)?;
    log::info!("artifacts loaded");

    let state = AppState {
        pipeline: InferencePipeline::new(bundle),
    };
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    actix_web::rt::System::new().block_on(server::startup(config, state))?;
    Ok(())
}
