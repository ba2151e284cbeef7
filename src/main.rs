use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reel_scribe::{output, utils, Cli, Config, ReelPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "reel_scribe=debug"
    } else {
        "reel_scribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.tools).await;
    if !missing_deps.is_empty() {
        eprintln!("{}  Dependency check warnings:", style("⚠").yellow());
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let pipeline = ReelPipeline::new(&config);

    tracing::info!("Starting transcription pipeline for URL: {}", cli.url);
    let result = pipeline.invoke(&cli.url, &cli.mode).await;

    output::print_to_console(&result, &cli.format)?;

    Ok(())
}
