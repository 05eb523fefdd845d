use anyhow::{Context, Result};
use clap::Parser;
use loadrig_core::{
    Config, ContinuousRunner, Controller, HttpSender, MockSender, RequestSender, StatsSnapshot,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "loadrig")]
#[command(about = "Continuous HTTP load generator - fires paced request batches at a target")]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = "config/example.toml")]
    config: PathBuf,

    /// Transport mode: mock or http
    #[arg(long, default_value = "http")]
    mode: String,

    /// Start with batch launching paused
    #[arg(long)]
    paused: bool,

    /// Optional run duration cap in milliseconds; runs until Ctrl-C when unset
    #[arg(long)]
    duration_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let sender: Arc<dyn RequestSender> = match args.mode.as_str() {
        "mock" => Arc::new(MockSender::new(Duration::from_millis(5))),
        "http" => Arc::new(
            HttpSender::new(config.target.base_url.clone(), config.target.timeout())
                .context("Failed to build HTTP sender")?,
        ),
        _ => anyhow::bail!("Invalid mode: {}, must be 'mock' or 'http'", args.mode),
    };

    info!(
        "Targeting {} with {} request specs ({} transport)",
        config.target.base_url,
        config.requests.len(),
        sender.name()
    );

    let runner = Arc::new(ContinuousRunner::new(config, sender));
    let controller = Controller::new(runner.clone());

    controller.set_enabled(!args.paused);
    controller.start()?;

    match args.duration_ms {
        Some(ms) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping run"),
                _ = sleep(Duration::from_millis(ms)) => info!("Duration cap reached, stopping run"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("Interrupted, stopping run");
        }
    }

    controller.stop();
    runner.stopped().await;

    print_summary(&runner.stats());

    Ok(())
}

fn print_summary(stats: &StatsSnapshot) {
    println!("\n=== Run Summary ===");
    println!("Sent: {}", stats.sent);
    println!("Succeeded: {}", stats.succeeded);
    println!("Failed: {}", stats.failed);
    println!();
}
