//! dpq-scheduler — the long-running process (C5) that promotes due delayed
//! tasks for a single named queue.
//!
//! Loops forever: once per tick, call `enqueue_delayed`, then sleep. No
//! coordination across scheduler instances is required — `enqueue_delayed`
//! is idempotent and atomic on the server, so running more than one of these
//! against the same queue is safe, just wasteful.

use std::time::Duration;

use clap::Parser;
use tracing::{debug, error, info};

use dpq::{Config, DpqClient};

/// DPQ scheduler — promotes delayed tasks on a named queue once per tick.
#[derive(Parser, Debug)]
#[command(name = "dpq-scheduler", version, about)]
struct Cli {
    /// Name of the queue to drive.
    queue: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dpq::config::load_dotenv();
    let cli = Cli::parse();
    let config = Config::from_env();
    let tick = Duration::from_secs(config.scheduler_tick_secs.max(1));

    info!(queue = %cli.queue, tick_secs = tick.as_secs(), "dpq-scheduler starting");
    let client = DpqClient::connect(&cli.queue, config).await?;

    let mut interval = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match client.enqueue_delayed().await {
                    Ok(0) => debug!(queue = %cli.queue, "enqueue_delayed: nothing due"),
                    Ok(n) => info!(queue = %cli.queue, processed = n, "enqueue_delayed: promoted or dropped"),
                    Err(e) => error!(queue = %cli.queue, error = %e, "enqueue_delayed failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(queue = %cli.queue, "dpq-scheduler shutting down");
                break;
            }
        }
    }

    Ok(())
}
