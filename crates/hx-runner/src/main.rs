//! # hx-runner
//!
//! Streams one Huobi kline topic and logs every update until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! hx-runner --log-level info
//! hx-runner config.json --topic market.ethusdt.kline.5min
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hx_core::config::AppConfig;
use hx_md::huobi::{self, config::HuobiConfig};
use tracing::info;

/// Huobi kline streaming client.
#[derive(Parser)]
#[command(name = "hx-runner", about = "Huobi kline streaming client")]
struct Cli {
    /// Configuration file path (JSON). Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,

    /// Override the subscribed topic, e.g. `market.btcusdt.kline.1min`.
    #[arg(long)]
    topic: Option<String>,

    /// Override the endpoint host, e.g. `api-aws.huobi.pro`.
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    hx_core::logging::init_logging(&cli.log_level, cli.log_dir.as_deref(), "hx-runner");

    let mut app = match &cli.config {
        Some(path) => {
            let app = hx_core::config::load_config(path)?;
            info!("config loaded from {}", path.display());
            app
        }
        None => AppConfig::default(),
    };
    if let Some(topic) = cli.topic {
        app.subscription.topic = topic;
    }
    if let Some(host) = cli.host {
        app.endpoint.host = host;
    }

    let cfg = HuobiConfig::from_app(&app)?;

    // Registered before dialing so Ctrl+C while connecting is still graceful.
    let interrupt = hx_core::shutdown::interrupt_signal()?;

    let cause = huobi::run(&cfg, None, hx_core::shutdown::interrupted(interrupt)).await?;
    info!("shutdown cause: {cause:?}");
    Ok(())
}
