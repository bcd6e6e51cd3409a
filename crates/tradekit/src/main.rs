use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tradekit", about = "Brokerage tools and tool-using trading agents over HTTP")]
struct Cli {
    /// Path to configuration file. Defaults apply when it does not exist.
    #[arg(short, long, default_value = "config/tradekit.toml")]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = tradekit::load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind))?;

    let ctx = Arc::new(tradekit::build_context(config).context("Failed to build application")?);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal.cancel();
        }
    });

    tradekit::server::serve(ctx, addr, shutdown)
        .await
        .context("Server failed")?;

    Ok(())
}
