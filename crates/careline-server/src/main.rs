//! Careline server binary.
//!
//! # Usage
//!
//! ```bash
//! careline-server --bind 0.0.0.0:3001
//! ```

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Careline triage chat server
#[derive(Parser, Debug)]
#[command(name = "careline-server")]
#[command(about = "Real-time triage chat server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:3001")]
    bind: String,

    /// Messages replayed to a session when it joins a room
    #[arg(long, default_value = "50")]
    history_replay: usize,

    /// Maximum concurrent WebSocket connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Careline server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = careline_server::ServerRuntimeConfig {
        bind_address: args.bind,
        history_replay: args.history_replay,
        max_connections: args.max_connections,
    };

    careline_server::run(config).await?;

    Ok(())
}
