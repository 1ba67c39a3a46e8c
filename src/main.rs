//! Signage Edge (v1)
//!
//! Locale-aware routing edge in front of the signage renderer.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌───────────────────────────────────────────────────┐
//!                              │                   SIGNAGE EDGE                    │
//!                              │                                                   │
//!     Client Request           │  ┌─────────┐    ┌──────────┐    ┌─────────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing  │───▶│  redirect   │───┼──▶ 3xx
//!                              │  │ server  │    │normalizer│    └─────────────┘   │
//!                              │  └─────────┘    └────┬─────┘                      │
//!                              │                      │ rewrite / pass-through     │
//!                              │                      ▼                            │
//!     Client Response          │               ┌─────────────┐   404 ┌──────────┐  │
//!     ◀────────────────────────┼───────────────│  upstream   │──────▶│redirect- │  │     Renderer
//!                              │               │  forwarder  │◀──────│  ions    │  │◀─── (pages)
//!                              │               └─────────────┘       └──────────┘  │
//!                              │                                                   │
//!                              │  config · i18n · observability · lifecycle        │
//!                              └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use signage_edge::config::{load_config, load_default};
use signage_edge::http::EdgeServer;
use signage_edge::lifecycle::{signals, Shutdown};
use signage_edge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "signage-edge")]
#[command(about = "Locale-aware routing edge for the signage renderer", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };

    logging::init_logging(&config.observability)?;

    tracing::info!("signage-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        default_locale = %config.locales.default,
        preview = config.cms.is_preview(),
        redirections = config.cms.redirections_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = EdgeServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
