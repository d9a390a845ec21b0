//! Collaboration gateway.
//!
//! Resolves short GUIDs to the entities they name (projects, users,
//! files) and serves the views and API those GUIDs lead to.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request ID ──▶ internal rewrite ──▶ router ──▶ handlers
//!                                        ▲    │                        │
//!                                        │    └─ proxied GUID ◀────────┤
//!                                        │                             ▼
//!                                        │                      guid resolver
//!                                        │                             │
//!     registry seed ──▶ loader ──▶ Registry (arc-swap) ◀───────────────┘
//!          ▲                            ▲
//!          └── notify watcher ──────────┘
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use collab_gateway::config::{load_config, GatewayConfig};
use collab_gateway::http::HttpServer;
use collab_gateway::lifecycle::{shutdown_signal, Shutdown};
use collab_gateway::observability::{logging, metrics};
use collab_gateway::registry::{
    load_registry, CommentStore, Registry, RegistrySnapshot, SeedWatcher,
};

#[derive(Parser)]
#[command(name = "collab-gateway")]
#[command(about = "GUID resolver and API gateway for the collaboration platform", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Registry seed file, overriding `registry.seed_path`.
    #[arg(short, long)]
    registry: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(path) = &cli.registry {
        config.registry.seed_path = Some(path.display().to_string());
    }

    logging::init_logging(&config.observability);
    tracing::info!("collab-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        redirect_status = config.guid.redirect_status,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let seed_path = config.registry.seed_path.clone().map(PathBuf::from);
    let (registry, comments) = match &seed_path {
        Some(path) => {
            let (snapshot, comments) = load_registry(path)?;
            (Registry::new(snapshot), comments)
        }
        None => {
            tracing::warn!("No registry seed configured, starting with an empty registry");
            (Registry::default(), CommentStore::new())
        }
    };

    // The watcher handle must outlive the server.
    let (_watcher, registry_updates) = match &seed_path {
        Some(path) if config.registry.watch => start_watcher(path)?,
        _ => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, registry, comments);
    server.run(listener, registry_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

type WatcherHandle = (
    Option<notify::RecommendedWatcher>,
    mpsc::UnboundedReceiver<RegistrySnapshot>,
);

fn start_watcher(path: &Path) -> Result<WatcherHandle, notify::Error> {
    let (watcher, rx) = SeedWatcher::new(path);
    let handle = watcher.run()?;
    Ok((Some(handle), rx))
}
