//! Identity Hub node: entry point.
//!
//! Serves the hub protocol with configuration from a TOML file or defaults.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use idhub_node::{HubConfig, HubProtocolEndpoint, MessageProcessorRegistry, MessageStore};

/// Identity Hub Node
#[derive(Parser, Debug)]
#[command(name = "idhub-node", version, about = "Identity Hub node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "idhub.toml")]
    config: PathBuf,

    /// Override the API listen address.
    #[arg(long)]
    listen_addr: Option<String>,

    /// Override the API port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the hub protocol base path.
    #[arg(long)]
    base_path: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(config: &HubConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init {
        HubConfig::default().save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    let mut config = HubConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(listen_addr) = args.listen_addr {
        config.api.listen_addr = listen_addr;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(base_path) = args.base_path {
        config.api.base_path = base_path;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }

    init_tracing(&config);
    tracing::info!("Identity Hub node v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(MessageStore::new());
    let registry = Arc::new(MessageProcessorRegistry::with_defaults(store));
    let endpoint = Arc::new(HubProtocolEndpoint::new(registry));

    let listen_addr = config.api_socket_addr()?;
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    let base_path = config.base_path();

    // Set up graceful shutdown on SIGINT
    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
        tracing::info!("received shutdown signal");
    };

    tokio::select! {
        result = idhub_node::start_api_server(listener, endpoint, &base_path) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "API server error");
                return Err(e);
            }
        }
        _ = shutdown => {
            tracing::info!("initiating graceful shutdown");
        }
    }

    tracing::info!("Identity Hub node exited cleanly");
    Ok(())
}
