//! Identity Hub CLI: publish, list and verify credentials.
//!
//! Subcommands: vc get, vc add, keygen, verify.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Identity Hub: verifiable credential exchange.
#[derive(Parser, Debug)]
#[command(name = "idhub", version, about, long_about = None)]
struct Cli {
    /// Hub protocol endpoint.
    #[arg(
        long,
        global = true,
        default_value = "http://127.0.0.1:8181/api/identity-hub"
    )]
    hub_url: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage credentials stored at the hub.
    Vc(commands::vc::VcArgs),
    /// Generate an Ed25519 signing key.
    Keygen(commands::keygen::KeygenArgs),
    /// Verify the credentials a DID publishes at its hub.
    Verify(commands::verify::VerifyArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Vc(args) => commands::vc::run(args, &cli.hub_url).await,
        Commands::Keygen(args) => commands::keygen::run(args),
        Commands::Verify(args) => commands::verify::run(args).await,
    }
}
