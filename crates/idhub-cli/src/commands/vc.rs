//! `idhub vc`: Read and publish credentials at a hub.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use idhub_client::HubClient;
use idhub_core::VerifiableCredential;
use idhub_credentials::CredentialIssuer;
use idhub_crypto::KeyPair;

use super::read_inline_or_file;

#[derive(Args, Debug)]
pub struct VcArgs {
    #[command(subcommand)]
    pub command: VcCommand,
}

#[derive(Subcommand, Debug)]
pub enum VcCommand {
    /// List the tokens stored at the hub.
    Get,
    /// Sign a credential and write it to the hub.
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Credential JSON `{"id": ..., "claims": {...}}` (inline or path to file).
    #[arg(short, long)]
    pub credential: String,

    /// Issuer DID.
    #[arg(short, long)]
    pub issuer: String,

    /// Subject DID.
    #[arg(short = 'b', long)]
    pub subject: String,

    /// File holding the issuer's hex-encoded private seed.
    #[arg(short = 'k', long)]
    pub private_key: PathBuf,
}

pub async fn run(args: &VcArgs, hub_url: &str) -> anyhow::Result<()> {
    match &args.command {
        VcCommand::Get => get(hub_url).await,
        VcCommand::Add(add_args) => add(add_args, hub_url).await,
    }
}

async fn get(hub_url: &str) -> anyhow::Result<()> {
    let tokens = HubClient::new()
        .fetch_credentials(hub_url)
        .await
        .map_err(|e| anyhow::anyhow!("could not list credentials at {}: {}", hub_url, e))?;

    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}

async fn add(args: &AddArgs, hub_url: &str) -> anyhow::Result<()> {
    let json_str = read_inline_or_file(&args.credential)?;
    let credential: VerifiableCredential = serde_json::from_str(&json_str)
        .map_err(|e| anyhow::anyhow!("invalid credential JSON: {}", e))?;

    let seed = std::fs::read_to_string(&args.private_key).map_err(|e| {
        anyhow::anyhow!("cannot read key file {}: {}", args.private_key.display(), e)
    })?;
    let keypair = KeyPair::from_hex(&seed)?;

    let issuer = CredentialIssuer::new(args.issuer.clone(), keypair);
    let token = issuer.issue(&credential, &args.subject)?;

    HubClient::new()
        .submit_credential(hub_url, &token)
        .await
        .map_err(|e| anyhow::anyhow!("could not write credential to {}: {}", hub_url, e))?;

    println!("Credential written!");
    println!("  ID:       {}", credential.id());
    println!("  Issuer:   {}", issuer.did());
    println!("  Subject:  {}", args.subject);
    println!("  Hub:      {}", hub_url);
    Ok(())
}
