//! `idhub keygen`: Generate an Ed25519 signing key.

use clap::Args;
use std::path::PathBuf;

use idhub_crypto::KeyPair;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// File to write the hex-encoded private seed to.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &KeygenArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }

    let keypair = KeyPair::generate();
    std::fs::write(&args.output, keypair.secret_hex().as_bytes())?;

    let public_key = keypair.public_key();
    println!("Key written to {}", args.output.display());
    println!("  Public key (hex):    {}", public_key.to_hex());
    println!("  Public key (base58): {}", public_key.to_bs58());
    Ok(())
}
