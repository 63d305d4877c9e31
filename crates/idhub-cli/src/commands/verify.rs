//! `idhub verify`: Run the verification pipeline against a DID's hub.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use idhub_client::HubClient;
use idhub_credentials::CredentialVerificationPipeline;
use idhub_crypto::PublicKey;
use idhub_identity::{DidDocument, StaticKeyResolver};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// DID document of the participant whose credentials are verified.
    #[arg(short, long)]
    pub did_document: PathBuf,

    /// Trusted issuer key as `<did>=<base58 public key>`. Repeatable.
    #[arg(short, long = "issuer-key", value_parser = parse_issuer_key)]
    pub issuer_keys: Vec<(String, String)>,
}

fn parse_issuer_key(value: &str) -> Result<(String, String), String> {
    // DIDs contain ':' but never '='
    let (did, key) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected <did>=<base58 key>, got '{}'", value))?;
    if did.is_empty() || key.is_empty() {
        return Err(format!("expected <did>=<base58 key>, got '{}'", value));
    }
    Ok((did.to_string(), key.to_string()))
}

pub async fn run(args: &VerifyArgs) -> anyhow::Result<()> {
    let document: DidDocument = serde_json::from_str(&std::fs::read_to_string(&args.did_document)?)
        .map_err(|e| anyhow::anyhow!("invalid DID document: {}", e))?;

    let keys = StaticKeyResolver::new();
    for (did, encoded) in &args.issuer_keys {
        let key = PublicKey::from_bs58(encoded)
            .map_err(|e| anyhow::anyhow!("invalid key for {}: {}", did, e))?;
        keys.insert(did.clone(), key);
    }

    let pipeline = CredentialVerificationPipeline::new(Arc::new(HubClient::new()), Arc::new(keys));
    let result = pipeline.get_verified_claims(&document).await?;

    println!("Verified credentials for {}", document.id);
    println!("  Accepted: {}", result.credential_ids.len());
    println!("  Dropped:  {}", result.dropped.len());
    for dropped in &result.dropped {
        println!("    [#{}] {}: {}", dropped.index, dropped.reason, dropped.detail);
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&result.claims)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_issuer_key() {
        let (did, key) = parse_issuer_key("did:web:issuer=3yZe7d").unwrap();
        assert_eq!(did, "did:web:issuer");
        assert_eq!(key, "3yZe7d");
    }

    #[test]
    fn test_parse_issuer_key_rejects_missing_parts() {
        assert!(parse_issuer_key("did:web:issuer").is_err());
        assert!(parse_issuer_key("=abc").is_err());
        assert!(parse_issuer_key("did:web:x=").is_err());
    }
}
