use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use idhub_crypto::PublicKey;

use crate::did_resolver::DidResolver;
use crate::error::IdentityError;

/// Resolves the public key a credential issuer signs with.
#[async_trait]
pub trait DidPublicKeyResolver: Send + Sync {
    /// Resolve the signing key of `issuer_did`.
    async fn resolve_public_key(&self, issuer_did: &str) -> Result<PublicKey, IdentityError>;
}

/// Fixed DID → key table.
#[derive(Debug, Default)]
pub struct StaticKeyResolver {
    keys: DashMap<String, PublicKey>,
}

impl StaticKeyResolver {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the key of an issuer.
    pub fn insert(&self, did: impl Into<String>, key: PublicKey) {
        self.keys.insert(did.into(), key);
    }

    /// Remove an issuer. Returns whether it was present.
    pub fn remove(&self, did: &str) -> bool {
        self.keys.remove(did).is_some()
    }

    /// Number of known issuers.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl DidPublicKeyResolver for StaticKeyResolver {
    async fn resolve_public_key(&self, issuer_did: &str) -> Result<PublicKey, IdentityError> {
        self.keys
            .get(issuer_did)
            .map(|k| k.value().clone())
            .ok_or_else(|| IdentityError::DidNotFound(issuer_did.to_string()))
    }
}

/// Resolves the issuer's DID document and decodes its first Ed25519
/// verification method.
pub struct DocumentKeyResolver {
    resolver: Arc<dyn DidResolver>,
}

impl DocumentKeyResolver {
    /// Create a key resolver backed by a DID resolver.
    pub fn new(resolver: Arc<dyn DidResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DidPublicKeyResolver for DocumentKeyResolver {
    async fn resolve_public_key(&self, issuer_did: &str) -> Result<PublicKey, IdentityError> {
        let document = self.resolver.resolve(issuer_did).await?;
        let encoded = document
            .primary_ed25519_key()
            .ok_or_else(|| IdentityError::InvalidKey {
                did: issuer_did.to_string(),
                reason: "document has no Ed25519 verification method".into(),
            })?;
        PublicKey::from_bs58(encoded).map_err(|e| IdentityError::InvalidKey {
            did: issuer_did.to_string(),
            reason: e.to_string(),
        })
    }
}
