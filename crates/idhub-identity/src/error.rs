/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("DID resolution failed: {0}")]
    Resolution(String),

    #[error("no usable public key for {did}: {reason}")]
    InvalidKey { did: String, reason: String },

    #[error("crypto error: {0}")]
    Crypto(#[from] idhub_crypto::CryptoError),
}
