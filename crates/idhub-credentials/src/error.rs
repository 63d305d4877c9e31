/// Signed-token codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed token: {0}")]
    Parse(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("signature verification failed: {0}")]
    Verification(String),

    #[error("claim verification failed: {0}")]
    Claim(String),

    #[error("credential extraction failed: {0}")]
    Extraction(String),
}

/// Fatal verification-pipeline errors. Per-token failures never surface
/// here; they are reported as dropped credentials.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("failed to fetch credentials from hub: {0}")]
    Fetch(#[from] idhub_client::ClientError),
}
