/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// Reserved for persistent store backends.
    #[error("store error: {0}")]
    Store(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
