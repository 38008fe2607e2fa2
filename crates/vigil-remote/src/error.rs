use thiserror::Error;

/// Errors produced by the remote store layer.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The backend cannot be reached. Callers on the alert path treat
    /// this as a degraded (local-only) outcome, never a fatal one.
    #[error("Remote store unreachable")]
    Unreachable,

    /// A path segment was empty or otherwise malformed.
    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
