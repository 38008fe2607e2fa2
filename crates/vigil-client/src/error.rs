use thiserror::Error;

/// Errors surfaced by the application core.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] vigil_store::StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] vigil_remote::RemoteError),

    #[error("Device error: {0}")]
    Sense(#[from] vigil_sense::SenseError),

    #[error("{0}")]
    Shared(#[from] vigil_shared::SharedError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registration hit an address that already has a local record.
    #[error("An account with this address already exists")]
    AlreadyExists,

    /// Login negative result. Deliberately covers both an absent record
    /// and a credential mismatch; the two are indistinguishable.
    #[error("No account matches this address and secret")]
    NotFound,

    /// An operation that needs a signed-in user found none.
    #[error("No active session")]
    NoSession,

    /// Rejected at the edge before any state was written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A second safety timer was armed while one is running.
    #[error("A safety timer is already armed")]
    TimerAlreadyArmed,

    #[error("State lock poisoned")]
    LockPoisoned,
}
