use thiserror::Error;

/// Errors produced by device-facing collaborators.
#[derive(Error, Debug)]
pub enum SenseError {
    /// The user refused microphone or location access. Surfaced as an
    /// actionable message; the operation simply does not start.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No usable device (microphone, positioning hardware).
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The provider did not produce a result within its time budget.
    #[error("Timed out waiting for a fix")]
    Timeout,

    /// The lookup backend failed or returned garbage.
    #[error("Lookup failed: {0}")]
    Lookup(String),
}
