use thiserror::Error;

use tandem_shared::CodeError;

/// Errors produced by the registry.
///
/// These surface verbatim to the caller; the session layer never retries on
/// any of them and leaves its local state unchanged on failure.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Unknown invite code, or a record missing required fields.
    #[error("Heart not found")]
    NotFound,

    /// The heart already has a partner; the join race was lost.
    #[error("Heart already paired")]
    AlreadyPaired,

    /// The creator tried to join their own heart.
    #[error("Cannot join your own heart")]
    SelfJoin,

    /// No active account id was supplied.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The underlying store rejected a write.
    #[error("Registry write rejected: {0}")]
    WriteFailure(String),

    /// The registry backend is unreachable.
    #[error("Registry unavailable")]
    NotConnected,

    /// Malformed invite code input.
    #[error("Invalid invite code: {0}")]
    InvalidCode(#[from] CodeError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
