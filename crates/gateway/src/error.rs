use ebloodbank_core::{TransitionError, ValidationError};
use ebloodbank_store::StoreError;
use thiserror::Error;

/// Errors returned by gateway workflows.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An input field failed validation. Nothing was written.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The request state machine refused the transition.
    #[error("{0}")]
    Transition(#[from] TransitionError),

    /// The caller's principal may not perform the operation.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// A referenced entity does not exist or is not visible to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store failed; the operation was rolled back.
    #[error("store error: {0}")]
    Store(StoreError),

    /// The gateway was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            other => Self::Store(other),
        }
    }
}
