use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// A host operation raised or rejected; carries the host's own message.
    #[error("{0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
