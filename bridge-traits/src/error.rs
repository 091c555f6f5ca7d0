use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The host cannot perform this operation in its current state, e.g.
    /// reading the position of a decoder that has not been prepared.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    pub fn is_unsupported_operation(&self) -> bool {
        matches!(self, BridgeError::UnsupportedOperation(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
