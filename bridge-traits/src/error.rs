use thiserror::Error;

/// Error surfaced across every host capability boundary.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The capability cannot serve this request at all (for example a
    /// provider that does not take video).
    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
