//! Error types for the ImgBB provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImgbbError {
    #[error("ImgBB API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// ImgBB stores images only
    #[error("Unsupported content for ImgBB: {0}")]
    Unsupported(String),

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Upload response did not include data.url")]
    MissingLocator,

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, ImgbbError>;

impl From<ImgbbError> for BridgeError {
    fn from(error: ImgbbError) -> Self {
        match error {
            ImgbbError::BridgeError(e) => e,
            ImgbbError::Unsupported(msg) => BridgeError::NotAvailable(msg),
            other => BridgeError::OperationFailed(format!("imgbb: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ImgbbError::ApiError {
            status_code: 400,
            message: "Invalid API v1 key.".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "ImgBB API error (status 400): Invalid API v1 key."
        );
    }

    #[test]
    fn test_unsupported_maps_to_not_available() {
        let bridge_error: BridgeError = ImgbbError::Unsupported("video/mp4".to_string()).into();
        assert!(matches!(bridge_error, BridgeError::NotAvailable(_)));
    }
}
