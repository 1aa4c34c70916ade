//! Error types for the Cloudinary provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Cloudinary provider errors
#[derive(Error, Debug)]
pub enum CloudinaryError {
    /// Upload API returned an error
    #[error("Cloudinary API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit exceeded after all retries
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Response parsed but carried no usable locator
    #[error("Upload response did not include a secure_url")]
    MissingLocator,

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Cloudinary operations
pub type Result<T> = std::result::Result<T, CloudinaryError>;

impl From<CloudinaryError> for BridgeError {
    fn from(error: CloudinaryError) -> Self {
        match error {
            CloudinaryError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(format!("cloudinary: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CloudinaryError::ApiError {
            status_code: 400,
            message: "Upload preset not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Cloudinary API error (status 400): Upload preset not found"
        );
    }

    #[test]
    fn test_error_conversion() {
        let bridge_error: BridgeError = CloudinaryError::MissingLocator.into();
        assert!(matches!(bridge_error, BridgeError::OperationFailed(ref m) if m.starts_with("cloudinary:")));

        let bridge_error: BridgeError = CloudinaryError::BridgeError(BridgeError::Timeout(500)).into();
        assert!(matches!(bridge_error, BridgeError::Timeout(500)));
    }
}
