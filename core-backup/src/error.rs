use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackupError {
    /// Fatal for the slot; the caller keeps whatever locator it had.
    #[error("Primary upload of {origin} failed: {message}")]
    UploadPrimary { origin: String, message: String },

    /// Only ever logged.
    #[error("Secondary upload to {provider} failed: {message}")]
    UploadSecondary { provider: String, message: String },
}

pub type Result<T> = std::result::Result<T, BackupError>;
