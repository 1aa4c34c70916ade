//! Cloudinary upload API request and response types

use serde::{Deserialize, Serialize};

/// Form fields of an unsigned upload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadForm {
    /// Remote URL or `data:` URI
    pub file: String,
    pub upload_preset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub public_id: String,
}

/// Successful upload response (fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Error envelope: `{"error": {"message": "..."}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}
