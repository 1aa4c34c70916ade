//! ImgBB upload API types

use serde::{Deserialize, Serialize};

/// Form fields of `POST /1/upload`; the key travels in the query string.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadForm {
    /// Remote URL or bare base64 payload
    pub image: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
}

/// `{"data": {...}, "success": true, "status": 200}`
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub data: Option<UploadData>,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
}

/// `{"error": {"message": "...", "code": 100}, "status_code": 400}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}
