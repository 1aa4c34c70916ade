//! Upload Collaborator Abstraction
//!
//! A storage provider that accepts media by URL or by raw bytes and answers
//! with a durable locator. The primary and secondary providers both implement
//! [`MediaUploader`]; the dual-provider uploader in `core-backup` decides which
//! one is awaited and which one runs in the background.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// What is being uploaded, as far as provider capabilities go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Image,
    Video,
}

/// Upload input: a remote URL the provider fetches itself, or bytes we
/// already hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Url(String),
    Bytes { data: Bytes, content_type: String },
}

impl MediaSource {
    pub fn url(url: impl Into<String>) -> Self {
        MediaSource::Url(url.into())
    }

    pub fn bytes(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        MediaSource::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Short form for log lines; never includes raw bytes.
    pub fn describe(&self) -> String {
        match self {
            MediaSource::Url(url) => url.split('?').next().unwrap_or(url).to_string(),
            MediaSource::Bytes { data, content_type } => {
                format!("<{} bytes of {}>", data.len(), content_type)
            }
        }
    }

    /// The source as a `data:` URI (bytes) or the URL itself.
    pub fn to_uri(&self) -> String {
        match self {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Bytes { data, content_type } => {
                format!("data:{};base64,{}", content_type, STANDARD.encode(data))
            }
        }
    }

    /// The source as a URL or bare base64 payload.
    pub fn to_url_or_base64(&self) -> String {
        match self {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Bytes { data, .. } => STANDARD.encode(data),
        }
    }

    /// Stable identifier derived from the source, so a retried upload of the
    /// same input maps onto the same remote object.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            MediaSource::Url(url) => {
                // Signed CDN URLs rotate their query string; the path identifies the asset.
                hasher.update(url.split('?').next().unwrap_or(url).as_bytes())
            }
            MediaSource::Bytes { data, .. } => hasher.update(data),
        }
        let digest = hasher.finalize();
        digest
            .iter()
            .take(10)
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

/// Storage provider capable of storing media and returning a locator.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::upload::{MediaSource, MediaUploader};
///
/// async fn store(provider: &dyn MediaUploader) -> Result<String> {
///     provider.upload(&MediaSource::url("https://cdn.example.com/a.jpg")).await
/// }
/// ```
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Provider name for logs and diagnostics
    fn name(&self) -> &str;

    /// Whether this provider can store the given kind of content
    fn accepts(&self, kind: ContentKind) -> bool {
        let _ = kind;
        true
    }

    /// Store `source` and return the durable locator (usually an HTTPS URL).
    async fn upload(&self, source: &MediaSource) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_strips_query() {
        let source = MediaSource::url("https://cdn.example.com/a.jpg?sig=secret");
        assert_eq!(source.describe(), "https://cdn.example.com/a.jpg");

        let source = MediaSource::bytes(vec![1u8, 2, 3], "image/png");
        assert_eq!(source.describe(), "<3 bytes of image/png>");
    }

    #[test]
    fn test_data_uri_encoding() {
        let source = MediaSource::bytes(b"hi".to_vec(), "image/png");
        assert_eq!(source.to_uri(), "data:image/png;base64,aGk=");
        assert_eq!(source.to_url_or_base64(), "aGk=");
    }

    #[test]
    fn test_fingerprint_ignores_rotating_query() {
        let a = MediaSource::url("https://cdn.example.com/a.jpg?oh=1&oe=2");
        let b = MediaSource::url("https://cdn.example.com/a.jpg?oh=3&oe=4");
        let c = MediaSource::url("https://cdn.example.com/b.jpg");

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 20);
    }
}
