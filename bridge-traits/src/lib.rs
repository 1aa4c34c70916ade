//! # Host Bridge Traits
//!
//! Capability contracts the archive core calls into but does not implement.
//!
//! ## Overview
//!
//! The extraction pipeline, the health checker and the upload path never talk
//! to the network directly. They depend on the traits below, which the host
//! (or `bridge-desktop`) implements. Tests substitute canned implementations.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP with retry policy
//!
//! ### Storage providers
//! - [`MediaUploader`](upload::MediaUploader) - Store media by URL or bytes, return a locator
//!
//! ### Utilities
//! - [`LogLevel`](log::LogLevel) - Verbosity hosts pass to the logging layer
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Provider
//! crates convert their own error enums into it at the trait boundary.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across spawned tasks behind `Arc`.
//!
//! ## Examples
//!
//! ### Implementing MediaUploader
//!
//! ```ignore
//! use bridge_traits::upload::{MediaSource, MediaUploader};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct LocalMirror;
//!
//! #[async_trait]
//! impl MediaUploader for LocalMirror {
//!     fn name(&self) -> &str {
//!         "local-mirror"
//!     }
//!
//!     async fn upload(&self, source: &MediaSource) -> Result<String> {
//!         Ok(format!("file:///mirror/{}", source.fingerprint()))
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod log;
pub mod upload;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::LogLevel;
pub use upload::{ContentKind, MediaSource, MediaUploader};
