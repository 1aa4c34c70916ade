//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with rustls, connection pooling, retry with
//!   exponential backoff and browser-like default headers (the extraction
//!   source rejects obviously scripted clients).
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! // Hand it to the extraction pipeline, health checker and providers
//! ```

mod http;

pub use http::{ReqwestHttpClient, DEFAULT_USER_AGENT};
