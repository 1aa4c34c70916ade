//! # Cloudinary Provider
//!
//! Primary storage provider for archived media.
//!
//! ## Overview
//!
//! This module provides:
//! - Unsigned uploads through an upload preset, by remote URL or `data:` URI
//! - Idempotent `public_id`s derived from the source, so retries overwrite
//! - Exponential backoff on rate limiting and server errors
//!
//! The connector implements [`MediaUploader`](bridge_traits::upload::MediaUploader)
//! and is the uploader whose result the reconciliation engine awaits.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::CloudinaryConnector;
pub use error::{CloudinaryError, Result};
