//! # ImgBB Provider
//!
//! Secondary storage provider. Holds a second copy of images and video
//! thumbnails so a dead primary locator can be promoted from here instead of
//! re-fetching from the origin.
//!
//! Uploads run off the critical path (see `core-backup`), so the connector
//! makes a single attempt and lets the caller decide whether to care.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::ImgbbConnector;
pub use error::{ImgbbError, Result};
