//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the post archive core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one for its configuration
//! types, its logging conventions and the typed events it broadcasts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
