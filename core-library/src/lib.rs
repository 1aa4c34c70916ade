//! # Library Management Module
//!
//! Owns archived post records and the record-store seam the rest of the
//! core writes through.
//!
//! ## Overview
//!
//! This module manages:
//! - The [`ArchivedPost`] / [`StoredMediaSlot`] data model
//! - The [`PostRepository`] collaborator trait (`create`, `update`, `delete`, `list`)
//! - An in-memory store and a SQLite store (media slots kept as JSON)
//! - SQLite pool creation with schema setup

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{AccountKind, ArchivedPost, MediaKind, PostKind, StoredMediaSlot};
pub use repositories::{InMemoryPostRepository, PostRepository, SqlitePostRepository};
