//! # Repository Pattern Implementation
//!
//! The record store collaborator. The core never talks to physical storage
//! directly; every persisted media slot change goes through
//! [`PostRepository::update`].
//!
//! ## Available Implementations
//!
//! - [`SqlitePostRepository`] - sqlx-backed, media slots stored as JSON
//! - [`InMemoryPostRepository`] - for hosts that persist elsewhere, and tests

use crate::error::Result;
use crate::models::ArchivedPost;
use async_trait::async_trait;

pub mod memory;
pub mod post;

pub use memory::InMemoryPostRepository;
pub use post::SqlitePostRepository;

/// Record store for archived posts
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a new record
    ///
    /// # Errors
    /// Returns error if a record with the same id exists or validation fails.
    async fn create(&self, post: &ArchivedPost) -> Result<()>;

    /// Replace an existing record
    ///
    /// # Errors
    /// Returns `LibraryError::NotFound` if no record has this id.
    async fn update(&self, post: &ArchivedPost) -> Result<()>;

    /// Delete a record by id
    ///
    /// # Returns
    /// - `Ok(true)` if the record was deleted
    /// - `Ok(false)` if it did not exist
    async fn delete(&self, id: &str) -> Result<bool>;

    /// All records, oldest first
    async fn list(&self) -> Result<Vec<ArchivedPost>>;

    /// Find a record by id
    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedPost>>;
}
