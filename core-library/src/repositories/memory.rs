//! In-memory record store

use async_trait::async_trait;
use core_async::sync::RwLock;

use super::PostRepository;
use crate::error::{LibraryError, Result};
use crate::models::ArchivedPost;

/// Keeps records in insertion order behind an async lock.
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<Vec<ArchivedPost>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded store, mostly for tests.
    pub fn with_posts(posts: Vec<ArchivedPost>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }
}

fn invalid(message: String) -> LibraryError {
    LibraryError::InvalidInput {
        field: "ArchivedPost".to_string(),
        message,
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: &ArchivedPost) -> Result<()> {
        post.validate().map_err(invalid)?;

        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(invalid(format!("post {} already exists", post.id)));
        }
        posts.push(post.clone());
        Ok(())
    }

    async fn update(&self, post: &ArchivedPost) -> Result<()> {
        post.validate().map_err(invalid)?;

        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => {
                *slot = post.clone();
                Ok(())
            }
            None => Err(LibraryError::NotFound {
                entity_type: "ArchivedPost".to_string(),
                id: post.id.clone(),
            }),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }

    async fn list(&self) -> Result<Vec<ArchivedPost>> {
        Ok(self.posts.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedPost>> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }
}
