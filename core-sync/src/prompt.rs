//! Confirmation seam for single-item syncs.
//!
//! Batch runs never prompt.

use async_trait::async_trait;
use core_extract::ExtractedPost;
use core_library::models::ArchivedPost;

/// Short summary of a post shown next to a confirmation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPreview {
    pub caption: String,
    pub media_count: usize,
    /// First displayable image
    pub cover: Option<String>,
}

impl PostPreview {
    pub fn of_record(post: &ArchivedPost) -> Self {
        let cover = post.media.first().map(|slot| {
            if slot.is_video() {
                slot.thumbnail.clone().unwrap_or_else(|| slot.primary.clone())
            } else {
                slot.primary.clone()
            }
        });
        Self {
            caption: post.caption.clone(),
            media_count: post.origin_slots().count(),
            cover,
        }
    }

    pub fn of_extraction(post: &ExtractedPost) -> Self {
        let cover = post
            .media
            .first()
            .map(|media| media.thumbnail.clone().unwrap_or_else(|| media.url.clone()));
        Self {
            caption: post.caption.clone(),
            media_count: post.media.len(),
            cover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Extraction returned nothing; clear the record's media?
    ClearMedia {
        post_id: String,
        shortcode: String,
        diagnostics: String,
    },
    /// Caption or media count changed; apply the fresh data?
    ApplyChanges {
        post_id: String,
        before: PostPreview,
        after: PostPreview,
    },
}

#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// `true` to go ahead.
    async fn confirm(&self, request: &Confirmation) -> bool;
}

/// Answers every request the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConfirmationPrompt for FixedAnswer {
    async fn confirm(&self, _request: &Confirmation) -> bool {
        self.0
    }
}
