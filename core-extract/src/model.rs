//! Extracted post data and the extraction output contract

use core_library::models::{MediaKind, PostKind};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::reference::PostReference;

/// One media item as found at the origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMedia {
    pub kind: MediaKind,
    /// Origin URL (signed, short-lived)
    pub url: String,
    /// Poster frame, videos only
    pub thumbnail: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ExtractedMedia {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.into(),
            thumbnail: None,
            width: None,
            height: None,
        }
    }

    pub fn video(url: impl Into<String>, thumbnail: Option<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            url: url.into(),
            thumbnail,
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width.filter(|w| *w > 0);
        self.height = height.filter(|h| *h > 0);
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Normalized post data produced by one successful strategy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedPost {
    pub shortcode: String,
    pub kind: PostKind,
    pub caption: String,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner_avatar: Option<String>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    /// Publish time, epoch seconds
    pub taken_at: Option<i64>,
    pub media: Vec<ExtractedMedia>,
    pub is_carousel: bool,
    /// Strategy that produced this post
    pub strategy: String,
    /// Query template that worked, structured query strategy only
    pub template: Option<String>,
}

impl ExtractedPost {
    pub fn new(reference: &PostReference, strategy: impl Into<String>) -> Self {
        Self {
            shortcode: reference.shortcode.clone(),
            kind: reference.kind,
            strategy: strategy.into(),
            ..Self::default()
        }
    }

    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

// ============================================================================
// Output contract
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOutput {
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaOutput {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// What the presentation layer and the record store consume.
///
/// Either `success` with non-empty `media`, or a failure with a non-empty `note`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    pub success: bool,
    pub kind: PostKind,
    pub shortcode: String,
    pub caption: String,
    pub timestamp: Option<i64>,
    /// Local ISO date (`YYYY-MM-DD`)
    pub date: Option<String>,
    pub owner: OwnerOutput,
    pub media: Vec<MediaOutput>,
    pub is_carousel: bool,
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExtractionOutput {
    /// Successful output; `date` is the already-converted local date.
    pub fn from_post(post: &ExtractedPost, date: Option<String>) -> Self {
        Self {
            success: true,
            kind: post.kind,
            shortcode: post.shortcode.clone(),
            caption: post.caption.clone(),
            timestamp: post.taken_at,
            date,
            owner: OwnerOutput {
                username: post.owner_username.clone(),
                full_name: post.owner_full_name.clone(),
                avatar: post.owner_avatar.clone(),
            },
            media: post
                .media
                .iter()
                .map(|m| MediaOutput {
                    kind: m.kind,
                    url: m.url.clone(),
                    thumbnail: m.thumbnail.clone(),
                    width: m.width,
                    height: m.height,
                })
                .collect(),
            is_carousel: post.is_carousel,
            strategy: Some(post.strategy.clone()),
            note: None,
        }
    }

    /// Failure output carrying the joined diagnostics.
    pub fn failure(reference: Option<&PostReference>, error: &ExtractError) -> Self {
        let note = error.note();
        Self {
            success: false,
            kind: reference.map(|r| r.kind).unwrap_or_default(),
            shortcode: reference.map(|r| r.shortcode.clone()).unwrap_or_default(),
            caption: String::new(),
            timestamp: None,
            date: None,
            owner: OwnerOutput::default(),
            media: Vec::new(),
            is_carousel: false,
            strategy: None,
            note: Some(if note.is_empty() {
                "extraction failed".to_string()
            } else {
                note
            }),
        }
    }
}
