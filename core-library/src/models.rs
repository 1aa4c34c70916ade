//! Archived post records
//!
//! The persisted side of the archive: one [`ArchivedPost`] per source post,
//! holding an ordered list of [`StoredMediaSlot`]s. Records are owned by the
//! record store ([`PostRepository`](crate::repositories::PostRepository));
//! everything else works on copies and writes back through `update`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LibraryError;

// ============================================================================
// Classification enums
// ============================================================================

/// Post kind, derived from the reference URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    #[default]
    Standard,
    ShortVideo,
    LongVideo,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Standard => "standard",
            PostKind::ShortVideo => "short_video",
            PostKind::LongVideo => "long_video",
        }
    }

    /// Storage bucket the post is routed to.
    pub fn bucket(&self) -> &'static str {
        match self {
            PostKind::Standard => "default",
            PostKind::ShortVideo => "reels",
            PostKind::LongVideo => "tv",
        }
    }
}

impl FromStr for PostKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(PostKind::Standard),
            "short_video" => Ok(PostKind::ShortVideo),
            "long_video" => Ok(PostKind::LongVideo),
            _ => Err(LibraryError::InvalidInput {
                field: "kind".to_string(),
                message: format!("unknown post kind '{}'", s),
            }),
        }
    }
}

/// Media kind of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Account flavour of the archived post.
///
/// `Extra` accounts carry their canonical date in the caption text rather
/// than in the publish timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Standard,
    Extra,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Standard => "standard",
            AccountKind::Extra => "extra",
        }
    }
}

impl FromStr for AccountKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(AccountKind::Standard),
            "extra" => Ok(AccountKind::Extra),
            _ => Err(LibraryError::InvalidInput {
                field: "account".to_string(),
                message: format!("unknown account kind '{}'", s),
            }),
        }
    }
}

// ============================================================================
// Media slots
// ============================================================================

/// One position in a post's media list, with its own backup state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMediaSlot {
    pub kind: MediaKind,
    /// Primary-store locator (for videos: the origin stream URL)
    pub primary: String,
    /// Secondary-store copy of `primary`, filled asynchronously
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Video thumbnail locator on the primary store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_secondary: Option<String>,
    /// Added by hand (external embed etc.); never reconciled
    #[serde(default)]
    pub manual: bool,
}

impl StoredMediaSlot {
    pub fn image(primary: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            primary: primary.into(),
            secondary: None,
            thumbnail: None,
            thumbnail_secondary: None,
            manual: false,
        }
    }

    pub fn video(primary: impl Into<String>, thumbnail: Option<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            primary: primary.into(),
            secondary: None,
            thumbnail,
            thumbnail_secondary: None,
            manual: false,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn with_thumbnail_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.thumbnail_secondary = Some(secondary.into());
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

// ============================================================================
// Archived post
// ============================================================================

/// Persisted record of one source post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedPost {
    pub id: String,
    pub source_url: String,
    pub shortcode: String,
    pub kind: PostKind,
    pub account: AccountKind,
    pub caption: String,
    pub owner_username: Option<String>,
    pub owner_full_name: Option<String>,
    pub owner_avatar: Option<String>,
    pub like_count: Option<i64>,
    pub comment_count: Option<i64>,
    /// Publish time, epoch seconds
    pub posted_at: Option<i64>,
    /// Local civil date, `YYYY-MM-DD`
    pub local_date: Option<String>,
    /// Local civil time, `HH:MM:SS`
    pub local_time: Option<String>,
    pub media: Vec<StoredMediaSlot>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ArchivedPost {
    /// New empty record with a fresh id.
    pub fn new(source_url: impl Into<String>, shortcode: impl Into<String>, kind: PostKind) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            source_url: source_url.into(),
            shortcode: shortcode.into(),
            kind,
            account: AccountKind::Standard,
            caption: String::new(),
            owner_username: None,
            owner_full_name: None,
            owner_avatar: None,
            like_count: None,
            comment_count: None,
            posted_at: None,
            local_date: None,
            local_time: None,
            media: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_account(mut self, account: AccountKind) -> Self {
        self.account = account;
        self
    }

    pub fn with_media(mut self, media: Vec<StoredMediaSlot>) -> Self {
        self.media = media;
        self
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }

    /// Slots that have an origin counterpart.
    pub fn origin_slots(&self) -> impl Iterator<Item = &StoredMediaSlot> {
        self.media.iter().filter(|slot| !slot.manual)
    }

    pub fn has_video(&self) -> bool {
        self.media.iter().any(|slot| !slot.manual && slot.is_video())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Post id cannot be empty".to_string());
        }
        if self.shortcode.trim().is_empty() {
            return Err("Shortcode cannot be empty".to_string());
        }
        if let Some(index) = self.media.iter().position(|slot| slot.primary.trim().is_empty()) {
            return Err(format!("Media slot {} has no primary locator", index));
        }
        Ok(())
    }
}

impl fmt::Display for ArchivedPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} media)", self.shortcode, self.id, self.media.len())
    }
}
