//! Post references
//!
//! A [`PostReference`] is the shortcode plus the post kind, recovered from any
//! URL shape the source hands out (canonical, mobile host, user-prefixed,
//! short link). Kind classification depends on the URL alone.

use core_library::models::PostKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{ExtractError, Result};

/// Host, optional user segment, type segment, shortcode.
static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:https?://)?(?:(?:www|m)\.)?(?:instagram\.com|instagr\.am)/(?:[A-Za-z0-9._]+/)?(p|reels?|tv)/([A-Za-z0-9_-]{5,})(?:[/?#]|$)",
    )
    .expect("reference pattern is valid")
});

const SHORTCODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Public shortcodes encode the media id in their first 11 characters;
/// longer codes carry a private-post suffix.
const MEDIA_ID_CHARS: usize = 11;

const BASE_URL: &str = "https://www.instagram.com";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostReference {
    pub shortcode: String,
    pub kind: PostKind,
}

impl PostReference {
    pub fn new(shortcode: impl Into<String>, kind: PostKind) -> Self {
        Self {
            shortcode: shortcode.into(),
            kind,
        }
    }

    /// Parse any recognizable post, reel or tv URL.
    pub fn parse(url: &str) -> Result<Self> {
        let trimmed = url.trim();
        let caps = REFERENCE_RE
            .captures(trimmed)
            .ok_or_else(|| ExtractError::InvalidReference(trimmed.to_string()))?;

        let kind = match caps[1].to_ascii_lowercase().as_str() {
            "reel" | "reels" => PostKind::ShortVideo,
            "tv" => PostKind::LongVideo,
            _ => PostKind::Standard,
        };

        Ok(Self::new(&caps[2], kind))
    }

    /// Storage bucket for this post kind.
    pub fn bucket(&self) -> &'static str {
        self.kind.bucket()
    }

    /// Canonical public page.
    pub fn canonical_url(&self) -> String {
        format!("{}/p/{}/", BASE_URL, self.shortcode)
    }

    /// Simplified embeddable rendering.
    pub fn embed_url(&self) -> String {
        format!("{}/p/{}/embed/captioned/", BASE_URL, self.shortcode)
    }

    /// Numeric media id decoded from the shortcode, used by the mobile endpoint.
    pub fn media_id(&self) -> Option<u128> {
        self.shortcode
            .bytes()
            .take(MEDIA_ID_CHARS)
            .try_fold(0u128, |id, byte| {
                let digit = SHORTCODE_ALPHABET.iter().position(|&c| c == byte)?;
                Some(id * 64 + digit as u128)
            })
    }
}

impl fmt::Display for PostReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.shortcode)
    }
}
