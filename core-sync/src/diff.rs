//! Change detection between a recorded post and a fresh extraction.
//!
//! Captions are compared after trimming, and a fresh caption that trims to
//! nothing never counts as a change. Media counts compare the fresh list with
//! the recorded slots that have an origin counterpart (manual slots excluded).

use core_extract::ExtractedPost;
use core_library::models::ArchivedPost;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDiff {
    /// `(recorded, fresh)` origin media counts, when they differ
    pub media_count: Option<(usize, usize)>,
    /// `(recorded, fresh)` trimmed captions, when they differ
    pub caption: Option<(String, String)>,
}

impl PostDiff {
    pub fn compute(recorded: &ArchivedPost, fresh: &ExtractedPost) -> Self {
        let recorded_count = recorded.origin_slots().count();
        let fresh_count = fresh.media.len();

        let recorded_caption = normalize_caption(&recorded.caption);
        let fresh_caption = normalize_caption(&fresh.caption);

        Self {
            media_count: (recorded_count != fresh_count).then_some((recorded_count, fresh_count)),
            caption: (!fresh_caption.is_empty() && fresh_caption != recorded_caption)
                .then(|| (recorded_caption.to_string(), fresh_caption.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.media_count.is_none() && self.caption.is_none()
    }
}

pub fn normalize_caption(caption: &str) -> &str {
    caption.trim()
}
