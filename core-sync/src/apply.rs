//! Folding a fresh extraction into an archived record.

use core_extract::ExtractedPost;
use core_library::models::{AccountKind, ArchivedPost, StoredMediaSlot};
use core_runtime::config::SyncConfig;
use tracing::debug;

use crate::diff::normalize_caption;
use crate::timestamp::{caption_date, local_stamp};

/// Write `fresh` and the reconciled `slots` into `post`.
///
/// Best-effort fields only overwrite when the extraction produced them, and
/// an empty caption never replaces a recorded one. For `Extra` accounts a
/// date found in the caption wins over the timestamp-derived date.
pub fn apply_extraction(
    post: &mut ArchivedPost,
    fresh: &ExtractedPost,
    slots: Vec<StoredMediaSlot>,
    config: &SyncConfig,
) {
    post.media = slots;

    if !normalize_caption(&fresh.caption).is_empty() {
        post.caption = fresh.caption.clone();
    }

    if fresh.owner_username.is_some() {
        post.owner_username = fresh.owner_username.clone();
    }
    if fresh.owner_full_name.is_some() {
        post.owner_full_name = fresh.owner_full_name.clone();
    }
    if fresh.owner_avatar.is_some() {
        post.owner_avatar = fresh.owner_avatar.clone();
    }
    if fresh.like_count.is_some() {
        post.like_count = fresh.like_count;
    }
    if fresh.comment_count.is_some() {
        post.comment_count = fresh.comment_count;
    }

    if let Some(taken_at) = fresh.taken_at {
        post.posted_at = Some(taken_at);
        if let Some(stamp) = local_stamp(taken_at, config.utc_offset_hours) {
            post.local_date = Some(stamp.date);
            post.local_time = Some(stamp.time);
        }
    }

    if post.account == AccountKind::Extra {
        if let Some(date) = caption_date(&post.caption, &config.caption_date_formats) {
            debug!(shortcode = %post.shortcode, %date, "Caption date overrides timestamp");
            post.local_date = Some(date.format("%Y-%m-%d").to_string());
        }
    }

    post.touch();
}
