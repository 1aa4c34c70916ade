//! HTML and JSON parsing for post pages
//!
//! Everything that pattern-matches third-party markup lives here, behind the
//! [`PostParser`] capability and a handful of pure functions, so it can be
//! exercised with literal fixtures and swapped without touching the strategies.

use core_library::models::MediaKind;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use crate::model::{ExtractedMedia, ExtractedPost};
use crate::reference::PostReference;

/// Inline blobs, tried in order. The payload starts at the first `{` after the marker.
const BLOB_MARKERS: &[&str] = &["window.__additionalDataLoaded(", "window._sharedData ="];

/// Escaped JSON string holding the whole embed context.
const CONTEXT_JSON_MARKER: &str = "\"contextJSON\":";

/// Path segment used by profile pictures on the CDN.
const PROFILE_PICTURE_SEGMENT: &str = "/t51.2885-19/";

const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".heic", ".mp4"];

/// Nesting bound for the post node search.
const MAX_SEARCH_DEPTH: usize = 48;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[A-Za-z0-9.-]+/[^\s"'<>()\\]+"#).expect("url pattern is valid")
});

// property/name before content
static META_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta\s+(?:[^>]*?\s)?(?:property|name)\s*=\s*["']og:(\w+)["'][^>]*?\scontent\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*/?\s*>"#,
    )
    .expect("meta pattern is valid")
});

// content before property/name
static META_REV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<meta\s+(?:[^>]*?\s)?content\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*?\s(?:property|name)\s*=\s*["']og:(\w+)["'][^>]*/?\s*>"#,
    )
    .expect("reversed meta pattern is valid")
});

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<time[^>]*\sdatetime\s*=\s*["']([^"']+)["']"#).expect("time pattern is valid")
});

static COUNTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([\d.,]+[KM]?)\s+likes?,\s*([\d.,]+[KM]?)\s+comments?")
        .expect("counts pattern is valid")
});

static HANDLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._]+) on (?:Instagram|[A-Z][a-z]+ \d{1,2}, \d{4})")
        .expect("handle pattern is valid")
});

static QUOTED_CAPTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s):\s*["“](.*)["”]\s*\.?\s*$"#).expect("caption pattern is valid")
});

static TITLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?) on Instagram").expect("title pattern is valid")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#\d+|[a-zA-Z]+);").expect("entity pattern is valid")
});

// ============================================================================
// Parser capability
// ============================================================================

/// Turns a page that embeds structured post data into a post.
pub trait PostParser: Send + Sync {
    /// `None` when no inline blob with a usable post node is present.
    fn parse_embedded_post(&self, html: &str, reference: &PostReference) -> Option<ExtractedPost>;
}

/// Default parser: inline JSON blobs in the known embedding patterns.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPostParser;

impl PostParser for HtmlPostParser {
    fn parse_embedded_post(&self, html: &str, reference: &PostReference) -> Option<ExtractedPost> {
        embedded_blobs(html)
            .iter()
            .find_map(|blob| post_from_json(blob, reference))
    }
}

/// Inline JSON blobs found in `html`, in pattern order.
pub fn embedded_blobs(html: &str) -> Vec<Value> {
    let mut blobs = Vec::new();

    for marker in BLOB_MARKERS {
        if let Some(value) = html
            .find(marker)
            .and_then(|at| json_object_after(html, at + marker.len()))
        {
            blobs.push(value);
        }
    }

    if let Some(value) = html
        .find(CONTEXT_JSON_MARKER)
        .and_then(|at| escaped_json_after(html, at + CONTEXT_JSON_MARKER.len()))
    {
        blobs.push(value);
    }

    blobs
}

/// First JSON object starting at or after `from`; trailing text is ignored.
fn json_object_after(html: &str, from: usize) -> Option<Value> {
    let start = from + html.get(from..)?.find('{')?;
    let mut stream = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) if value.is_object() => Some(value),
        _ => None,
    }
}

/// A JSON string literal at `from` whose contents are themselves JSON.
fn escaped_json_after(html: &str, from: usize) -> Option<Value> {
    let start = from + html.get(from..)?.find('"')?;
    let mut stream = serde_json::Deserializer::from_str(&html[start..]).into_iter::<String>();
    let inner = stream.next()?.ok()?;
    serde_json::from_str::<Value>(&inner).ok().filter(Value::is_object)
}

// ============================================================================
// Post nodes
// ============================================================================

/// A recognizable post inside arbitrary JSON.
#[derive(Debug, Clone, Copy)]
pub enum PostNode<'a> {
    /// Web GraphQL shape (`shortcode_media` and friends)
    Graph(&'a Value),
    /// Private mobile API item
    Mobile(&'a Value),
}

/// Depth-first search for the first post node.
pub fn find_post_node(value: &Value) -> Option<PostNode<'_>> {
    find_post_node_at(value, 0)
}

fn find_post_node_at(value: &Value, depth: usize) -> Option<PostNode<'_>> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            for key in ["xdt_shortcode_media", "shortcode_media"] {
                if let Some(node) = map.get(key).filter(|n| n.is_object()) {
                    return Some(PostNode::Graph(node));
                }
            }
            if let Some(item) = map
                .get("items")
                .and_then(|items| items.get(0))
                .filter(|item| is_mobile_item(item))
            {
                return Some(PostNode::Mobile(item));
            }
            if map.contains_key("display_url")
                && (map.contains_key("shortcode") || map.contains_key("__typename"))
            {
                return Some(PostNode::Graph(value));
            }
            map.values().find_map(|child| find_post_node_at(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| find_post_node_at(child, depth + 1)),
        _ => None,
    }
}

fn is_mobile_item(item: &Value) -> bool {
    ["image_versions2", "video_versions", "carousel_media"]
        .iter()
        .any(|key| item.get(key).is_some_and(|v| !v.is_null()))
}

/// Normalize whatever post node `value` holds; `None` without media.
pub fn post_from_json(value: &Value, reference: &PostReference) -> Option<ExtractedPost> {
    let post = match find_post_node(value)? {
        PostNode::Graph(node) => normalize_graph_node(node, reference),
        PostNode::Mobile(item) => normalize_mobile_item(item, reference),
    };
    post.has_media().then_some(post)
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))?
        .as_str()
        .filter(|s| !s.is_empty())
}

fn i64_at(value: &Value, path: &[&str]) -> Option<i64> {
    path.iter().try_fold(value, |v, key| v.get(key))?.as_i64()
}

fn u32_at(value: &Value, path: &[&str]) -> Option<u32> {
    i64_at(value, path).and_then(|n| u32::try_from(n).ok())
}

pub fn normalize_graph_node(node: &Value, reference: &PostReference) -> ExtractedPost {
    let mut post = ExtractedPost::new(reference, "");

    post.caption = node
        .pointer("/edge_media_to_caption/edges/0/node/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    post.owner_username = str_at(node, &["owner", "username"]).map(str::to_string);
    post.owner_full_name = str_at(node, &["owner", "full_name"]).map(str::to_string);
    post.owner_avatar = str_at(node, &["owner", "profile_pic_url"]).map(str::to_string);
    post.like_count = i64_at(node, &["edge_media_preview_like", "count"])
        .or_else(|| i64_at(node, &["edge_liked_by", "count"]));
    post.comment_count = i64_at(node, &["edge_media_to_parent_comment", "count"])
        .or_else(|| i64_at(node, &["edge_media_to_comment", "count"]))
        .or_else(|| i64_at(node, &["edge_media_preview_comment", "count"]));
    post.taken_at = i64_at(node, &["taken_at_timestamp"]);

    let children: Vec<&Value> = node
        .pointer("/edge_sidecar_to_children/edges")
        .and_then(Value::as_array)
        .map(|edges| edges.iter().filter_map(|edge| edge.get("node")).collect())
        .unwrap_or_default();

    if children.is_empty() {
        post.media = graph_media(node).into_iter().collect();
    } else {
        post.is_carousel = true;
        post.media = children.into_iter().filter_map(graph_media).collect();
    }

    post
}

fn graph_media(node: &Value) -> Option<ExtractedMedia> {
    let display = str_at(node, &["display_url"]);
    let is_video = node.get("is_video").and_then(Value::as_bool).unwrap_or(false);

    let media = match (is_video, str_at(node, &["video_url"])) {
        (true, Some(video)) => ExtractedMedia::video(video, display.map(str::to_string)),
        _ => ExtractedMedia::image(display?),
    };

    Some(media.with_dimensions(
        u32_at(node, &["dimensions", "width"]),
        u32_at(node, &["dimensions", "height"]),
    ))
}

pub fn normalize_mobile_item(item: &Value, reference: &PostReference) -> ExtractedPost {
    let mut post = ExtractedPost::new(reference, "");

    post.caption = str_at(item, &["caption", "text"]).unwrap_or_default().to_string();
    post.owner_username = str_at(item, &["user", "username"]).map(str::to_string);
    post.owner_full_name = str_at(item, &["user", "full_name"]).map(str::to_string);
    post.owner_avatar = str_at(item, &["user", "profile_pic_url"]).map(str::to_string);
    post.like_count = i64_at(item, &["like_count"]);
    post.comment_count = i64_at(item, &["comment_count"]);
    post.taken_at = i64_at(item, &["taken_at"]);

    match item.get("carousel_media").and_then(Value::as_array) {
        Some(children) if !children.is_empty() => {
            post.is_carousel = true;
            post.media = children.iter().filter_map(mobile_media).collect();
        }
        _ => post.media = mobile_media(item).into_iter().collect(),
    }

    post
}

fn mobile_media(item: &Value) -> Option<ExtractedMedia> {
    let candidate = item.pointer("/image_versions2/candidates/0");
    let image = candidate.and_then(|c| str_at(c, &["url"]));
    let video = item.pointer("/video_versions/0/url").and_then(Value::as_str);

    let media = match video {
        Some(video) => ExtractedMedia::video(video, image.map(str::to_string)),
        None => ExtractedMedia::image(image?),
    };

    let width = u32_at(item, &["original_width"]).or_else(|| candidate.and_then(|c| u32_at(c, &["width"])));
    let height = u32_at(item, &["original_height"]).or_else(|| candidate.and_then(|c| u32_at(c, &["height"])));

    Some(media.with_dimensions(width, height))
}

// ============================================================================
// Raw media scan
// ============================================================================

/// Direct media URLs on any of `cdn_hosts`, first-seen order, no duplicates.
///
/// Profile pictures are skipped; `.mp4` paths classify as video.
pub fn scan_media_urls(html: &str, cdn_hosts: &[String]) -> Vec<ExtractedMedia> {
    let unescaped = html
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("&amp;", "&");

    let mut seen = HashSet::new();
    let mut media = Vec::new();

    for found in URL_RE.find_iter(&unescaped) {
        let url = found.as_str();
        if !on_cdn(url, cdn_hosts) || url.contains(PROFILE_PICTURE_SEGMENT) {
            continue;
        }

        let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
        if !MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            continue;
        }
        if !seen.insert(url.to_string()) {
            continue;
        }

        media.push(if path.ends_with(".mp4") {
            ExtractedMedia::video(url, None)
        } else {
            ExtractedMedia::image(url)
        });
    }

    media
}

fn on_cdn(url: &str, cdn_hosts: &[String]) -> bool {
    let host = url
        .split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default()
        .to_ascii_lowercase();

    cdn_hosts.iter().any(|suffix| {
        let suffix = suffix.to_ascii_lowercase();
        host == suffix || host.ends_with(&format!(".{}", suffix))
    })
}

// ============================================================================
// Social preview tags
// ============================================================================

/// Open Graph tags and the visible timestamp of a public page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTags {
    pub image: Option<String>,
    pub video: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw `datetime` attribute of the first `<time>` element
    pub datetime: Option<String>,
}

impl PreviewTags {
    pub fn parse(html: &str) -> Self {
        let mut tags = PreviewTags::default();

        for cap in META_RE.captures_iter(html) {
            let value = cap.get(2).or_else(|| cap.get(3)).map(|m| m.as_str());
            tags.set(&cap[1], value.unwrap_or_default());
        }
        for cap in META_REV_RE.captures_iter(html) {
            let value = cap.get(1).or_else(|| cap.get(2)).map(|m| m.as_str());
            tags.set(&cap[3], value.unwrap_or_default());
        }

        tags.datetime = TIME_RE.captures(html).map(|cap| cap[1].to_string());
        tags
    }

    fn set(&mut self, key: &str, raw: &str) {
        let value = decode_entities(raw.trim());
        if value.is_empty() {
            return;
        }
        let slot = match key.to_ascii_lowercase().as_str() {
            "image" => &mut self.image,
            "video" => &mut self.video,
            "title" => &mut self.title,
            "description" => &mut self.description,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Single-item post from the preview tags; `None` without an image or video.
    pub fn to_post(&self, reference: &PostReference) -> Option<ExtractedPost> {
        let media = match (&self.video, &self.image) {
            (Some(video), thumb) => ExtractedMedia::video(video.clone(), thumb.clone()),
            (None, Some(image)) => ExtractedMedia::image(image.clone()),
            (None, None) => return None,
        };

        let mut post = ExtractedPost::new(reference, "");
        post.media = vec![media];
        post.taken_at = self.datetime.as_deref().and_then(parse_datetime);

        if let Some(description) = &self.description {
            let parts = parse_description(description);
            post.caption = parts.caption;
            post.owner_username = parts.username;
            post.like_count = parts.likes;
            post.comment_count = parts.comments;
        }

        post.owner_full_name = self
            .title
            .as_deref()
            .and_then(|title| TITLE_NAME_RE.captures(title))
            .map(|cap| cap[1].trim().to_string())
            .filter(|name| Some(name) != post.owner_username.as_ref());

        Some(post)
    }
}

fn parse_datetime(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Fields recoverable from an `og:description`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionParts {
    pub username: Option<String>,
    pub caption: String,
    pub likes: Option<i64>,
    pub comments: Option<i64>,
}

/// Parse `"12 likes, 3 comments - user on July 14, 2019: \"caption\""` and its variants.
pub fn parse_description(description: &str) -> DescriptionParts {
    let description = description.trim();
    let mut parts = DescriptionParts::default();

    if let Some(cap) = COUNTS_RE.captures(description) {
        parts.likes = parse_count(&cap[1]);
        parts.comments = parse_count(&cap[2]);
    }

    parts.username = HANDLE_RE
        .captures(description)
        .map(|cap| cap[1].to_string());

    parts.caption = QUOTED_CAPTION_RE
        .captures(description)
        .map(|cap| cap[1].trim().to_string())
        .unwrap_or_else(|| description.to_string());

    parts
}

/// `1,234` / `1.2K` / `3M`
fn parse_count(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (number, scale) = match raw.chars().last()? {
        'K' | 'k' => (&raw[..raw.len() - 1], 1_000.0),
        'M' | 'm' => (&raw[..raw.len() - 1], 1_000_000.0),
        _ => (raw, 1.0),
    };

    if scale > 1.0 {
        let value: f64 = number.replace(',', "").parse().ok()?;
        Some((value * scale).round() as i64)
    } else {
        number.replace([',', '.'], "").parse().ok()
    }
}

/// Decode named and numeric HTML entities.
pub fn decode_entities(input: &str) -> String {
    ENTITY_RE
        .replace_all(input, |cap: &regex::Captures<'_>| {
            let entity = &cap[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| cap[0].to_string(), String::from)
        })
        .into_owned()
}

/// True when any extracted item is a video.
pub fn has_video(media: &[ExtractedMedia]) -> bool {
    media.iter().any(|m| m.kind == MediaKind::Video)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::models::PostKind;
    use serde_json::json;

    fn reference() -> PostReference {
        PostReference::new("ABC123", PostKind::Standard)
    }

    fn cdn() -> Vec<String> {
        vec!["cdninstagram.com".to_string(), "fbcdn.net".to_string()]
    }

    #[test]
    fn test_additional_data_blob() {
        let html = r#"<script>window.__additionalDataLoaded('/p/ABC123/',{"graphql":{"shortcode_media":{"__typename":"GraphImage","shortcode":"ABC123","display_url":"https://scontent.cdninstagram.com/a.jpg","is_video":false,"dimensions":{"height":1350,"width":1080},"taken_at_timestamp":1563098400,"owner":{"username":"user","full_name":"User Name"},"edge_media_to_caption":{"edges":[{"node":{"text":"hello"}}]},"edge_media_preview_like":{"count":12}}}});</script>"#;

        let post = HtmlPostParser.parse_embedded_post(html, &reference()).unwrap();
        assert_eq!(post.caption, "hello");
        assert_eq!(post.owner_username.as_deref(), Some("user"));
        assert_eq!(post.like_count, Some(12));
        assert_eq!(post.taken_at, Some(1_563_098_400));
        assert_eq!(post.media.len(), 1);
        assert_eq!(post.media[0].width, Some(1080));
        assert!(!post.is_carousel);
    }

    #[test]
    fn test_shared_data_sidecar_classifies_children() {
        let html = r#"<script>window._sharedData = {"entry_data":{"PostPage":[{"graphql":{"shortcode_media":{"shortcode":"ABC123","display_url":"https://x.fbcdn.net/cover.jpg","edge_sidecar_to_children":{"edges":[
            {"node":{"display_url":"https://x.fbcdn.net/1.jpg","is_video":false}},
            {"node":{"display_url":"https://x.fbcdn.net/2.jpg","is_video":true,"video_url":"https://x.fbcdn.net/2.mp4"}}
        ]}}}}]}};</script>"#;

        let post = HtmlPostParser.parse_embedded_post(html, &reference()).unwrap();
        assert!(post.is_carousel);
        assert_eq!(post.media.len(), 2);
        assert_eq!(post.media[0].kind, MediaKind::Image);
        assert_eq!(post.media[1].kind, MediaKind::Video);
        assert_eq!(post.media[1].thumbnail.as_deref(), Some("https://x.fbcdn.net/2.jpg"));
    }

    #[test]
    fn test_context_json_blob() {
        let inner = json!({
            "context": {"media": {"__typename": "GraphVideo", "display_url": "https://x.cdninstagram.com/t.jpg",
                "is_video": true, "video_url": "https://x.cdninstagram.com/v.mp4"}}
        })
        .to_string();
        let html = format!(
            r#"<script>{{"gql_data":null,"contextJSON":{}}}</script>"#,
            serde_json::to_string(&inner).unwrap()
        );

        let post = HtmlPostParser.parse_embedded_post(&html, &reference()).unwrap();
        assert_eq!(post.media[0].url, "https://x.cdninstagram.com/v.mp4");
    }

    #[test]
    fn test_no_blob_returns_none() {
        assert!(HtmlPostParser
            .parse_embedded_post("<html><body>nothing</body></html>", &reference())
            .is_none());
        assert!(HtmlPostParser
            .parse_embedded_post("window._sharedData = {broken", &reference())
            .is_none());
    }

    #[test]
    fn test_mobile_item_with_carousel() {
        let body = json!({
            "items": [{
                "taken_at": 1_700_000_000,
                "caption": {"text": "carousel"},
                "user": {"username": "someone"},
                "like_count": 5,
                "carousel_media": [
                    {"image_versions2": {"candidates": [{"url": "https://x.fbcdn.net/1.jpg", "width": 1080, "height": 1080}]}},
                    {"image_versions2": {"candidates": [{"url": "https://x.fbcdn.net/2.jpg"}]},
                     "video_versions": [{"url": "https://x.fbcdn.net/2.mp4"}]}
                ]
            }]
        });

        let post = post_from_json(&body, &reference()).unwrap();
        assert!(post.is_carousel);
        assert_eq!(post.caption, "carousel");
        assert_eq!(post.media[0].width, Some(1080));
        assert!(post.media[1].is_video());
        assert_eq!(post.media[1].thumbnail.as_deref(), Some("https://x.fbcdn.net/2.jpg"));
    }

    #[test]
    fn test_node_without_media_is_rejected() {
        let body = json!({"data": {"xdt_shortcode_media": {"shortcode": "ABC123"}}});
        assert!(matches!(find_post_node(&body), Some(PostNode::Graph(_))));
        assert!(post_from_json(&body, &reference()).is_none());
    }

    #[test]
    fn test_scan_media_urls_dedups_and_filters() {
        let html = r#"
            "display_url":"https:\/\/scontent-lax3-1.cdninstagram.com\/v\/t51.29350-15\/a.jpg?stp=1&oh=x"
            <img src="https://scontent-lax3-1.cdninstagram.com/v/t51.29350-15/a.jpg?stp=1&amp;oh=x">
            <img src="https://scontent-lax3-1.cdninstagram.com/v/t51.2885-19/avatar.jpg">
            <script src="https://static.cdninstagram.com/rsrc.php/v3/app.js"></script>
            <img src="https://example.com/other.jpg">
            <video src="https://video.fbcdn.net/o1/v/clip.mp4?efg=1"></video>
        "#;

        let media = scan_media_urls(html, &cdn());
        assert_eq!(media.len(), 2);
        assert_eq!(
            media[0].url,
            "https://scontent-lax3-1.cdninstagram.com/v/t51.29350-15/a.jpg?stp=1&oh=x"
        );
        assert_eq!(media[0].kind, MediaKind::Image);
        assert!(media[1].is_video());
        assert!(has_video(&media));
    }

    #[test]
    fn test_preview_tags_both_attribute_orders() {
        let html = r#"<head>
            <meta property="og:image" content="https://x.cdninstagram.com/a.jpg?x=1&amp;y=2" />
            <meta content="12 likes, 3 comments - user on July 14, 2019: &quot;sunny day&quot;" property="og:description" />
            <meta property="og:title" content="User Name on Instagram: &quot;sunny day&quot;" />
            </head><body><time class="x" datetime="2019-07-14T10:00:00.000Z">July 14</time></body>"#;

        let tags = PreviewTags::parse(html);
        assert_eq!(tags.image.as_deref(), Some("https://x.cdninstagram.com/a.jpg?x=1&y=2"));
        assert_eq!(tags.datetime.as_deref(), Some("2019-07-14T10:00:00.000Z"));

        let post = tags.to_post(&reference()).unwrap();
        assert_eq!(post.media.len(), 1);
        assert_eq!(post.caption, "sunny day");
        assert_eq!(post.owner_username.as_deref(), Some("user"));
        assert_eq!(post.owner_full_name.as_deref(), Some("User Name"));
        assert_eq!(post.like_count, Some(12));
        assert_eq!(post.comment_count, Some(3));
        assert_eq!(post.taken_at, Some(1_563_098_400));
    }

    #[test]
    fn test_preview_without_image_is_none() {
        let tags = PreviewTags::parse(r#"<meta property="og:title" content="Instagram" />"#);
        assert!(tags.to_post(&reference()).is_none());
    }

    #[test]
    fn test_description_without_quote_keeps_whole_text() {
        let parts = parse_description("2019-07-14 — user on Instagram");
        assert_eq!(parts.username.as_deref(), Some("user"));
        assert_eq!(parts.caption, "2019-07-14 — user on Instagram");
        assert_eq!(parts.likes, None);
    }

    #[test]
    fn test_abbreviated_counts() {
        let parts = parse_description("1.2K likes, 1,045 comments - a.b on March 3, 2021: \"x\"");
        assert_eq!(parts.likes, Some(1_200));
        assert_eq!(parts.comments, Some(1_045));
        assert_eq!(parts.username.as_deref(), Some("a.b"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &#39;c&#x27; &lt;d&gt; &bogus;"), "a & b 'c' <d> &bogus;");
    }
}
