//! Field resolvers over raw renderer nodes.
//!
//! Renderers carry the same information in several sub-shapes depending on
//! where on the page they appear. Each resolver accepts every shape seen in
//! the wild and falls back to an empty/zero default instead of failing the
//! whole item.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::text::{parse_duration, parse_published_time, parse_views};
use crate::video::PublishedTime;

/// Resolve a text node: bare string, `{"simpleText": ..}`, or the first run
/// of `{"runs": [{"text": ..}]}`.
pub fn text_of(node: &Value) -> Option<&str> {
    if let Some(text) = node.as_str() {
        return Some(text);
    }
    if let Some(text) = node["simpleText"].as_str() {
        return Some(text);
    }
    node["runs"][0]["text"].as_str()
}

/// Video id, from the renderer itself or its navigation endpoints.
pub fn video_id(item: &Value) -> &str {
    item["videoId"]
        .as_str()
        .or_else(|| item["navigationEndpoint"]["watchEndpoint"]["videoId"].as_str())
        .or_else(|| item["navigationEndpoint"]["reelWatchEndpoint"]["videoId"].as_str())
        .unwrap_or("")
}

pub fn title_of(item: &Value) -> &str {
    text_of(&item["title"]).unwrap_or("")
}

/// Channel name and browse id, preferring `ownerText` over the compact
/// `shortBylineText` byline.
pub fn channel_of(item: &Value) -> (String, String) {
    let byline = if item["ownerText"].is_null() {
        &item["shortBylineText"]
    } else {
        &item["ownerText"]
    };
    let run = &byline["runs"][0];
    let name = run["text"].as_str().unwrap_or("").to_string();
    let id = run["navigationEndpoint"]["browseEndpoint"]["browseId"]
        .as_str()
        .unwrap_or("")
        .to_string();
    (name, id)
}

/// View count, from whichever count text the renderer carries. The choice is
/// by field presence; a present-but-unparsable text stays 0 rather than
/// falling through to the other field.
pub fn views_of(item: &Value) -> u64 {
    let source = if !item["viewCountText"].is_null() {
        &item["viewCountText"]
    } else if !item["shortViewCountText"].is_null() {
        &item["shortViewCountText"]
    } else {
        return 0;
    };
    parse_views(text_of(source).unwrap_or(""))
}

/// Duration in seconds; reel items carry no length text and stay 0.
pub fn duration_of(item: &Value) -> u64 {
    parse_duration(item["lengthText"]["simpleText"].as_str().unwrap_or(""))
}

pub fn published_of(item: &Value, now: DateTime<Utc>) -> PublishedTime {
    match item["publishedTimeText"]["simpleText"].as_str() {
        Some(text) => parse_published_time(text, now),
        None => PublishedTime::Unknown,
    }
}

/// URL of the largest (last-listed) thumbnail.
pub fn thumbnail_of(item: &Value) -> &str {
    item["thumbnail"]["thumbnails"]
        .as_array()
        .and_then(|thumbnails| thumbnails.last())
        .and_then(|thumb| thumb["url"].as_str())
        .unwrap_or("")
}
