//! Embedded-data extraction.
//!
//! Watch and search pages embed one JSON blob (`ytInitialData`) that carries
//! video renderers in several page regions. Every region rule runs on every
//! document and the hits are concatenated; there is no branching on page
//! kind, a region that is absent simply contributes nothing.

pub mod fields;
pub mod text;

use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::routes::PlatformRoutes;
use crate::video::VideoRecord;

/// Page regions that can carry video renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    SearchListing,
    RelatedPanel,
    Shelf,
    ReelShelf,
    EndScreen,
}

impl Region {
    /// Reel shelves list short-form videos; everything else is regular.
    fn short_form(self) -> bool {
        matches!(self, Region::ReelShelf)
    }
}

const REGION_RULES: [(Region, fn(&Value) -> Vec<&Value>); 5] = [
    (Region::SearchListing, search_listing_items),
    (Region::RelatedPanel, related_panel_items),
    (Region::Shelf, shelf_items),
    (Region::ReelShelf, reel_shelf_items),
    (Region::EndScreen, end_screen_items),
];

/// Pull every recognizable video renderer out of a raw page.
///
/// Records with an empty id never leave this function. Pages without a
/// recognizable data block produce an empty list, not an error.
pub fn extract_videos(
    document: &str,
    routes: &PlatformRoutes,
    now: DateTime<Utc>,
) -> Vec<VideoRecord> {
    let data = match initial_data(document) {
        Some(data) => data,
        None => {
            debug!("📄 No embedded data block in page");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (region, rule) in REGION_RULES {
        for item in rule(&data) {
            let record = record_from_item(item, routes, region.short_form(), now);
            if record.id.is_empty() {
                debug!("Skipping renderer without a video id in {:?}", region);
                continue;
            }
            records.push(record);
        }
    }
    debug!("📦 Extracted {} records", records.len());
    records
}

/// Locate and parse the embedded `ytInitialData` JSON.
pub fn initial_data(document: &str) -> Option<Value> {
    let html = Html::parse_document(document);
    let selector = Selector::parse("script").ok()?;
    let pattern = Regex::new(r"var ytInitialData = (\{.*?\});").ok()?;

    for script in html.select(&selector) {
        let body = script.inner_html();
        if !body.contains("var ytInitialData") {
            continue;
        }
        if let Some(captures) = pattern.captures(&body) {
            if let Some(json) = captures.get(1) {
                return serde_json::from_str(json.as_str()).ok();
            }
        }
    }
    None
}

fn record_from_item(
    item: &Value,
    routes: &PlatformRoutes,
    short_form: bool,
    now: DateTime<Utc>,
) -> VideoRecord {
    let id = fields::video_id(item).to_string();
    let (channel, channel_id) = fields::channel_of(item);
    let url = if id.is_empty() {
        String::new()
    } else if short_form {
        routes.short_url(&id)
    } else {
        routes.video_url(&id)
    };

    VideoRecord {
        title: fields::title_of(item).to_string(),
        channel,
        channel_id,
        views: fields::views_of(item),
        duration_secs: fields::duration_of(item),
        published: fields::published_of(item, now),
        thumbnail: fields::thumbnail_of(item).to_string(),
        url,
        short_form,
        id,
    }
}

fn non_null(node: &Value) -> Option<&Value> {
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

fn search_listing_items(data: &Value) -> Vec<&Value> {
    let sections = &data["contents"]["twoColumnSearchResultsRenderer"]["primaryContents"]
        ["sectionListRenderer"]["contents"];
    let mut items = Vec::new();
    for section in sections.as_array().into_iter().flatten() {
        for item in section["itemSectionRenderer"]["contents"]
            .as_array()
            .into_iter()
            .flatten()
        {
            let renderer = non_null(&item["videoRenderer"])
                .or_else(|| non_null(&item["compactVideoRenderer"]));
            if let Some(renderer) = renderer {
                items.push(renderer);
            }
        }
    }
    items
}

/// The related column shared by the panel, shelf, and reel-shelf rules.
fn watch_next_results(data: &Value) -> &Value {
    &data["contents"]["twoColumnWatchNextResults"]["secondaryResults"]["secondaryResults"]
        ["results"]
}

fn related_panel_items(data: &Value) -> Vec<&Value> {
    watch_next_results(data)
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| non_null(&item["compactVideoRenderer"]))
        .collect()
}

fn shelf_items(data: &Value) -> Vec<&Value> {
    watch_next_results(data)
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|item| {
            item["shelfRenderer"]["content"]["verticalListRenderer"]["items"]
                .as_array()
                .into_iter()
                .flatten()
        })
        .filter_map(|entry| non_null(&entry["compactVideoRenderer"]))
        .collect()
}

fn reel_shelf_items(data: &Value) -> Vec<&Value> {
    watch_next_results(data)
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|item| {
            item["reelShelfRenderer"]["items"]
                .as_array()
                .into_iter()
                .flatten()
        })
        .filter_map(|entry| non_null(&entry["reelItemRenderer"]))
        .collect()
}

fn end_screen_items(data: &Value) -> Vec<&Value> {
    data["playerOverlays"]["playerOverlayRenderer"]["endScreen"]["watchNextEndScreenRenderer"]
        ["results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| non_null(&item["endScreenVideoRenderer"]))
        .collect()
}
