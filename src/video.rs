use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a video was published, as far as the page reveals it.
///
/// Listing pages carry humanized phrases ("3 weeks ago") that usually resolve
/// to an absolute timestamp. Phrasing the resolver does not recognize is kept
/// verbatim so no information is lost; filtering treats it as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum PublishedTime {
    /// Resolved to an absolute point in time.
    Absolute(DateTime<Utc>),
    /// Unrecognized phrasing, kept verbatim.
    Text(String),
    /// The page carried no publish information.
    #[default]
    Unknown,
}

impl PublishedTime {
    /// The absolute timestamp, if the page phrasing resolved to one.
    pub fn as_absolute(&self) -> Option<DateTime<Utc>> {
        match self {
            PublishedTime::Absolute(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PublishedTime::Unknown)
    }
}

/// One video discovered during a crawl.
///
/// Fields come from heterogeneous page renderers; anything a page does not
/// carry defaults to zero/empty rather than being absent. The id is never
/// empty on records leaving the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VideoRecord {
    /// Stable platform video id.
    pub id: String,
    pub title: String,
    pub channel: String,
    pub channel_id: String,
    /// View count parsed from humanized text ("1.2M views").
    pub views: u64,
    /// Duration in seconds; 0 when the page shows no length.
    pub duration_secs: u64,
    pub published: PublishedTime,
    pub thumbnail: String,
    /// Canonical watch URL on the source platform.
    pub url: String,
    /// Discovered on a reel/short-form shelf.
    pub short_form: bool,
}
