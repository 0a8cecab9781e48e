use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::{CrawlerError, Result};

/// Base URL templates for one platform.
///
/// Crawl logic never hard-codes platform URLs; pointing the crawler at
/// another platform means supplying a different entry, nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRoutes {
    pub base_search_url: String,
    pub base_video_url: String,
    pub base_channel_url: String,
    pub base_playlist_url: String,
    pub base_short_url: String,
}

impl PlatformRoutes {
    /// Search results URL for a raw (unencoded) query.
    pub fn search_url(&self, query: &str) -> String {
        format!("{}{}", self.base_search_url, urlencoding::encode(query))
    }

    /// Canonical watch URL for a regular video id.
    pub fn video_url(&self, id: &str) -> String {
        format!("{}{}", self.base_video_url, id)
    }

    /// Canonical URL for a short-form video id.
    pub fn short_url(&self, id: &str) -> String {
        format!("{}{}", self.base_short_url, id)
    }

    pub fn channel_url(&self, id: &str) -> String {
        format!("{}{}", self.base_channel_url, id)
    }

    pub fn playlist_url(&self, id: &str) -> String {
        format!("{}{}", self.base_playlist_url, id)
    }

    fn validate(&self, platform: &str) -> Result<()> {
        let fields = [
            ("base_search_url", &self.base_search_url),
            ("base_video_url", &self.base_video_url),
            ("base_channel_url", &self.base_channel_url),
            ("base_playlist_url", &self.base_playlist_url),
            ("base_short_url", &self.base_short_url),
        ];
        for (field, value) in fields {
            Url::parse(value).map_err(|e| {
                CrawlerError::Config(format!("{}.{} is not a valid URL: {}", platform, field, e))
            })?;
        }
        Ok(())
    }
}

/// Named mapping of platform → route templates, loaded from a JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(flatten)]
    platforms: HashMap<String, PlatformRoutes>,
}

impl RouteTable {
    /// The table compiled into the binary; currently the default platform
    /// only.
    pub fn builtin() -> Self {
        let mut platforms = HashMap::new();
        platforms.insert(
            "youtube".to_string(),
            PlatformRoutes {
                base_search_url: "https://www.youtube.com/results?search_query=".to_string(),
                base_video_url: "https://www.youtube.com/watch?v=".to_string(),
                base_channel_url: "https://www.youtube.com/channel/".to_string(),
                base_playlist_url: "https://www.youtube.com/playlist?list=".to_string(),
                base_short_url: "https://www.youtube.com/shorts/".to_string(),
            },
        );
        Self { platforms }
    }

    /// Load and validate a table from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let table: Self = serde_json::from_str(&raw)?;
        table.validate()?;
        debug!(
            "🗺️ Loaded route table from {} ({} platforms)",
            path.display(),
            table.platforms.len()
        );
        Ok(table)
    }

    /// Routes for one named platform.
    pub fn platform(&self, name: &str) -> Result<PlatformRoutes> {
        self.platforms
            .get(name)
            .cloned()
            .ok_or_else(|| CrawlerError::UnknownPlatform(name.to_string()))
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.keys().map(|name| name.as_str()).collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (platform, routes) in &self.platforms {
            routes.validate(platform)?;
        }
        Ok(())
    }
}
