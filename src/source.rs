use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::extract;
use crate::fetch::PageFetcher;
use crate::routes::{PlatformRoutes, RouteTable};
use crate::video::VideoRecord;
use crate::Result;

/// Platform capabilities the frontier crawler is driven by.
///
/// One implementation per platform family: run a search, fetch a watch page,
/// and turn raw documents into records. The crawler itself never touches
/// URLs or page markup.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Platform name, for logs.
    fn name(&self) -> &str;

    /// Run a search and return the raw results document.
    async fn search(&self, query: &str) -> Result<String>;

    /// Fetch one video page by canonical URL.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Parse every recognizable video renderer out of a document.
    fn extract_videos(&self, document: &str) -> Vec<VideoRecord>;
}

/// YouTube-shaped source: route-table URLs plus embedded `ytInitialData`
/// extraction.
#[derive(Debug)]
pub struct YoutubeSource {
    name: String,
    routes: PlatformRoutes,
    fetcher: PageFetcher,
}

impl YoutubeSource {
    pub fn new(name: impl Into<String>, routes: PlatformRoutes, fetcher: PageFetcher) -> Self {
        Self {
            name: name.into(),
            routes,
            fetcher,
        }
    }

    /// Construct from a route table entry.
    pub fn from_table(table: &RouteTable, platform: &str, fetcher: PageFetcher) -> Result<Self> {
        Ok(Self::new(platform, table.platform(platform)?, fetcher))
    }

    pub fn routes(&self) -> &PlatformRoutes {
        &self.routes
    }
}

#[async_trait]
impl VideoSource for YoutubeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str) -> Result<String> {
        let url = self.routes.search_url(query);
        debug!("🔍 Searching {}: {}", self.name, url);
        self.fetcher.fetch(&url).await
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.fetcher.fetch(url).await
    }

    fn extract_videos(&self, document: &str) -> Vec<VideoRecord> {
        extract::extract_videos(document, &self.routes, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CrawlerError;

    #[test]
    fn test_from_table_rejects_unknown_platform() {
        let table = RouteTable::builtin();
        let err =
            YoutubeSource::from_table(&table, "not-a-platform", PageFetcher::default()).unwrap_err();
        assert!(matches!(err, CrawlerError::UnknownPlatform(_)));
    }

    #[test]
    fn test_extract_goes_through_routes() {
        let source = YoutubeSource::from_table(
            &RouteTable::builtin(),
            "youtube",
            PageFetcher::default(),
        )
        .unwrap();
        let data = serde_json::json!({
            "contents": {"twoColumnWatchNextResults": {"secondaryResults": {"secondaryResults": {
                "results": [
                    {"compactVideoRenderer": {"videoId": "abc", "title": {"simpleText": "T"}}}
                ]
            }}}}
        });
        let page = format!("<html><script>var ytInitialData = {};</script></html>", data);

        let records = source.extract_videos(&page);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://www.youtube.com/watch?v=abc");
    }
}
