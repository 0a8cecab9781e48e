//! Shorts Crawler - recommendation-graph discovery for short-form video
//!
//! Seeds a breadth-first crawl from a platform search, walks the related-video
//! graph one page at a time, and surfaces records matching caller-supplied
//! filters either as a collected batch or as a lazy pull-based stream.

pub mod crawler;
pub mod source;
pub mod extract;
pub mod filter;
pub mod video;
pub mod exclusions;
pub mod routes;
pub mod fetch;
pub mod config;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::crawler::{CrawlStream, FrontierCrawler};
pub use crate::exclusions::{ExclusionRegistry, ExclusionSnapshot};
pub use crate::fetch::PageFetcher;
pub use crate::filter::FilterSpec;
pub use crate::routes::{PlatformRoutes, RouteTable};
pub use crate::source::{VideoSource, YoutubeSource};
pub use crate::video::{PublishedTime, VideoRecord};

/// Result type for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Error types for crawler operations
#[derive(thiserror::Error, Debug)]
pub enum CrawlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
