use crate::{CrawlerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the shorts crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawl behaviour settings
    pub crawl: CrawlConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Platform route table settings
    pub routes: RoutesConfig,

    /// Exclusion registry settings
    pub exclusions: ExclusionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// How many matches a bounded crawl collects by default
    pub default_target: usize,

    /// Platform entry to use from the route table
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Extra attempts after a failed page fetch
    pub fetch_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Path to the route table file
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionsConfig {
    /// Path to the already-processed video store
    pub store_path: PathBuf,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let config_paths = [
            "shorts-crawler.toml",
            "config/shorts-crawler.toml",
            "~/.config/shorts-crawler/config.toml",
            "/etc/shorts-crawler/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        // Fall back to defaults plus environment variables
        Self::from_env()
    }

    /// Load configuration from an explicit file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(platform) = std::env::var("SHORTS_CRAWLER_PLATFORM") {
            config.crawl.platform = platform;
        }

        if let Ok(target) = std::env::var("SHORTS_CRAWLER_TARGET") {
            config.crawl.default_target = target.parse().unwrap_or(10);
        }

        if let Ok(timeout) = std::env::var("SHORTS_CRAWLER_TIMEOUT") {
            config.http.timeout_seconds = timeout.parse().unwrap_or(30);
        }

        if let Ok(routes_file) = std::env::var("SHORTS_CRAWLER_ROUTES") {
            config.routes.file = PathBuf::from(routes_file);
        }

        if let Ok(store_path) = std::env::var("SHORTS_CRAWLER_EXCLUSIONS") {
            config.exclusions.store_path = PathBuf::from(store_path);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.crawl.platform.is_empty() {
            return Err(CrawlerError::Config("platform must not be empty".into()));
        }

        if self.crawl.default_target == 0 {
            return Err(CrawlerError::Config(
                "default_target must be greater than 0".into(),
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(CrawlerError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Shorts Crawler Configuration:\n\
            - Platform: {}\n\
            - Default Target: {}\n\
            - HTTP Timeout: {}s\n\
            - Fetch Retries: {}\n\
            - Route Table: {}\n\
            - Exclusion Store: {}",
            self.crawl.platform,
            self.crawl.default_target,
            self.http.timeout_seconds,
            self.http.fetch_retries,
            self.routes.file.display(),
            self.exclusions.store_path.display()
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            http: HttpConfig::default(),
            routes: RoutesConfig::default(),
            exclusions: ExclusionsConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            default_target: 10,
            platform: "youtube".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            fetch_retries: 0,
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("routes.json"),
        }
    }
}

impl Default for ExclusionsConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("uploaded_videos.json"),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.config.crawl.platform = platform.to_string();
        self
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.config.crawl.default_target = target;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.http.timeout_seconds = seconds;
        self
    }

    pub fn with_routes_file(mut self, file: PathBuf) -> Self {
        self.config.routes.file = file;
        self
    }

    pub fn with_exclusion_store(mut self, store_path: PathBuf) -> Self {
        self.config.exclusions.store_path = store_path;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
