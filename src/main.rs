use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use shorts_crawler::{
    Config, ExclusionRegistry, FilterSpec, FrontierCrawler, PageFetcher, RouteTable, VideoRecord,
    YoutubeSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("shorts-crawler")
        .version("0.1.0")
        .author("bloky")
        .about("Breadth-first discovery of short-form videos over related-video graphs")
        .arg(
            Arg::new("query")
                .value_name("QUERY")
                .help("Seed search query")
                .required(true),
        )
        .arg(
            Arg::new("count")
                .short('n')
                .long("count")
                .value_name("NUM")
                .help("How many matching videos to collect"),
        )
        .arg(
            Arg::new("min-duration")
                .long("min-duration")
                .value_name("SECS")
                .help("Only keep videos at least this long"),
        )
        .arg(
            Arg::new("max-duration")
                .long("max-duration")
                .value_name("SECS")
                .help("Only keep videos at most this long"),
        )
        .arg(
            Arg::new("min-views")
                .long("min-views")
                .value_name("NUM")
                .help("Only keep videos with at least this many views"),
        )
        .arg(
            Arg::new("max-views")
                .long("max-views")
                .value_name("NUM")
                .help("Only keep videos with at most this many views"),
        )
        .arg(
            Arg::new("max-age-days")
                .long("max-age-days")
                .value_name("DAYS")
                .help("Only keep videos published within the last N days"),
        )
        .arg(
            Arg::new("platform")
                .short('p')
                .long("platform")
                .value_name("NAME")
                .help("Platform entry to use from the route table"),
        )
        .arg(
            Arg::new("routes")
                .long("routes")
                .value_name("FILE")
                .help("Route table file"),
        )
        .arg(
            Arg::new("exclusions")
                .long("exclusions")
                .value_name("FILE")
                .help("Already-processed video store"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("stream")
                .long("stream")
                .help("Emit matches as they are discovered instead of collecting a batch")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(if verbose {
            "shorts_crawler=debug,info"
        } else {
            "shorts_crawler=info,warn"
        })
        .init();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path.as_ref())?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    // CLI flags override the file
    if let Some(platform) = matches.get_one::<String>("platform") {
        config.crawl.platform = platform.clone();
    }
    if let Some(path) = matches.get_one::<String>("exclusions") {
        config.exclusions.store_path = PathBuf::from(path);
    }
    let routes_from_cli = matches.get_one::<String>("routes").map(PathBuf::from);
    if let Some(path) = &routes_from_cli {
        config.routes.file = path.clone();
    }
    config.validate()?;

    let query = matches.get_one::<String>("query").unwrap();
    let count: Option<usize> = match matches.get_one::<String>("count") {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };
    let filter = build_filter(&matches)?;
    let stream_mode = matches.get_flag("stream");

    info!("🚀 Shorts crawler starting...");
    info!("🔍 Seed query: {}", query);
    if verbose {
        info!("{}", config.summary());
    }

    // An explicitly named route table must exist; the configured default may
    // fall back to the built-in routes
    let route_table = if config.routes.file.exists() {
        RouteTable::load(&config.routes.file).await?
    } else if routes_from_cli.is_some() {
        error!("Route table not found: {}", config.routes.file.display());
        return Err(anyhow::anyhow!("Route table not found"));
    } else {
        warn!(
            "Route table {} not found, using built-in routes",
            config.routes.file.display()
        );
        RouteTable::builtin()
    };

    let fetcher = PageFetcher::new(
        Duration::from_secs(config.http.timeout_seconds),
        config.http.fetch_retries,
    );
    let source = YoutubeSource::from_table(&route_table, &config.crawl.platform, fetcher)?;
    let registry = ExclusionRegistry::open(&config.exclusions.store_path).await;
    let crawler = FrontierCrawler::new(source, registry);

    let start_time = std::time::Instant::now();
    let found = if stream_mode {
        // Matches print the moment the crawl discovers them; without an
        // explicit count the stream runs until the graph is exhausted
        let mut stream = crawler.stream_crawl(query, filter).await;
        let mut found = 0usize;
        while let Some(record) = stream.next().await {
            found += 1;
            emit(&record, found)?;
            if count.is_some_and(|target| found >= target) {
                break;
            }
        }
        info!("📊 Discovered {} unique videos along the way", stream.seen_count());
        found
    } else {
        let target = count.unwrap_or(config.crawl.default_target);
        let results = crawler.crawl(query, target, filter).await;
        for (index, record) in results.iter().enumerate() {
            emit(record, index + 1)?;
        }
        results.len()
    };
    let duration = start_time.elapsed();

    info!("🎉 Crawl completed in {:.2}s", duration.as_secs_f64());
    info!("✅ Matches found: {}", found);

    Ok(())
}

/// One JSON line per match on stdout, for downstream pipelines.
fn emit(record: &VideoRecord, index: usize) -> Result<()> {
    info!(
        "🎯 #{} {} ({} views): {}",
        index, record.id, record.views, record.title
    );
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

fn build_filter(matches: &clap::ArgMatches) -> Result<Option<FilterSpec>> {
    let spec = FilterSpec::new()
        .with_duration(
            parse_flag(matches, "min-duration")?,
            parse_flag(matches, "max-duration")?,
        )
        .with_views(
            parse_flag(matches, "min-views")?,
            parse_flag(matches, "max-views")?,
        );
    let spec = match parse_flag::<i64>(matches, "max-age-days")? {
        Some(days) => {
            let now = chrono::Utc::now();
            let after = chrono::Duration::try_days(days)
                .and_then(|window| now.checked_sub_signed(window))
                .ok_or_else(|| anyhow::anyhow!("--max-age-days out of range"))?;
            spec.with_published_window(Some(after), Some(now))
        }
        None => spec,
    };
    Ok(if spec.is_empty() { None } else { Some(spec) })
}

fn parse_flag<T>(matches: &clap::ArgMatches, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match matches.get_one::<String>(name) {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}
