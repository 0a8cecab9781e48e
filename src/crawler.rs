use futures::Stream;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

use crate::exclusions::{ExclusionRegistry, ExclusionSnapshot};
use crate::filter::{self, FilterSpec};
use crate::source::VideoSource;
use crate::video::VideoRecord;

/// Per-invocation traversal state. Created by the seed search, discarded
/// with the call; nothing here outlives the session.
struct CrawlSession {
    seen_ids: HashSet<String>,
    explored_ids: HashSet<String>,
    frontier: VecDeque<VideoRecord>,
    exclusions: ExclusionSnapshot,
    filter: Option<FilterSpec>,
}

impl CrawlSession {
    fn new(exclusions: ExclusionSnapshot, filter: Option<FilterSpec>) -> Self {
        Self {
            seen_ids: HashSet::new(),
            explored_ids: HashSet::new(),
            frontier: VecDeque::new(),
            exclusions,
            filter,
        }
    }

    /// Fold one page's candidates into the session. Every new id joins the
    /// frontier for later exploration; the ones passing the filter are
    /// returned in discovery order.
    fn absorb(&mut self, candidates: Vec<VideoRecord>) -> Vec<VideoRecord> {
        let mut matched = Vec::new();
        for record in candidates {
            if self.seen_ids.contains(&record.id) || self.exclusions.contains(&record.id) {
                continue;
            }
            self.seen_ids.insert(record.id.clone());
            if filter::matches(&record, self.filter.as_ref(), &self.exclusions) {
                matched.push(record.clone());
            }
            self.frontier.push_back(record);
        }
        matched
    }

    /// Earliest-discovered unexplored entry, marked explored before any
    /// fetch happens so a failed fetch is never retried.
    fn next_unexplored(&mut self) -> Option<VideoRecord> {
        while let Some(entry) = self.frontier.pop_front() {
            if self.explored_ids.insert(entry.id.clone()) {
                return Some(entry);
            }
        }
        None
    }
}

/// Breadth-first explorer over a platform's "related videos" graph.
///
/// One search seeds the frontier, then pages are fetched one at a time in
/// strict discovery order; every page's related videos extend the frontier.
/// Matches surface the moment they are discovered. Both entry points run the
/// same traversal; the bounded form just stops pulling at its target.
pub struct FrontierCrawler<S: VideoSource> {
    source: S,
    registry: ExclusionRegistry,
}

impl<S: VideoSource> FrontierCrawler<S> {
    pub fn new(source: S, registry: ExclusionRegistry) -> Self {
        Self { source, registry }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Eagerly collect up to `target_count` matches for a seed query.
    ///
    /// Returns fewer when the reachable graph is exhausted first and never
    /// blocks waiting for more. A failed seed search yields an empty list.
    pub async fn crawl(
        &self,
        seed_query: &str,
        target_count: usize,
        filter: Option<FilterSpec>,
    ) -> Vec<VideoRecord> {
        let mut stream = self.stream_crawl(seed_query, filter).await;
        let mut matches = Vec::new();
        while matches.len() < target_count {
            match stream.next().await {
                Some(record) => matches.push(record),
                None => break,
            }
        }
        info!(
            "🏁 Bounded crawl for '{}' finished: {}/{} matches",
            seed_query,
            matches.len(),
            target_count
        );
        matches
    }

    /// Start a lazy crawl session.
    ///
    /// Nothing is fetched until the first pull; the consumer cancels by
    /// ceasing to pull. The session snapshots the exclusion set once, here.
    pub async fn stream_crawl(
        &self,
        seed_query: &str,
        filter: Option<FilterSpec>,
    ) -> CrawlStream<'_, S> {
        let exclusions = self.registry.snapshot().await;
        debug!(
            "🧭 New session for '{}' on {} ({} excluded ids, v{})",
            seed_query,
            self.source.name(),
            exclusions.len(),
            exclusions.version()
        );
        CrawlStream {
            source: &self.source,
            registry: &self.registry,
            session: CrawlSession::new(exclusions, filter),
            seed_query: seed_query.to_string(),
            pending: VecDeque::new(),
            phase: Phase::Seed,
        }
    }
}

enum Phase {
    Seed,
    Explore,
    Done,
}

/// Lazy crawl results, advanced exactly one traversal step per pull.
///
/// Matches found by the step in flight are handed out one per pull before
/// the next fetch runs, so stopping after the k-th item leaves every node
/// beyond that step untouched. Dropping the stream cancels the crawl; there
/// is nothing to clean up.
pub struct CrawlStream<'a, S: VideoSource> {
    source: &'a S,
    registry: &'a ExclusionRegistry,
    session: CrawlSession,
    seed_query: String,
    pending: VecDeque<VideoRecord>,
    phase: Phase,
}

impl<'a, S: VideoSource> CrawlStream<'a, S> {
    /// Pull the next match, running as many traversal steps as needed.
    /// `None` means the reachable graph is exhausted.
    pub async fn next(&mut self) -> Option<VideoRecord> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(record);
            }
            match self.phase {
                Phase::Seed => self.seed().await,
                Phase::Explore => {
                    if !self.explore_next().await {
                        self.phase = Phase::Done;
                    }
                }
                Phase::Done => return None,
            }
        }
    }

    /// Swap in the registry's current exclusion snapshot. Nodes already
    /// enqueued stay enqueued; only later discoveries see the new set.
    pub async fn refresh_exclusions(&mut self) {
        let snapshot = self.registry.snapshot().await;
        debug!("🔄 Session now using exclusion snapshot v{}", snapshot.version());
        self.session.exclusions = snapshot;
    }

    /// Ids emitted or enqueued so far this session.
    pub fn seen_count(&self) -> usize {
        self.session.seen_ids.len()
    }

    /// Adapt to a `futures::Stream` for combinator-style consumption.
    pub fn into_stream(self) -> impl Stream<Item = VideoRecord> + 'a {
        futures::stream::unfold(self, |mut inner| async move {
            inner.next().await.map(|record| (record, inner))
        })
    }

    async fn seed(&mut self) {
        self.phase = Phase::Explore;
        let document = match self.source.search(&self.seed_query).await {
            Ok(document) => document,
            Err(e) => {
                warn!("💥 Seed search for '{}' failed: {}", self.seed_query, e);
                self.phase = Phase::Done;
                return;
            }
        };
        let candidates = self.source.extract_videos(&document);
        debug!(
            "🌱 Seed '{}' produced {} candidates",
            self.seed_query,
            candidates.len()
        );
        let matched = self.session.absorb(candidates);
        self.pending.extend(matched);
    }

    /// One exploration step: fetch the earliest unexplored node and absorb
    /// its related videos. False once the frontier is empty.
    async fn explore_next(&mut self) -> bool {
        let entry = match self.session.next_unexplored() {
            Some(entry) => entry,
            None => {
                debug!("🏜️ Frontier exhausted for '{}'", self.seed_query);
                return false;
            }
        };

        debug!(
            "📍 Exploring {} ({} left in frontier)",
            entry.id,
            self.session.frontier.len()
        );
        let document = match self.source.fetch_page(&entry.url).await {
            Ok(document) => document,
            Err(e) => {
                // Non-fatal: the node keeps its explored mark and simply
                // contributes no children
                warn!("⚠️ Fetch failed for {}: {}", entry.url, e);
                return true;
            }
        };
        let candidates = self.source.extract_videos(&document);
        let matched = self.session.absorb(candidates);
        self.pending.extend(matched);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CrawlerError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// In-memory source: the seed document and every page are JSON arrays of
    /// records, and every call is logged for ordering assertions.
    struct ScriptedSource {
        seed: Option<String>,
        pages: HashMap<String, String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSource {
        fn new(seed: &[VideoRecord], pages: &[(&str, Vec<VideoRecord>)]) -> Self {
            Self {
                seed: Some(doc(seed)),
                pages: pages
                    .iter()
                    .map(|(id, records)| (page_url(id), doc(records)))
                    .collect(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing_seed() -> Self {
            Self {
                seed: None,
                pages: HashMap::new(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn search(&self, query: &str) -> Result<String> {
            self.calls.lock().unwrap().push(format!("search:{}", query));
            self.seed
                .clone()
                .ok_or_else(|| CrawlerError::Config("seed unavailable".into()))
        }

        async fn fetch_page(&self, url: &str) -> Result<String> {
            self.calls.lock().unwrap().push(format!("fetch:{}", url));
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| CrawlerError::Config(format!("no page for {}", url)))
        }

        fn extract_videos(&self, document: &str) -> Vec<VideoRecord> {
            serde_json::from_str(document).unwrap_or_default()
        }
    }

    fn page_url(id: &str) -> String {
        format!("page://{}", id)
    }

    fn rec(id: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("Video {}", id),
            views: 1_000,
            duration_secs: 60,
            url: page_url(id),
            ..Default::default()
        }
    }

    fn doc(records: &[VideoRecord]) -> String {
        serde_json::to_string(records).unwrap()
    }

    async fn empty_registry() -> (TempDir, ExclusionRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let registry = ExclusionRegistry::open(temp_dir.path().join("uploaded.json")).await;
        (temp_dir, registry)
    }

    async fn registry_with(temp_dir: &TempDir, ids: &[&str]) -> ExclusionRegistry {
        write_store(temp_dir, ids).await;
        ExclusionRegistry::open(temp_dir.path().join("uploaded.json")).await
    }

    async fn write_store(temp_dir: &TempDir, ids: &[&str]) {
        let videos: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({"videoId": id, "uploadedId": ""}))
            .collect();
        tokio::fs::write(
            temp_dir.path().join("uploaded.json"),
            serde_json::json!({ "videos": videos }).to_string(),
        )
        .await
        .unwrap();
    }

    /// Seed reveals a and b; a's page reveals c (and repeats a and b), b's
    /// page reveals d; c and d are leaves.
    fn diamond() -> ScriptedSource {
        ScriptedSource::new(
            &[rec("a"), rec("b")],
            &[
                ("a", vec![rec("c"), rec("a"), rec("b")]),
                ("b", vec![rec("d")]),
                ("c", vec![]),
                ("d", vec![]),
            ],
        )
    }

    #[tokio::test]
    async fn test_bounded_crawl_stops_at_target() {
        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        let matches = crawler.crawl("query", 1, None).await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
        // The target was satisfiable from the seed page alone
        assert_eq!(crawler.source().calls(), ["search:query"]);
    }

    #[tokio::test]
    async fn test_bounded_crawl_exhausts_graph_when_short() {
        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        let matches = crawler.crawl("query", 50, None).await;
        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_exploration_is_breadth_first() {
        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        crawler.crawl("query", 50, None).await;
        assert_eq!(
            crawler.source().calls(),
            [
                "search:query",
                "fetch:page://a",
                "fetch:page://b",
                "fetch:page://c",
                "fetch:page://d",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_id_is_emitted_twice() {
        let (_dir, registry) = empty_registry().await;
        // Every page re-lists everything discovered so far
        let source = ScriptedSource::new(
            &[rec("a"), rec("b")],
            &[
                ("a", vec![rec("b"), rec("a"), rec("c")]),
                ("b", vec![rec("a"), rec("c"), rec("b")]),
                ("c", vec![rec("a"), rec("b"), rec("c")]),
            ],
        );
        let crawler = FrontierCrawler::new(source, registry);

        let matches = crawler.crawl("query", 50, None).await;
        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_node_but_not_frontier() {
        let (_dir, registry) = empty_registry().await;
        // No page scripted for a, so its fetch fails mid-frontier
        let source = ScriptedSource::new(
            &[rec("a"), rec("b")],
            &[("b", vec![rec("d")]), ("d", vec![])],
        );
        let crawler = FrontierCrawler::new(source, registry);

        let matches = crawler.crawl("query", 50, None).await;
        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        // a's children are lost but b's subtree still gets explored
        assert_eq!(ids, ["a", "b", "d"]);
        assert!(crawler
            .source()
            .calls()
            .contains(&"fetch:page://b".to_string()));
    }

    #[tokio::test]
    async fn test_seed_failure_yields_nothing() {
        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(ScriptedSource::failing_seed(), registry);

        assert!(crawler.crawl("query", 5, None).await.is_empty());

        let mut stream = crawler.stream_crawl("query", None).await;
        assert!(stream.next().await.is_none());
        // One search per invocation, no page fetches
        assert_eq!(crawler.source().calls(), ["search:query", "search:query"]);
    }

    #[tokio::test]
    async fn test_stream_fetches_nothing_beyond_the_pulled_step() {
        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        let mut stream = crawler.stream_crawl("query", None).await;
        assert_eq!(stream.next().await.unwrap().id, "a");
        assert_eq!(stream.next().await.unwrap().id, "b");
        // Both matches came from the seed step
        assert_eq!(crawler.source().calls(), ["search:query"]);

        assert_eq!(stream.next().await.unwrap().id, "c");
        assert_eq!(
            crawler.source().calls(),
            ["search:query", "fetch:page://a"]
        );
        // The consumer stops here; b's page is never fetched
        drop(stream);
        assert_eq!(
            crawler.source().calls(),
            ["search:query", "fetch:page://a"]
        );
    }

    #[tokio::test]
    async fn test_excluded_ids_are_never_emitted_nor_explored() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry_with(&temp_dir, &["c"]).await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        let matches = crawler.crawl("query", 50, None).await;
        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "d"]);
        assert!(!crawler
            .source()
            .calls()
            .contains(&"fetch:page://c".to_string()));
    }

    #[tokio::test]
    async fn test_filtered_out_records_are_still_explored() {
        let (_dir, registry) = empty_registry().await;
        let mut popular = rec("b");
        popular.views = 2_000_000;
        let source = ScriptedSource::new(
            &[rec("a"), popular.clone()],
            &[("a", vec![]), ("b", vec![])],
        );
        let crawler = FrontierCrawler::new(source, registry);

        let spec = FilterSpec::new().with_views(Some(1_000_000), None);
        let matches = crawler.crawl("query", 50, Some(spec)).await;

        let ids: Vec<&str> = matches.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
        // a failed the filter but was still part of the frontier
        assert!(crawler
            .source()
            .calls()
            .contains(&"fetch:page://a".to_string()));
    }

    #[tokio::test]
    async fn test_refresh_exclusions_affects_only_later_discoveries() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry_with(&temp_dir, &[]).await;
        let source = ScriptedSource::new(
            &[rec("a"), rec("b")],
            &[
                ("a", vec![rec("c"), rec("d")]),
                ("b", vec![rec("e")]),
                ("c", vec![]),
                ("d", vec![]),
                ("e", vec![]),
            ],
        );
        let crawler = FrontierCrawler::new(source, registry.clone());

        let mut stream = crawler.stream_crawl("query", None).await;
        assert_eq!(stream.next().await.unwrap().id, "a");
        assert_eq!(stream.next().await.unwrap().id, "b");

        // d gets published downstream while the session is parked
        write_store(&temp_dir, &["d"]).await;
        registry.reload().await;
        stream.refresh_exclusions().await;

        let mut rest = Vec::new();
        while let Some(record) = stream.next().await {
            rest.push(record.id);
        }
        // c and e surface, d never does
        assert_eq!(rest, ["c", "e"]);
    }

    #[tokio::test]
    async fn test_into_stream_adapter_preserves_order() {
        use futures::StreamExt;

        let (_dir, registry) = empty_registry().await;
        let crawler = FrontierCrawler::new(diamond(), registry);

        let stream = crawler.stream_crawl("query", None).await.into_stream();
        let ids: Vec<String> = stream.map(|record| record.id).collect().await;
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }
}
