use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::entry::Entry;
use crate::fetcher::{ContentFetcher, FetchError};
use crate::parser::parse_document;

/// How long a parsed catalog stays fresh.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Wall clock used for freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Parsed catalog plus the moment it was fetched. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub fetched_at: DateTime<Utc>,
}

/// Holds the last parsed catalog and reloads it when it goes stale.
///
/// Reloads go through a single gate, so at most one fetch-and-replace is in
/// flight per cache. Readers always see a complete snapshot, either the old
/// one or the new one.
pub struct CatalogCache {
    fetcher: Arc<dyn ContentFetcher>,
    clock: Arc<dyn Clock>,
    source: String,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    reload_gate: Mutex<()>,
}

impl CatalogCache {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, source: impl Into<String>) -> Self {
        Self::with_clock(fetcher, source, Arc::new(SystemClock), DEFAULT_TTL)
    }

    pub fn with_clock(
        fetcher: Arc<dyn ContentFetcher>,
        source: impl Into<String>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            clock,
            source: source.into(),
            ttl,
            snapshot: RwLock::new(None),
            reload_gate: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Currently installed snapshot, without checking freshness.
    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        if snapshot.entries.is_empty() {
            return true;
        }
        // A clock that moved backwards yields a negative age, which is not stale.
        (self.clock.now() - snapshot.fetched_at)
            .to_std()
            .is_ok_and(|age| age > self.ttl)
    }

    async fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current()
            .await
            .filter(|snapshot| !self.is_stale(snapshot))
    }

    /// Returns a fresh snapshot, reloading the catalog if it is missing,
    /// empty or older than the TTL.
    ///
    /// On failure the previous snapshot stays installed.
    pub async fn ensure_fresh(&self) -> Result<Arc<Snapshot>, FetchError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _gate = self.reload_gate.lock().await;
        // Another caller may have reloaded while we waited on the gate.
        if let Some(snapshot) = self.fresh_snapshot().await {
            tracing::debug!("Catalog reloaded by a concurrent caller, reusing it");
            return Ok(snapshot);
        }
        self.reload().await
    }

    /// Reloads the catalog regardless of its age.
    pub async fn force_refresh(&self) -> Result<Arc<Snapshot>, FetchError> {
        let _gate = self.reload_gate.lock().await;
        self.reload().await
    }

    async fn reload(&self) -> Result<Arc<Snapshot>, FetchError> {
        let text = self.fetcher.fetch(&self.source).await.inspect_err(|e| {
            tracing::warn!("Catalog reload from {} failed: {}", self.source, e);
        })?;

        let snapshot = Arc::new(Snapshot {
            entries: parse_document(&text),
            fetched_at: self.clock.now(),
        });
        *self.snapshot.write().await = Some(snapshot.clone());

        tracing::info!(
            "Catalog reloaded from {}: {} entries",
            self.source,
            snapshot.entries.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    pub(crate) const SAMPLE_DOC: &str = "\
# Model Context Protocol servers

These servers aim to demonstrate MCP features and the official SDKs.

- **[Everything](src/everything)** - Reference / test server with prompts, resources, and tools
- **[Git](https://github.com/modelcontextprotocol/servers/tree/main/src/git)** - Tools to read, search, and manipulate Git repositories

Official integrations are maintained by companies building production ready MCP servers for their platforms.

- **[Axiom](https://github.com/axiomhq/mcp-server-axiom)** - Query and analyze your logs using APL
- [API Server](https://api.example.com) - External API server

A growing set of community-developed and maintained servers demonstrates various applications of MCP across different domains.

- [BigQuery](https://github.com/LucasHild/mcp-server-bigquery) (by LucasHild) - This server enables LLMs to inspect database schemas
- **[Docker](https://github.com/ckreiling/mcp-server-docker)** - Manage containers, images, volumes, and networks
- [Weather](https://github.com/example/weather) - Forecasts via the [NWS API](https://weather.gov)
";

    /// Fetcher returning a configurable document and counting calls.
    pub(crate) struct MockFetcher {
        pub body: StdMutex<String>,
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
        pub delay: Duration,
    }

    impl MockFetcher {
        pub fn new(body: &str) -> Self {
            Self {
                body: StdMutex::new(body.to_string()),
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                delay: Duration::ZERO,
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn fetch(&self, _source: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(FetchError::UrlError(url::ParseError::EmptyHost));
            }
            Ok(self.body.lock().unwrap().clone())
        }
    }

    pub(crate) struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        pub fn new() -> Self {
            Self(StdMutex::new(Utc::now()))
        }

        pub fn advance(&self, by: TimeDelta) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn setup_cache(fetcher: Arc<MockFetcher>) -> (CatalogCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = CatalogCache::with_clock(fetcher, "mock://catalog", clock.clone(), DEFAULT_TTL);
        (cache, clock)
    }

    #[tokio::test]
    async fn test_first_access_fetches() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (cache, _clock) = setup_cache(fetcher.clone());

        assert!(cache.current().await.is_none());
        let snapshot = cache.ensure_fresh().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(snapshot.entries.len(), 7);
        assert_eq!(cache.current().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_fresh_snapshot_is_reused() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (cache, clock) = setup_cache(fetcher.clone());

        let first = cache.ensure_fresh().await.unwrap();
        clock.advance(TimeDelta::minutes(59));
        let second = cache.ensure_fresh().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_reloaded() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (cache, clock) = setup_cache(fetcher.clone());

        let first = cache.ensure_fresh().await.unwrap();
        clock.advance(TimeDelta::minutes(61));
        let second = cache.ensure_fresh().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert!(second.fetched_at > first.fetched_at);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_refetched() {
        let fetcher = Arc::new(MockFetcher::new("no sections here"));
        let (cache, _clock) = setup_cache(fetcher.clone());

        assert!(cache.ensure_fresh().await.unwrap().entries.is_empty());
        assert!(cache.ensure_fresh().await.unwrap().entries.is_empty());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (cache, clock) = setup_cache(fetcher.clone());

        let first = cache.ensure_fresh().await.unwrap();
        clock.advance(TimeDelta::hours(2));
        fetcher.fail.store(true, Ordering::SeqCst);

        assert!(cache.ensure_fresh().await.is_err());
        assert!(cache.force_refresh().await.is_err());
        let kept = cache.current().await.unwrap();
        assert!(Arc::ptr_eq(&first, &kept));
        assert_eq!(kept.fetched_at, first.fetched_at);
    }

    #[tokio::test]
    async fn test_failure_on_empty_cache() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        fetcher.fail.store(true, Ordering::SeqCst);
        let (cache, _clock) = setup_cache(fetcher.clone());

        assert!(cache.ensure_fresh().await.is_err());
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_force_refresh_ignores_ttl() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (cache, _clock) = setup_cache(fetcher.clone());

        cache.ensure_fresh().await.unwrap();
        *fetcher.body.lock().unwrap() = SAMPLE_DOC.lines().take(6).collect::<Vec<_>>().join("\n");
        let refreshed = cache.force_refresh().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(refreshed.entries.len(), 2);
        assert_eq!(cache.current().await.unwrap().entries.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_reload() {
        let mut mock = MockFetcher::new(SAMPLE_DOC);
        mock.delay = Duration::from_millis(50);
        let fetcher = Arc::new(mock);
        let (cache, _clock) = setup_cache(fetcher.clone());

        let (a, b, c) = tokio::join!(cache.ensure_fresh(), cache.ensure_fresh(), cache.ensure_fresh());

        assert_eq!(fetcher.calls(), 1);
        let a = a.unwrap();
        assert!(Arc::ptr_eq(&a, &b.unwrap()));
        assert!(Arc::ptr_eq(&a, &c.unwrap()));
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_DOC));
        let (first, _) = setup_cache(fetcher.clone());
        let (second, _) = setup_cache(fetcher.clone());

        first.ensure_fresh().await.unwrap();
        assert!(second.current().await.is_none());
    }
}
