//! Time-bounded post snapshot cache.
//!
//! Holds the full, date-ordered post list from the upstream store. A snapshot
//! is reused until it is older than the configured TTL, replaced wholesale on
//! every successful fetch, and dropped by [`PostCache::invalidate`]. Failed
//! fetches never touch the current snapshot.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::posts::{Post, sort_newest_first};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::posts";

pub(crate) const METRIC_HIT: &str = "studio_blog_post_cache_hit_total";
pub(crate) const METRIC_MISS: &str = "studio_blog_post_cache_miss_total";
pub(crate) const METRIC_FETCH: &str = "studio_blog_post_cache_fetch_total";
pub(crate) const METRIC_FETCH_ERROR: &str = "studio_blog_post_cache_fetch_error_total";
pub(crate) const METRIC_INVALIDATE: &str = "studio_blog_post_cache_invalidate_total";
pub(crate) const METRIC_FETCH_MS: &str = "studio_blog_post_cache_fetch_ms";

/// Shared, immutable view of the cached post list.
pub type PostSnapshot = Arc<[Post]>;

/// The upstream read failed. The store's error is carried unchanged.
#[derive(Debug, Error)]
#[error("failed to fetch posts from the document store: {source}")]
pub struct FetchError {
    #[from]
    source: RepoError,
}

impl FetchError {
    pub fn repo_error(&self) -> &RepoError {
        &self.source
    }
}

/// Where the cache sits in its `Empty → Fresh → Stale` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheStatus {
    Empty,
    Fresh { age_ms: u64, len: usize },
    Stale { age_ms: u64, len: usize },
}

#[derive(Clone)]
struct Snapshot {
    posts: PostSnapshot,
    fetched_at: Instant,
}

pub struct PostCache {
    upstream: Arc<dyn PostsRepo>,
    config: CacheConfig,
    snapshot: RwLock<Option<Snapshot>>,
    refresh_gate: Mutex<()>,
}

impl PostCache {
    pub fn new(upstream: Arc<dyn PostsRepo>, config: CacheConfig) -> Self {
        Self {
            upstream,
            config,
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Return the post list, going upstream only when forced, empty, or stale.
    #[instrument(skip(self))]
    pub async fn get_posts(&self, force_refresh: bool) -> Result<PostSnapshot, FetchError> {
        if !force_refresh && let Some(posts) = self.fresh_posts() {
            counter!(METRIC_HIT, "op" => "list").increment(1);
            return Ok(posts);
        }

        if !self.config.single_flight {
            counter!(METRIC_MISS, "op" => "list").increment(1);
            return self.refresh().await;
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited on the gate.
        if !force_refresh && let Some(posts) = self.fresh_posts() {
            counter!(METRIC_HIT, "op" => "list").increment(1);
            return Ok(posts);
        }
        counter!(METRIC_MISS, "op" => "list").increment(1);
        self.refresh().await
    }

    /// Look a post up in the current snapshot, falling back to the store.
    ///
    /// Staleness is ignored for local hits. The fallback lookup leaves the
    /// snapshot alone.
    #[instrument(skip(self))]
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, FetchError> {
        if let Some(post) = self.find_local(slug) {
            counter!(METRIC_HIT, "op" => "slug").increment(1);
            return Ok(Some(post));
        }

        counter!(METRIC_MISS, "op" => "slug").increment(1);
        let found = self.upstream.find_post_by_slug(slug).await.map_err(|err| {
            counter!(METRIC_FETCH_ERROR).increment(1);
            warn!(target = "studio_blog::cache", slug, error = %err, "post lookup failed");
            FetchError::from(err)
        })?;
        Ok(found)
    }

    /// Drop the snapshot so the next `get_posts` goes upstream.
    pub fn invalidate(&self) {
        let previous = rw_write(&self.snapshot, SOURCE, "invalidate").take();
        counter!(METRIC_INVALIDATE).increment(1);
        debug!(
            target = "studio_blog::cache",
            had_snapshot = previous.is_some(),
            "post cache invalidated"
        );
    }

    pub fn status(&self) -> CacheStatus {
        let guard = rw_read(&self.snapshot, SOURCE, "status");
        match guard.as_ref() {
            None => CacheStatus::Empty,
            Some(snapshot) => {
                let age = snapshot.fetched_at.elapsed();
                let age_ms = u64::try_from(age.as_millis()).unwrap_or(u64::MAX);
                let len = snapshot.posts.len();
                if self.is_fresh(age) {
                    CacheStatus::Fresh { age_ms, len }
                } else {
                    CacheStatus::Stale { age_ms, len }
                }
            }
        }
    }

    async fn refresh(&self) -> Result<PostSnapshot, FetchError> {
        let started = Instant::now();
        counter!(METRIC_FETCH).increment(1);

        let mut posts = match self.upstream.list_posts().await {
            Ok(posts) => posts,
            Err(err) => {
                counter!(METRIC_FETCH_ERROR).increment(1);
                warn!(
                    target = "studio_blog::cache",
                    error = %err,
                    "post list fetch failed; keeping previous snapshot"
                );
                return Err(FetchError::from(err));
            }
        };

        sort_newest_first(&mut posts);
        let posts: PostSnapshot = posts.into();
        let fetched_at = Instant::now();

        *rw_write(&self.snapshot, SOURCE, "refresh") = Some(Snapshot {
            posts: Arc::clone(&posts),
            fetched_at,
        });

        let elapsed = fetched_at.duration_since(started);
        histogram!(METRIC_FETCH_MS).record(elapsed.as_secs_f64() * 1000.0);
        debug!(
            target = "studio_blog::cache",
            count = posts.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "post cache refreshed"
        );

        Ok(posts)
    }

    fn fresh_posts(&self) -> Option<PostSnapshot> {
        let guard = rw_read(&self.snapshot, SOURCE, "fresh_posts");
        let snapshot = guard.as_ref()?;
        self.is_fresh(snapshot.fetched_at.elapsed())
            .then(|| Arc::clone(&snapshot.posts))
    }

    fn find_local(&self, slug: &str) -> Option<Post> {
        let guard = rw_read(&self.snapshot, SOURCE, "find_local");
        guard
            .as_ref()?
            .posts
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
    }

    fn is_fresh(&self, age: Duration) -> bool {
        age < self.config.ttl
    }
}
