//! Behaviour of the post snapshot cache against a scripted upstream.

mod support;

use std::sync::Arc;
use std::time::Duration;

use studio_blog::application::repos::RepoError;
use studio_blog::cache::{CacheConfig, CacheStatus, PostCache};

use support::{ScriptedStore, post, slugs};

const TTL: Duration = Duration::from_secs(120);

fn cache_over(store: &Arc<ScriptedStore>) -> PostCache {
    PostCache::new(store.clone(), CacheConfig::with_ttl(TTL))
}

fn two_posts() -> Arc<ScriptedStore> {
    Arc::new(ScriptedStore::with_posts(vec![
        post("b", "2024-01-01"),
        post("a", "2024-01-02"),
    ]))
}

#[tokio::test(start_paused = true)]
async fn first_read_fetches_and_orders_newest_first() {
    let store = two_posts();
    let cache = cache_over(&store);

    let posts = cache.get_posts(false).await.expect("posts");

    assert_eq!(slugs(&posts), ["a", "b"]);
    assert_eq!(store.list_calls(), 1);
    assert!(matches!(
        cache.status(),
        CacheStatus::Fresh { age_ms: 0, len: 2 }
    ));
}

#[tokio::test(start_paused = true)]
async fn reads_within_ttl_reuse_the_same_snapshot() {
    let store = two_posts();
    let cache = cache_over(&store);

    let first = cache.get_posts(false).await.expect("first");
    tokio::time::advance(Duration::from_secs(60)).await;
    let second = cache.get_posts(false).await.expect("second");
    tokio::time::advance(Duration::from_secs(59)).await;
    let third = cache.get_posts(false).await.expect("third");

    assert_eq!(store.list_calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
}

#[tokio::test(start_paused = true)]
async fn snapshot_expires_exactly_at_ttl() {
    let store = two_posts();
    let cache = cache_over(&store);

    let first = cache.get_posts(false).await.expect("first");
    tokio::time::advance(TTL).await;
    assert!(matches!(cache.status(), CacheStatus::Stale { len: 2, .. }));

    let second = cache.get_posts(false).await.expect("second");
    assert_eq!(store.list_calls(), 2);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test(start_paused = true)]
async fn forced_refresh_always_goes_upstream() {
    let store = two_posts();
    let cache = cache_over(&store);

    cache.get_posts(false).await.expect("warm");
    for _ in 0..3 {
        cache.get_posts(true).await.expect("forced");
    }

    assert_eq!(store.list_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn forced_refresh_replaces_snapshot_with_new_upstream_data() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");

    store.set_posts(vec![post("c", "2024-03-01"), post("a", "2024-01-02")]);
    let refreshed = cache.get_posts(true).await.expect("forced");

    assert_eq!(slugs(&refreshed), ["c", "a"]);
    let cached = cache.get_posts(false).await.expect("cached");
    assert!(Arc::ptr_eq(&refreshed, &cached));
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidate_forces_next_read_upstream() {
    let store = two_posts();
    let cache = cache_over(&store);

    cache.get_posts(false).await.expect("warm");
    cache.invalidate();
    assert_eq!(cache.status(), CacheStatus::Empty);

    let posts = cache.get_posts(false).await.expect("refetch");
    assert_eq!(store.list_calls(), 2);
    assert_eq!(slugs(&posts), ["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn invalidate_on_empty_cache_is_harmless() {
    let store = two_posts();
    let cache = cache_over(&store);

    cache.invalidate();
    cache.invalidate();

    assert_eq!(cache.status(), CacheStatus::Empty);
    assert_eq!(store.list_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn slug_lookup_hits_snapshot_without_upstream_call() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");

    let found = cache.get_post_by_slug("b").await.expect("lookup");

    assert_eq!(found.map(|p| p.slug), Some("b".to_string()));
    assert_eq!(store.slug_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn slug_lookup_serves_stale_snapshot_hits() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");

    tokio::time::advance(TTL * 3).await;
    let found = cache.get_post_by_slug("a").await.expect("lookup");

    assert!(found.is_some());
    assert_eq!(store.slug_calls(), 0);
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slug_miss_falls_through_to_point_lookup() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");

    let missing = cache.get_post_by_slug("z").await.expect("lookup");

    assert!(missing.is_none());
    assert_eq!(store.slug_calls(), 1);
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn slug_lookup_on_empty_cache_does_not_populate_snapshot() {
    let store = two_posts();
    let cache = cache_over(&store);

    let found = cache.get_post_by_slug("a").await.expect("lookup");

    assert_eq!(found.map(|p| p.slug), Some("a".to_string()));
    assert_eq!(store.slug_calls(), 1);
    assert_eq!(store.list_calls(), 0);
    assert_eq!(cache.status(), CacheStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn upstream_point_lookup_failure_is_reported() {
    let store = two_posts();
    let cache = cache_over(&store);
    store.fail(true);

    let err = cache
        .get_post_by_slug("a")
        .await
        .expect_err("lookup should fail");

    assert!(matches!(err.repo_error(), RepoError::Persistence(_)));
}

#[tokio::test(start_paused = true)]
async fn failed_forced_refresh_keeps_previous_snapshot() {
    let store = two_posts();
    let cache = cache_over(&store);
    let original = cache.get_posts(false).await.expect("warm");

    store.fail(true);
    cache
        .get_posts(true)
        .await
        .expect_err("forced refresh should fail");

    tokio::time::advance(Duration::from_secs(10)).await;
    let after = cache.get_posts(false).await.expect("cached read");

    assert!(Arc::ptr_eq(&original, &after));
    assert_eq!(slugs(&after), ["a", "b"]);
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_stale_refetch_keeps_data_for_slug_lookups() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");

    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    store.fail(true);
    cache
        .get_posts(false)
        .await
        .expect_err("stale refetch should fail");

    assert!(matches!(cache.status(), CacheStatus::Stale { len: 2, .. }));
    let found = cache.get_post_by_slug("b").await.expect("local hit");
    assert!(found.is_some());

    store.fail(false);
    let recovered = cache.get_posts(false).await.expect("recovered");
    assert_eq!(slugs(&recovered), ["a", "b"]);
    assert!(matches!(cache.status(), CacheStatus::Fresh { .. }));
}

#[tokio::test(start_paused = true)]
async fn failure_on_empty_cache_leaves_it_empty() {
    let store = two_posts();
    let cache = cache_over(&store);
    store.fail(true);

    cache.get_posts(false).await.expect_err("fetch should fail");

    assert_eq!(cache.status(), CacheStatus::Empty);
}

#[tokio::test(start_paused = true)]
async fn equal_dates_keep_upstream_order() {
    let store = Arc::new(ScriptedStore::with_posts(vec![
        post("old", "2023-12-31"),
        post("tie-1", "2024-01-05"),
        post("tie-2", "2024-01-05"),
        post("new", "2024-02-01"),
    ]));
    let cache = cache_over(&store);

    let posts = cache.get_posts(false).await.expect("posts");

    assert_eq!(slugs(&posts), ["new", "tie-1", "tie-2", "old"]);
}

#[tokio::test(start_paused = true)]
async fn empty_upstream_is_a_valid_fresh_snapshot() {
    let store = Arc::new(ScriptedStore::default());
    let cache = cache_over(&store);

    let posts = cache.get_posts(false).await.expect("posts");
    cache.get_posts(false).await.expect("cached");

    assert!(posts.is_empty());
    assert_eq!(store.list_calls(), 1);
    assert!(matches!(cache.status(), CacheStatus::Fresh { len: 0, .. }));
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_each_fetch_without_single_flight() {
    let store = two_posts();
    store.stall(Duration::from_millis(50));
    let cache = cache_over(&store);

    let (left, right) = futures::join!(cache.get_posts(false), cache.get_posts(false));

    left.expect("left");
    right.expect("right");
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn later_finishing_fetch_replaces_earlier_one() {
    let store = two_posts();
    let cache = cache_over(&store);
    store.stall(Duration::from_millis(100));

    let slow = async { cache.get_posts(false).await };
    let fast = async {
        tokio::time::sleep(Duration::from_millis(1)).await;
        store.stall(Duration::from_millis(20));
        cache.get_posts(false).await
    };
    let edit = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.set_posts(vec![post("c", "2024-03-01")]);
    };
    let (slow, fast, ()) = futures::join!(slow, fast, edit);

    assert_eq!(slugs(&fast.expect("fast")), ["a", "b"]);
    assert_eq!(slugs(&slow.expect("slow")), ["c"]);
    assert_eq!(store.list_calls(), 2);

    let posts = cache.get_posts(false).await.expect("cached");
    assert_eq!(slugs(&posts), ["c"]);
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidate_during_fetch_is_overwritten_by_that_fetch() {
    let store = two_posts();
    let cache = cache_over(&store);
    cache.get_posts(false).await.expect("warm");
    store.set_posts(vec![post("old", "2024-01-01"), post("new", "2024-02-01")]);
    store.stall(Duration::from_millis(100));

    let forced = async { cache.get_posts(true).await };
    let invalidate = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate();
        cache.status()
    };
    let (forced, status_mid_flight) = futures::join!(forced, invalidate);

    assert_eq!(status_mid_flight, CacheStatus::Empty);
    assert_eq!(slugs(&forced.expect("forced")), ["new", "old"]);
    assert!(matches!(cache.status(), CacheStatus::Fresh { len: 2, .. }));

    let posts = cache.get_posts(false).await.expect("cached");
    assert_eq!(slugs(&posts), ["new", "old"]);
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn single_flight_coalesces_concurrent_misses() {
    let store = two_posts();
    store.stall(Duration::from_millis(50));
    let cache = PostCache::new(
        store.clone(),
        CacheConfig {
            ttl: TTL,
            single_flight: true,
        },
    );

    let (left, right, third) = futures::join!(
        cache.get_posts(false),
        cache.get_posts(false),
        cache.get_posts(false)
    );

    let left = left.expect("left");
    assert!(Arc::ptr_eq(&left, &right.expect("right")));
    assert!(Arc::ptr_eq(&left, &third.expect("third")));
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn single_flight_still_honours_forced_refresh() {
    let store = two_posts();
    let cache = PostCache::new(
        store.clone(),
        CacheConfig {
            ttl: TTL,
            single_flight: true,
        },
    );

    cache.get_posts(false).await.expect("warm");
    cache.get_posts(true).await.expect("forced");

    assert_eq!(store.list_calls(), 2);
}
