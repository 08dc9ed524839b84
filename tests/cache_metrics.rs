//! Metric keys emitted by the post cache.

mod support;

use std::collections::HashMap;
use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use studio_blog::cache::{CacheConfig, PostCache};

use support::{ScriptedStore, post};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let store = Arc::new(ScriptedStore::with_posts(vec![post("a", "2024-01-01")]));
    let cache = PostCache::new(store.clone(), CacheConfig::default());

    cache.get_posts(false).await.expect("miss");
    cache.get_posts(false).await.expect("hit");
    cache.get_post_by_slug("a").await.expect("slug hit");
    cache.get_post_by_slug("zzz").await.expect("slug miss");
    cache.invalidate();
    store.fail(true);
    cache.get_posts(false).await.expect_err("fetch error");

    let mut counters: HashMap<(String, Option<String>), u64> = HashMap::new();
    let mut histograms = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let key = composite_key.key();
        let op = key
            .labels()
            .find(|label| label.key() == "op")
            .map(|label| label.value().to_string());
        match value {
            DebugValue::Counter(count) => {
                counters.insert((key.name().to_string(), op), count);
            }
            DebugValue::Histogram(_) => histograms.push(key.name().to_string()),
            _ => {}
        }
    }

    let count = |name: &str, op: Option<&str>| {
        counters
            .get(&(name.to_string(), op.map(str::to_string)))
            .copied()
            .unwrap_or(0)
    };

    assert_eq!(count("studio_blog_post_cache_miss_total", Some("list")), 2);
    assert_eq!(count("studio_blog_post_cache_hit_total", Some("list")), 1);
    assert_eq!(count("studio_blog_post_cache_hit_total", Some("slug")), 1);
    assert_eq!(count("studio_blog_post_cache_miss_total", Some("slug")), 1);
    assert_eq!(count("studio_blog_post_cache_fetch_total", None), 2);
    assert_eq!(count("studio_blog_post_cache_fetch_error_total", None), 1);
    assert_eq!(count("studio_blog_post_cache_invalidate_total", None), 1);
    assert!(histograms.contains(&"studio_blog_post_cache_fetch_ms".to_string()));
}
