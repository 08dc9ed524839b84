//! Post cache.
//!
//! Serves the date-ordered post list from memory for a configurable TTL and
//! lets writers drop it after a mutation:
//!
//! ```toml
//! [cache]
//! ttl_seconds = 120
//! single_flight = false
//! ```

mod config;
mod lock;
mod posts;

pub use config::CacheConfig;
pub use posts::{CacheStatus, FetchError, PostCache, PostSnapshot};

pub(crate) use posts::{
    METRIC_FETCH, METRIC_FETCH_ERROR, METRIC_FETCH_MS, METRIC_HIT, METRIC_INVALIDATE, METRIC_MISS,
};
