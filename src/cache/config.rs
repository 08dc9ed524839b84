//! Post cache configuration.
//!
//! Controlled through the `[cache]` section of `studio-blog.toml`.

use std::time::Duration;

const DEFAULT_TTL_SECS: u64 = 120;

/// Post cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched snapshot is served without going upstream.
    pub ttl: Duration,
    /// Serialize refreshes so concurrent stale readers share one upstream read.
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            single_flight: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            single_flight: settings.single_flight,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert!(!config.single_flight);
    }

    #[test]
    fn built_from_loaded_settings() {
        let settings = crate::config::CacheSettings {
            ttl: Duration::from_secs(30),
            single_flight: true,
        };
        let config = CacheConfig::from(&settings);
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert!(config.single_flight);
    }
}
