//! Cache configuration.
//!
//! Controls the entity and query caches via `brezza.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_ENTITY_LIMIT: usize = 500;
const DEFAULT_QUERY_LIMIT: usize = 50;

/// Cache configuration from `brezza.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the entity and query caches.
    pub enabled: bool,
    /// Maximum cached entities per kind.
    pub entity_limit: usize,
    /// Maximum cached query results per kind.
    pub query_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entity_limit: DEFAULT_ENTITY_LIMIT,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            entity_limit: settings.entity_limit,
            query_limit: settings.query_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the per-kind entity limit as NonZeroUsize, clamping to 1 if zero.
    pub fn entity_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entity_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the per-kind query limit as NonZeroUsize, clamping to 1 if zero.
    pub fn query_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.entity_limit, 500);
        assert_eq!(config.query_limit, 50);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            entity_limit: 0,
            query_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.entity_limit_non_zero().get(), 1);
        assert_eq!(config.query_limit_non_zero().get(), 1);
    }
}
