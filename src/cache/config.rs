//! Cache configuration.
//!
//! Controls the query (document + paged-find) cache and the response cache.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_TTL_SECS: u64 = 300;
const DEFAULT_DOC_LIMIT: usize = 1000;
const DEFAULT_FIND_LIMIT: usize = 200;
const DEFAULT_RESPONSE_LIMIT: usize = 200;

/// Cache tuning knobs, usually sourced from [`crate::config::CacheSettings`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the query-layer caches (documents by id, paged find results).
    pub enable_query_cache: bool,
    /// Enable the response payload cache.
    pub enable_response_cache: bool,
    /// Time-to-live applied to every entry unless overridden per entry.
    pub ttl_secs: u64,
    /// Maximum documents held by id.
    pub doc_limit: usize,
    /// Maximum cached paged find results.
    pub find_limit: usize,
    /// Maximum cached response payloads.
    pub response_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_query_cache: true,
            enable_response_cache: true,
            ttl_secs: DEFAULT_TTL_SECS,
            doc_limit: DEFAULT_DOC_LIMIT,
            find_limit: DEFAULT_FIND_LIMIT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_query_cache: settings.enable_query_cache,
            enable_response_cache: settings.enable_response_cache,
            ttl_secs: settings.ttl_secs,
            doc_limit: settings.doc_limit,
            find_limit: settings.find_limit,
            response_limit: settings.response_limit,
        }
    }
}

impl CacheConfig {
    /// Returns true if any cache layer is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enable_query_cache || self.enable_response_cache
    }

    /// The configured time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the document limit as NonZeroUsize, clamping to 1 if zero.
    pub fn doc_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.doc_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the find-result limit as NonZeroUsize, clamping to 1 if zero.
    pub fn find_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.find_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
