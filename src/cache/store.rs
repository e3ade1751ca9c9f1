//! Typed cache stores shared by the optimizers.
//!
//! Two handles, one per optimizer: `QueryCache` holds documents by id and
//! paged find results; `ResponseCache` holds assembled response payloads.
//! Both are explicitly constructed and passed around as `Arc` handles;
//! there is no process-global cache.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{Document, PagedResult};

use super::config::CacheConfig;
use super::keys::{DocKey, FindKey, ResponseKey};
use super::ttl::TtlCache;

// ============================================================================
// Query cache
// ============================================================================

/// Cache backing the query optimizer.
pub struct QueryCache {
    docs: TtlCache<DocKey, Document>,
    pages: TtlCache<FindKey, PagedResult>,
    enabled: bool,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            docs: TtlCache::new("query_docs", config.ttl(), config.doc_limit_non_zero()),
            pages: TtlCache::new("query_pages", config.ttl(), config.find_limit_non_zero()),
            enabled: config.enable_query_cache,
        }
    }

    pub fn get_doc(&self, key: &DocKey) -> Option<Document> {
        if !self.enabled {
            return None;
        }
        self.docs.get(key)
    }

    pub fn set_doc(&self, key: DocKey, doc: Document) {
        if self.enabled {
            self.docs.set(key, doc);
        }
    }

    pub fn get_page(&self, key: &FindKey) -> Option<PagedResult> {
        if !self.enabled {
            return None;
        }
        self.pages.get(key)
    }

    pub fn set_page(&self, key: FindKey, page: PagedResult) {
        if self.enabled {
            self.pages.set(key, page);
        }
    }

    /// Drop every cached document and find result.
    pub fn clear(&self) {
        self.docs.clear();
        self.pages.clear();
    }

    /// Proactively remove expired entries; returns how many were dropped.
    pub fn clear_expired(&self) -> usize {
        self.docs.clear_expired() + self.pages.clear_expired()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            docs: self.docs.len(),
            pages: self.pages.len(),
        }
    }
}

/// Entry counts for an ops/admin surface.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub docs: usize,
    pub pages: usize,
}

// ============================================================================
// Response cache
// ============================================================================

/// A cached response payload.
#[derive(Debug, Clone)]
pub struct CachedPayload {
    pub payload: Value,
    pub compressed: bool,
}

/// Cache backing the response optimizer.
pub struct ResponseCache {
    responses: TtlCache<ResponseKey, CachedPayload>,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            responses: TtlCache::new("responses", config.ttl(), config.response_limit_non_zero()),
            enabled: config.enable_response_cache,
        }
    }

    pub fn get(&self, key: &ResponseKey) -> Option<CachedPayload> {
        if !self.enabled {
            return None;
        }
        self.responses.get(key)
    }

    pub fn set(&self, key: ResponseKey, payload: CachedPayload) -> Option<ResponseKey> {
        if !self.enabled {
            return None;
        }
        self.responses.set(key, payload)
    }

    pub fn clear(&self) {
        self.responses.clear();
    }

    pub fn clear_expired(&self) -> usize {
        self.responses.clear_expired()
    }

    /// Get the number of cached responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
