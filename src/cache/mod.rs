//! Bounded TTL caching for query results and response payloads.
//!
//! Two layers share one generic store:
//!
//! - **Query cache**: documents by id and paged find results, keyed by
//!   result identity (collection, filter shape, locale, page, limit, sort).
//! - **Response cache**: assembled response payloads keyed by route plus
//!   normalized query string.
//!
//! Entries expire after a configurable TTL (lazily, on read) and the
//! earliest-inserted entry is evicted when a cache exceeds its capacity.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enable_query_cache = true
//! enable_response_cache = true
//! ttl_secs = 300
//! doc_limit = 1000
//! # ... see config.rs for all options
//! ```

mod config;
mod keys;
pub(crate) mod lock;
mod store;
mod ttl;

pub use config::CacheConfig;
pub use keys::{
    DocKey, FindKey, ResponseKey, VOLATILE_PARAMS, doc_key, find_key, hash_value,
    normalized_query, response_key,
};
pub use store::{CacheStats, CachedPayload, QueryCache, ResponseCache};
pub use ttl::TtlCache;
