//! lesto: a query-optimization and response-caching layer for
//! document-oriented data stores.
//!
//! lesto sits between an application and a store exposing collection /
//! relation semantics and keeps round-trips down:
//!
//! - **[`cache`]**: bounded TTL caches with FIFO eviction, one handle per
//!   optimizer, no process-global state.
//! - **[`optimizer`]**: cached paged queries, batched fetch-by-id with
//!   dedup, generic relation population (the N+1 killer), and concurrent
//!   named queries.
//! - **[`response`]**: a request-scoped façade for API boundaries: typed
//!   query-parameter parsing, cached payloads with projection and
//!   compression, pagination envelopes.
//! - **[`advisor`]**: index recommendations derived from observed filter
//!   shapes.
//! - **[`monitor`]**: a sliding-window recorder of request latency and
//!   cache outcomes.
//!
//! The store itself stays behind the [`store::DocumentStore`] trait;
//! persistence, authentication, and rendering are the embedding
//! application's problem.
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lesto::cache::{CacheConfig, QueryCache, ResponseCache};
//! use lesto::config::Settings;
//! use lesto::optimizer::QueryOptimizer;
//!
//! # fn wire<S: lesto::store::DocumentStore + 'static>(store: Arc<S>) {
//! let settings = Settings::load(None).expect("settings");
//! let cache_config = CacheConfig::from(&settings.cache);
//! let query_cache = Arc::new(QueryCache::new(&cache_config));
//! let response_cache = Arc::new(ResponseCache::new(&cache_config));
//! let optimizer = QueryOptimizer::new(store, query_cache);
//! # let _ = (optimizer, response_cache);
//! # }
//! ```

pub mod advisor;
pub mod cache;
pub mod config;
pub mod domain;
pub mod monitor;
pub mod optimizer;
pub mod response;
pub mod store;
pub mod telemetry;

pub use advisor::{IndexRecommendation, PatternLog, QueryPattern, recommend};
pub use cache::{CacheConfig, CacheStats, QueryCache, ResponseCache, TtlCache};
pub use config::Settings;
pub use domain::{CompareOp, Document, DocumentId, FilterNode, PagedResult, QuerySpec};
pub use monitor::{MetricsReport, PerformanceMonitor, RequestMetric};
pub use optimizer::{MIN_RELATION_DEPTH, QueryError, QueryOptimizer};
pub use response::{
    CacheStatus, ErrorEnvelope, FetchPage, OptimizedResponse, PaginatedOptions, ParamSchema,
    ParamType, ResponseOptimizer, ResponseOptions,
};
pub use store::{DocumentStore, StoreError};
