//! Request-scoped response optimization.
//!
//! A [`ResponseOptimizer`] lives for one inbound request: it parses that
//! request's query parameters, answers from the response cache when it can,
//! and otherwise delegates to a fetcher before reshaping (transform, field
//! projection, compression) and caching the payload. Fetcher failures never
//! leak internals; callers get a stable error envelope instead.

mod params;
mod project;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error};

use crate::cache::{CachedPayload, ResponseCache, ResponseKey, response_key};
use crate::optimizer::QueryError;

pub use params::{ParamSchema, ParamType, ParamValue, TypedParams, ValidationError};
pub use project::{compress, select_fields};

/// Stable error kind strings for programmatic branching.
pub mod codes {
    pub const VALIDATION: &str = "validation_error";
    pub const STORE_UNAVAILABLE: &str = "store_unavailable";
    pub const INTERNAL: &str = "internal_error";
}

/// Whether a payload came from cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheStatus {
    #[serde(rename = "HIT")]
    Hit,
    #[serde(rename = "MISS")]
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// A payload plus the metadata the transport layer turns into headers.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizedResponse {
    pub payload: Value,
    pub cache: CacheStatus,
    /// Elapsed fetch-and-reshape time; only present on a miss.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub compressed: bool,
}

/// Client-facing failure envelope with an associated status code.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
    /// Populated in development mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    pub fn validation(err: &ValidationError, development: bool) -> Self {
        Self {
            status: 400,
            error: codes::VALIDATION.to_string(),
            message: development.then(|| err.to_string()),
        }
    }

    pub fn store_unavailable(detail: Option<String>) -> Self {
        Self {
            status: 503,
            error: codes::STORE_UNAVAILABLE.to_string(),
            message: detail,
        }
    }

    pub fn internal(detail: Option<String>) -> Self {
        Self {
            status: 500,
            error: codes::INTERNAL.to_string(),
            message: detail,
        }
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One fetched page as a paginated fetcher returns it.
#[derive(Debug, Clone)]
pub struct FetchPage {
    pub data: Vec<Value>,
    pub total: u64,
}

/// Whole-payload rewrite applied once after a miss.
pub type Transform = Box<dyn FnOnce(Value) -> Value + Send>;

/// Per-item rewrite applied to each element of a paginated `data` array.
pub type ItemTransform = Box<dyn Fn(Value) -> Value + Send>;

/// Options for [`ResponseOptimizer::create_response`].
#[derive(Default)]
pub struct ResponseOptions {
    pub fields: Option<Vec<String>>,
    pub transform: Option<Transform>,
    /// Replaces the route+query derived cache key.
    pub cache_key: Option<String>,
    pub compress: bool,
}

/// Options for [`ResponseOptimizer::create_paginated_response`].
#[derive(Default)]
pub struct PaginatedOptions {
    pub page: u32,
    pub limit: u32,
    pub max_limit: u32,
    pub fields: Option<Vec<String>>,
    pub transform: Option<ItemTransform>,
}

/// Request-scoped façade over the response cache.
pub struct ResponseOptimizer {
    cache: Arc<ResponseCache>,
    route: String,
    raw_query: Vec<(String, String)>,
    accepts_compression: bool,
    development: bool,
}

impl ResponseOptimizer {
    pub fn new(
        cache: Arc<ResponseCache>,
        route: impl Into<String>,
        raw_query: Vec<(String, String)>,
    ) -> Self {
        Self {
            cache,
            route: route.into(),
            raw_query,
            accepts_compression: false,
            development: false,
        }
    }

    /// Mark that the caller's transport can take a compressed payload.
    pub fn with_compression_support(mut self, accepts: bool) -> Self {
        self.accepts_compression = accepts;
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Coerce and validate this request's query parameters.
    pub fn parse_query(&self, schema: &ParamSchema) -> Result<TypedParams, ValidationError> {
        schema.parse(&self.raw_query)
    }

    /// Serve from cache or fetch, reshape, cache, and annotate.
    pub async fn create_response<F, Fut>(
        &self,
        fetcher: F,
        options: ResponseOptions,
    ) -> Result<OptimizedResponse, ErrorEnvelope>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, QueryError>>,
    {
        let key = match &options.cache_key {
            Some(custom) => ResponseKey::Custom(custom.clone()),
            None => response_key(&self.route, &self.raw_query),
        };

        if let Some(cached) = self.cache.get(&key) {
            debug!(
                cache = "response",
                outcome = "hit",
                route = %self.route,
                "serving cached payload"
            );
            return Ok(OptimizedResponse {
                payload: cached.payload,
                cache: CacheStatus::Hit,
                response_time_ms: None,
                compressed: cached.compressed,
            });
        }
        debug!(
            cache = "response",
            outcome = "miss",
            route = %self.route,
            "invoking fetcher"
        );

        let started_at = Instant::now();
        let mut payload = match fetcher().await {
            Ok(payload) => payload,
            Err(err) => return Err(self.fetch_failure(err)),
        };
        if let Some(transform) = options.transform {
            payload = transform(payload);
        }
        if let Some(fields) = &options.fields {
            payload = select_fields(&payload, fields);
        }
        let compressed = options.compress && self.accepts_compression;
        if compressed {
            payload = compress(&payload);
        }

        self.cache.set(
            key,
            CachedPayload {
                payload: payload.clone(),
                compressed,
            },
        );
        Ok(OptimizedResponse {
            payload,
            cache: CacheStatus::Miss,
            response_time_ms: Some(started_at.elapsed().as_millis() as u64),
            compressed,
        })
    }

    /// Fetch one page and wrap it in the pagination envelope.
    ///
    /// `limit` is clamped to `max_limit` and the fetcher receives
    /// `(limit, offset)` with `offset = (page - 1) * limit`. The per-item
    /// transform and projection run on the `data` array before the envelope
    /// is assembled, so the `pagination` block is never reshaped away.
    pub async fn create_paginated_response<F, Fut>(
        &self,
        fetcher: F,
        options: PaginatedOptions,
    ) -> Result<OptimizedResponse, ErrorEnvelope>
    where
        F: FnOnce(u32, u64) -> Fut,
        Fut: Future<Output = Result<FetchPage, QueryError>>,
    {
        let page = options.page.max(1);
        let limit = options.limit.clamp(1, options.max_limit.max(1));
        let offset = u64::from(page - 1) * u64::from(limit);
        let fields = options.fields;
        let transform = options.transform;

        self.create_response(
            || async move {
                let fetched = fetcher(limit, offset).await?;
                let mut data = fetched.data;
                if let Some(transform) = &transform {
                    data = data.into_iter().map(|item| transform(item)).collect();
                }
                if let Some(fields) = &fields {
                    data = data.iter().map(|item| select_fields(item, fields)).collect();
                }
                let pagination = Pagination {
                    page,
                    limit,
                    total: fetched.total,
                    pages: fetched.total.div_ceil(u64::from(limit)),
                    has_next: u64::from(page) * u64::from(limit) < fetched.total,
                    has_prev: page > 1,
                };
                Ok(json!({ "data": data, "pagination": pagination }))
            },
            ResponseOptions::default(),
        )
        .await
    }

    fn fetch_failure(&self, err: QueryError) -> ErrorEnvelope {
        if self.development {
            error!(route = %self.route, error = %err, "fetcher failed");
            ErrorEnvelope::store_unavailable(Some(err.to_string()))
        } else {
            error!(route = %self.route, "fetcher failed");
            ErrorEnvelope::store_unavailable(None)
        }
    }
}
