//! Query optimizer: cached finds, batched id fetches, relation population,
//! and parallel execution over a document store.
//!
//! The optimizer is stateless per call; the only shared state is the
//! [`QueryCache`] handle it was constructed with. Cache writes happen after
//! a store call completes, so a cancelled (dropped) call never caches a
//! partial result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::advisor::{PatternLog, QueryPattern};
use crate::cache::{QueryCache, doc_key, find_key};
use crate::domain::{
    CompareOp, Document, DocumentId, FilterNode, PagedResult, QuerySpec, document_id, relation_ids,
};
use crate::store::{DocumentStore, StoreError};

/// Relation depth floor applied to every store query.
///
/// Shallower depths silently drop relation data callers rely on, so a
/// caller-supplied depth below this is raised, never honored.
pub const MIN_RELATION_DEPTH: u8 = 2;

const METRIC_STORE_ROUNDTRIP: &str = "lesto_store_roundtrip_total";
const METRIC_STORE_QUERY_MS: &str = "lesto_store_query_ms";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cached, batched, deduplicated read access to a [`DocumentStore`].
pub struct QueryOptimizer<S> {
    store: Arc<S>,
    cache: Arc<QueryCache>,
    patterns: Option<Arc<PatternLog>>,
}

impl<S: DocumentStore> QueryOptimizer<S> {
    pub fn new(store: Arc<S>, cache: Arc<QueryCache>) -> Self {
        Self {
            store,
            cache,
            patterns: None,
        }
    }

    /// Record executed query shapes into `log` for the index advisor.
    pub fn with_pattern_log(mut self, log: Arc<PatternLog>) -> Self {
        self.patterns = Some(log);
        self
    }

    // ========================================================================
    // Single queries
    // ========================================================================

    /// Run a paged query, serving repeated shapes from cache.
    #[instrument(skip_all, fields(collection = %spec.collection))]
    pub async fn find(&self, spec: &QuerySpec) -> Result<PagedResult, QueryError> {
        let key = find_key(spec);
        if let Some(page) = self.cache.get_page(&key) {
            debug!(cache = "query", outcome = "hit", "serving cached find result");
            return Ok(page);
        }
        debug!(cache = "query", outcome = "miss", "querying store");
        self.record_pattern(spec);

        let mut effective = spec.clone();
        effective.depth = effective.depth.max(MIN_RELATION_DEPTH);
        let page = self.run_query(&effective).await?;
        self.cache.set_page(key, page.clone());
        Ok(page)
    }

    async fn run_query(&self, spec: &QuerySpec) -> Result<PagedResult, StoreError> {
        let started_at = Instant::now();
        let result = self.store.query(spec).await;
        counter!(METRIC_STORE_ROUNDTRIP, "collection" => spec.collection.clone()).increment(1);
        histogram!(METRIC_STORE_QUERY_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        result
    }

    // ========================================================================
    // Batched id fetches
    // ========================================================================

    /// Fetch documents by id with at most one store round-trip.
    ///
    /// Ids are deduplicated, already-cached documents are split off, and the
    /// remainder is fetched with a single `id in {…}` query. An id the store
    /// does not know is simply absent from the returned map.
    #[instrument(skip_all, fields(collection = collection, requested = ids.len()))]
    pub async fn find_by_ids(
        &self,
        collection: &str,
        ids: &[DocumentId],
        depth: u8,
        locale: Option<&str>,
    ) -> Result<HashMap<DocumentId, Document>, QueryError> {
        let mut seen = HashSet::new();
        let mut resolved = HashMap::new();
        let mut uncached = Vec::new();
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.cache.get_doc(&doc_key(collection, id, locale)) {
                Some(doc) => {
                    resolved.insert(id.clone(), doc);
                }
                None => uncached.push(id.clone()),
            }
        }
        debug!(
            cache = "query",
            cached = resolved.len(),
            uncached = uncached.len(),
            "split batch against cache"
        );
        if uncached.is_empty() {
            return Ok(resolved);
        }

        let id_values: Vec<Value> = uncached.iter().map(DocumentId::to_value).collect();
        let mut spec = QuerySpec::new(collection)
            .with_filter(FilterNode::compare(
                "id",
                CompareOp::In,
                Value::Array(id_values),
            ))
            .with_depth(depth.max(MIN_RELATION_DEPTH))
            .with_limit(uncached.len() as u32);
        if let Some(locale) = locale {
            spec = spec.with_locale(locale);
        }

        let page = self.run_query(&spec).await?;
        for doc in page.docs {
            let Some(id) = document_id(&doc) else {
                continue;
            };
            self.cache.set_doc(doc_key(collection, &id, locale), doc.clone());
            resolved.insert(id, doc);
        }
        Ok(resolved)
    }

    // ========================================================================
    // Relation population
    // ========================================================================

    /// Resolve relation fields into full documents.
    ///
    /// `relations` maps a relation field name to its target collection.
    /// Referenced ids are collected across every input document and fetched
    /// with one batch per distinct target collection; a field whose id does
    /// not resolve keeps the raw id in place.
    #[instrument(skip_all, fields(docs = docs.len(), relations = relations.len()))]
    pub async fn populate_relations(
        &self,
        docs: Vec<Document>,
        relations: &HashMap<String, String>,
    ) -> Result<Vec<Document>, QueryError> {
        let mut wanted: HashMap<&str, HashSet<DocumentId>> = HashMap::new();
        for doc in &docs {
            for (field, target) in relations {
                let Some(value) = doc.get(field) else {
                    continue;
                };
                for id in relation_ids(value) {
                    wanted.entry(target.as_str()).or_default().insert(id);
                }
            }
        }
        if wanted.is_empty() {
            return Ok(docs);
        }

        let fetches = wanted.iter().map(|(target, ids)| {
            let ids: Vec<DocumentId> = ids.iter().cloned().collect();
            async move {
                let found = self
                    .find_by_ids(target, &ids, MIN_RELATION_DEPTH, None)
                    .await?;
                Ok::<_, QueryError>((*target, found))
            }
        });
        let mut resolved: HashMap<&str, HashMap<DocumentId, Document>> = HashMap::new();
        for fetched in join_all(fetches).await {
            let (target, found) = fetched?;
            resolved.insert(target, found);
        }

        let mut docs = docs;
        for doc in &mut docs {
            let Some(object) = doc.as_object_mut() else {
                continue;
            };
            for (field, target) in relations {
                let Some(found) = resolved.get(target.as_str()) else {
                    continue;
                };
                if let Some(value) = object.get_mut(field) {
                    resolve_field(value, found);
                }
            }
        }
        Ok(docs)
    }

    // ========================================================================
    // Parallel execution
    // ========================================================================

    /// Run independent named queries concurrently.
    ///
    /// Best-effort: each name maps to its own result, so one failing query
    /// neither fails the batch nor disappears. No ordering exists between
    /// the constituent queries.
    pub async fn parallel(
        &self,
        queries: HashMap<String, QuerySpec>,
    ) -> HashMap<String, Result<PagedResult, QueryError>> {
        let tasks = queries.into_iter().map(|(name, spec)| async move {
            let result = self.find(&spec).await;
            (name, result)
        });
        join_all(tasks).await.into_iter().collect()
    }

    // ========================================================================
    // Cache administration
    // ========================================================================

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn clear_expired_cache(&self) -> usize {
        self.cache.clear_expired()
    }

    fn record_pattern(&self, spec: &QuerySpec) {
        if let Some(log) = &self.patterns {
            log.record(QueryPattern::from_spec(spec));
        }
    }
}

fn resolve_field(value: &mut Value, found: &HashMap<DocumentId, Document>) {
    match value {
        Value::Array(items) => {
            for item in items {
                resolve_single(item, found);
            }
        }
        other => resolve_single(other, found),
    }
}

fn resolve_single(value: &mut Value, found: &HashMap<DocumentId, Document>) {
    let Some(id) = DocumentId::from_value(value) else {
        return;
    };
    if let Some(doc) = found.get(&id) {
        *value = doc.clone();
    }
}
