//! Cache key definitions.
//!
//! Keys capture only the fields that affect result identity; anything
//! volatile (request timestamps, cache busters) must never reach a key.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::{DocumentId, QuerySpec};

/// Per-document cache key: `collection:id:locale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: String,
    pub id: DocumentId,
    pub locale: Option<String>,
}

/// Paged-find cache key: collection plus a hash of the query shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindKey {
    pub collection: String,
    pub shape_hash: u64,
}

/// Response cache key: route plus normalized-query hash, or a caller
/// override.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseKey {
    Route { route: String, query_hash: u64 },
    Custom(String),
}

/// Query parameters that never participate in response cache keys.
pub const VOLATILE_PARAMS: &[&str] = &["_", "t", "timestamp", "nocache", "cachebust", "bust"];

// ============================================================================
// Key construction
// ============================================================================

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

pub fn doc_key(collection: &str, id: &DocumentId, locale: Option<&str>) -> DocKey {
    DocKey {
        collection: collection.to_string(),
        id: id.clone(),
        locale: locale.map(str::to_string),
    }
}

/// Derive the cache key for a paged find.
///
/// Hashes `{filter, locale, page, limit, sort}`; the filter is serialized
/// to canonical JSON first (object keys sort deterministically), so two
/// specs describing the same query always share a key. `depth` is excluded:
/// the optimizer floors it before querying, so it cannot change the result.
pub fn find_key(spec: &QuerySpec) -> FindKey {
    let mut hasher = DefaultHasher::new();
    let filter = spec
        .filter
        .as_ref()
        .and_then(|filter| serde_json::to_string(filter).ok());
    filter.hash(&mut hasher);
    spec.locale.hash(&mut hasher);
    spec.page.hash(&mut hasher);
    spec.limit.hash(&mut hasher);
    spec.sort.hash(&mut hasher);
    FindKey {
        collection: spec.collection.clone(),
        shape_hash: hasher.finish(),
    }
}

/// Normalize a raw query string into its cacheable form.
///
/// Pairs are sorted alphabetically and volatile parameters are dropped, so
/// `?b=2&a=1&_=123` and `?a=1&b=2` resolve to the same key.
pub fn normalized_query(params: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = params
        .iter()
        .filter(|(name, _)| !VOLATILE_PARAMS.contains(&name.as_str()))
        .collect();
    pairs.sort();
    let parts: Vec<String> = pairs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    parts.join("&")
}

pub fn response_key(route: &str, params: &[(String, String)]) -> ResponseKey {
    ResponseKey::Route {
        route: route.to_string(),
        query_hash: hash_value(&normalized_query(params)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::FilterNode;

    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn find_key_is_deterministic() {
        let spec = QuerySpec::new("posts")
            .with_filter(FilterNode::equals("status", json!("published")))
            .with_page(2)
            .with_limit(20)
            .with_sort("-created_at");
        assert_eq!(find_key(&spec), find_key(&spec.clone()));
    }

    #[test]
    fn find_key_ignores_depth() {
        let spec = QuerySpec::new("posts").with_filter(FilterNode::equals("a", json!(1)));
        let deeper = spec.clone().with_depth(5);
        assert_eq!(find_key(&spec), find_key(&deeper));
    }

    #[test]
    fn find_key_differs_by_page_and_filter() {
        let spec = QuerySpec::new("posts");
        assert_ne!(find_key(&spec), find_key(&spec.clone().with_page(2)));
        assert_ne!(
            find_key(&spec),
            find_key(&spec.clone().with_filter(FilterNode::equals("a", json!(1))))
        );
    }

    #[test]
    fn normalized_query_sorts_and_drops_volatile_params() {
        let raw = params(&[("b", "2"), ("_", "1699999"), ("a", "1"), ("nocache", "true")]);
        assert_eq!(normalized_query(&raw), "a=1&b=2");
    }

    #[test]
    fn response_keys_match_across_param_order() {
        let one = response_key("/api/posts", &params(&[("a", "1"), ("b", "2")]));
        let two = response_key("/api/posts", &params(&[("b", "2"), ("a", "1"), ("t", "99")]));
        assert_eq!(one, two);
        let other_route = response_key("/api/media", &params(&[("a", "1"), ("b", "2")]));
        assert_ne!(one, other_route);
    }

    #[test]
    fn doc_key_distinguishes_locale() {
        let id = DocumentId::from("d-1");
        assert_ne!(
            doc_key("posts", &id, None),
            doc_key("posts", &id, Some("en"))
        );
    }
}
