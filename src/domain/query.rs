//! Query model: filter trees, query specifications, paged results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::Document;

/// Default page size when a caller does not specify one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Comparison operators supported by filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Equals,
    NotEquals,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    GreaterThanEqual,
    LessThanEqual,
    Like,
    Contains,
}

impl CompareOp {
    /// The wire/key spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::LessThanEqual => "less_than_equal",
            Self::Like => "like",
            Self::Contains => "contains",
        }
    }

    /// Parse an operator key, e.g. from a filter deserialized off the wire.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "in" => Some(Self::In),
            "not_in" => Some(Self::NotIn),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            "greater_than_equal" => Some(Self::GreaterThanEqual),
            "less_than_equal" => Some(Self::LessThanEqual),
            "like" => Some(Self::Like),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }
}

/// A recursive boolean filter tree.
///
/// Leaves compare one field against a value; composites combine sub-trees
/// with `and`/`or`. Serializes to `{"and": [...]}` / `{"or": [...]}` /
/// `{"field": ..., "operator": ..., "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    And {
        and: Vec<FilterNode>,
    },
    Or {
        or: Vec<FilterNode>,
    },
    Compare {
        field: String,
        operator: CompareOp,
        value: Value,
    },
}

impl FilterNode {
    pub fn and(nodes: Vec<FilterNode>) -> Self {
        Self::And { and: nodes }
    }

    pub fn or(nodes: Vec<FilterNode>) -> Self {
        Self::Or { or: nodes }
    }

    pub fn compare(field: impl Into<String>, operator: CompareOp, value: Value) -> Self {
        Self::Compare {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::compare(field, CompareOp::Equals, value)
    }
}

/// Strip the descending marker from a sort specifier.
///
/// Sort strings follow the document-store convention of a leading `-` for
/// descending order, e.g. `-created_at`.
pub fn sort_field(sort: &str) -> &str {
    sort.strip_prefix('-').unwrap_or(sort)
}

/// A single query against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterNode>,
    pub depth: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub page: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl QuerySpec {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            depth: 2,
            locale: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

/// One page of documents as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult {
    pub docs: Vec<Document>,
    pub total_docs: u64,
    pub total_pages: u32,
    pub page: u32,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PagedResult {
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            docs: Vec::new(),
            total_docs: 0,
            total_pages: 0,
            page,
            limit,
            has_next_page: false,
            has_prev_page: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn operator_key_round_trip() {
        for op in [
            CompareOp::Equals,
            CompareOp::NotEquals,
            CompareOp::In,
            CompareOp::NotIn,
            CompareOp::GreaterThan,
            CompareOp::LessThan,
            CompareOp::GreaterThanEqual,
            CompareOp::LessThanEqual,
            CompareOp::Like,
            CompareOp::Contains,
        ] {
            assert_eq!(CompareOp::from_key(op.as_str()), Some(op));
        }
        assert_eq!(CompareOp::from_key("title"), None);
    }

    #[test]
    fn filter_serializes_to_tagged_shapes() {
        let filter = FilterNode::and(vec![
            FilterNode::equals("status", json!("published")),
            FilterNode::or(vec![FilterNode::compare(
                "views",
                CompareOp::GreaterThan,
                json!(100),
            )]),
        ]);
        let encoded = serde_json::to_value(&filter).expect("filter serializes");
        assert_eq!(
            encoded,
            json!({"and": [
                {"field": "status", "operator": "equals", "value": "published"},
                {"or": [{"field": "views", "operator": "greater_than", "value": 100}]}
            ]})
        );
        let decoded: FilterNode = serde_json::from_value(encoded).expect("filter deserializes");
        assert_eq!(decoded, filter);
    }

    #[test]
    fn sort_field_strips_descending_marker() {
        assert_eq!(sort_field("-created_at"), "created_at");
        assert_eq!(sort_field("title"), "title");
    }

    #[test]
    fn spec_builder_defaults() {
        let spec = QuerySpec::new("posts");
        assert_eq!(spec.depth, 2);
        assert_eq!(spec.page, 1);
        assert_eq!(spec.limit, DEFAULT_PAGE_LIMIT);
        assert!(spec.filter.is_none());
    }
}
