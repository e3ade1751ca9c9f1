//! Index advisor: static analysis of observed filter shapes.
//!
//! `recommend` is a pure function over a list of query patterns; nothing
//! here touches the store or creates indexes. The optimizer can feed a
//! bounded [`PatternLog`] so advice reflects live traffic.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use crate::cache::lock::mutex_guard;
use crate::domain::{CompareOp, FilterNode, QuerySpec, sort_field};

const DEFAULT_PATTERN_CAPACITY: usize = 500;

/// One observed query shape.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPattern {
    pub collection: String,
    pub filter: Option<FilterNode>,
    pub sort: Option<String>,
}

impl QueryPattern {
    pub fn from_spec(spec: &QuerySpec) -> Self {
        Self {
            collection: spec.collection.clone(),
            filter: spec.filter.clone(),
            sort: spec.sort.clone(),
        }
    }
}

/// An index a storage engine should consider creating. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRecommendation {
    pub collection: String,
    pub fields: Vec<String>,
}

/// Derive index recommendations from observed query patterns.
///
/// For each pattern: one single-field suggestion per distinct filter field,
/// one composite combining the pattern's fields in discovery order, and,
/// when a sort is present, a single-field suggestion on the sort field plus
/// a composite of filter fields and sort field. Suggestions are
/// deduplicated across patterns; input order fixes output order, so the
/// same patterns always produce the same list.
pub fn recommend(patterns: &[QueryPattern]) -> Vec<IndexRecommendation> {
    let mut seen: HashSet<(String, Vec<String>)> = HashSet::new();
    let mut out = Vec::new();

    for pattern in patterns {
        let mut fields = Vec::new();
        if let Some(filter) = &pattern.filter {
            collect_fields(filter, &mut fields);
        }

        for field in &fields {
            push_unique(&mut out, &mut seen, &pattern.collection, vec![field.clone()]);
        }
        if fields.len() > 1 {
            push_unique(&mut out, &mut seen, &pattern.collection, fields.clone());
        }

        if let Some(sort) = &pattern.sort {
            let sort = sort_field(sort).to_string();
            push_unique(&mut out, &mut seen, &pattern.collection, vec![sort.clone()]);
            if !fields.is_empty() && !fields.contains(&sort) {
                let mut combined = fields.clone();
                combined.push(sort);
                push_unique(&mut out, &mut seen, &pattern.collection, combined);
            }
        }
    }

    debug!(
        patterns = patterns.len(),
        recommendations = out.len(),
        "derived index recommendations"
    );
    out
}

/// Collect leaf field names in discovery order.
///
/// A leaf whose field name is itself a comparison-operator key came from a
/// malformed raw filter where the operator level was mistaken for a field
/// level; skipped so "equals" is never recommended as an index field.
fn collect_fields(node: &FilterNode, fields: &mut Vec<String>) {
    match node {
        FilterNode::And { and } => {
            for child in and {
                collect_fields(child, fields);
            }
        }
        FilterNode::Or { or } => {
            for child in or {
                collect_fields(child, fields);
            }
        }
        FilterNode::Compare { field, .. } => {
            if CompareOp::from_key(field).is_some() {
                return;
            }
            if !fields.contains(field) {
                fields.push(field.clone());
            }
        }
    }
}

fn push_unique(
    out: &mut Vec<IndexRecommendation>,
    seen: &mut HashSet<(String, Vec<String>)>,
    collection: &str,
    fields: Vec<String>,
) {
    if seen.insert((collection.to_string(), fields.clone())) {
        out.push(IndexRecommendation {
            collection: collection.to_string(),
            fields,
        });
    }
}

// ============================================================================
// Pattern log
// ============================================================================

/// Bounded in-memory log of executed query shapes.
///
/// Oldest patterns are dropped past capacity, the same way the monitor's
/// ring buffer trims, so a long-running process never grows it unbounded.
pub struct PatternLog {
    patterns: Mutex<VecDeque<QueryPattern>>,
    capacity: usize,
}

impl PatternLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            patterns: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, pattern: QueryPattern) {
        let mut patterns = mutex_guard(&self.patterns, "pattern_log");
        patterns.push_back(pattern);
        while patterns.len() > self.capacity {
            patterns.pop_front();
        }
    }

    pub fn snapshot(&self) -> Vec<QueryPattern> {
        mutex_guard(&self.patterns, "pattern_log")
            .iter()
            .cloned()
            .collect()
    }

    /// Run the advisor over everything recorded so far.
    pub fn recommend(&self) -> Vec<IndexRecommendation> {
        recommend(&self.snapshot())
    }

    pub fn len(&self) -> usize {
        mutex_guard(&self.patterns, "pattern_log").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_guard(&self.patterns, "pattern_log").clear();
    }
}

impl Default for PatternLog {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_CAPACITY)
    }
}
