//! Documents and document identifiers.
//!
//! A document is an opaque structured record owned by the store; lesto
//! reads and reshapes copies but never writes one back. Identifiers are
//! collection-defined and may be strings or integers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque document as returned by the store.
pub type Document = Value;

/// A document identifier within a collection.
///
/// Collections define their own id type; both string and integer ids are
/// observed in the wild, so both hash and compare as distinct variants
/// (`Int(1)` never equals `Str("1")`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Str(String),
}

impl DocumentId {
    /// Read an id out of a JSON value, if the value is id-shaped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            _ => None,
        }
    }

    /// The JSON representation used in filters.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Read a document's own `id` field.
pub fn document_id(doc: &Document) -> Option<DocumentId> {
    doc.get("id").and_then(DocumentId::from_value)
}

/// Extract the raw relation ids held by a relation field value.
///
/// A relation field holds either a single id or a list of ids. Entries that
/// are already resolved documents (objects) are not ids and are skipped.
pub fn relation_ids(value: &Value) -> Vec<DocumentId> {
    match value {
        Value::Array(items) => items.iter().filter_map(DocumentId::from_value).collect(),
        other => DocumentId::from_value(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn id_from_string_and_integer_values() {
        assert_eq!(
            DocumentId::from_value(&json!("abc")),
            Some(DocumentId::Str("abc".to_string()))
        );
        assert_eq!(DocumentId::from_value(&json!(42)), Some(DocumentId::Int(42)));
        assert_eq!(DocumentId::from_value(&json!({"id": 1})), None);
        assert_eq!(DocumentId::from_value(&json!(null)), None);
    }

    #[test]
    fn string_and_integer_ids_are_distinct() {
        assert_ne!(DocumentId::from("1"), DocumentId::from(1));
    }

    #[test]
    fn document_id_reads_own_id_field() {
        let doc = json!({"id": "vo-1", "title": "Intro"});
        assert_eq!(document_id(&doc), Some(DocumentId::from("vo-1")));
        assert_eq!(document_id(&json!({"title": "no id"})), None);
    }

    #[test]
    fn relation_ids_from_single_and_list_fields() {
        assert_eq!(relation_ids(&json!("m-1")), vec![DocumentId::from("m-1")]);
        assert_eq!(
            relation_ids(&json!(["m-1", 2])),
            vec![DocumentId::from("m-1"), DocumentId::from(2)]
        );
        // already-resolved documents are not raw ids
        assert!(relation_ids(&json!({"id": "m-1"})).is_empty());
        assert_eq!(
            relation_ids(&json!([{"id": "m-1"}, "m-2"])),
            vec![DocumentId::from("m-2")]
        );
    }
}
