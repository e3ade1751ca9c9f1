//! Payload reshaping: field projection and null/empty compression.
//!
//! Both operations are pure functions over `serde_json::Value`, recursing
//! generically instead of special-casing nesting depth, so dotted paths of
//! any depth work and compression reaches arbitrarily nested values.

use serde_json::{Map, Value};

/// Reduce a payload to the requested dotted field paths.
///
/// `select_fields(doc, ["a", "b.c"])` keeps `a` whole and only `c` inside
/// `b`. Arrays are projected element-wise. Paths that do not exist in the
/// payload are omitted from the result, never an error.
pub fn select_fields(doc: &Value, fields: &[String]) -> Value {
    match doc {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| select_fields(item, fields))
                .collect(),
        ),
        Value::Object(_) => {
            let mut out = Map::new();
            for path in fields {
                copy_path(doc, path, &mut out);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn copy_path(source: &Value, path: &str, out: &mut Map<String, Value>) {
    match path.split_once('.') {
        None => {
            if let Some(value) = source.get(path) {
                out.insert(path.to_string(), value.clone());
            }
        }
        Some((head, rest)) => {
            let Some(inner) = source.get(head) else {
                return;
            };
            match inner {
                Value::Object(_) => {
                    let slot = out
                        .entry(head.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(slot) = slot {
                        copy_path(inner, rest, slot);
                    }
                }
                Value::Array(items) => {
                    let slot = out.entry(head.to_string()).or_insert_with(|| {
                        Value::Array(items.iter().map(|_| Value::Object(Map::new())).collect())
                    });
                    if let Value::Array(slots) = slot {
                        for (slot, item) in slots.iter_mut().zip(items) {
                            if let Value::Object(slot) = slot {
                                copy_path(item, rest, slot);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Recursively drop `null` members, empty arrays, and empty objects.
///
/// Applying it twice is the same as applying it once: a payload with
/// nothing left to drop is a fixed point.
pub fn compress(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, member) in map {
                if let Some(kept) = compress_member(member) {
                    out.insert(key.clone(), kept);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().filter_map(compress_member).collect())
        }
        other => other.clone(),
    }
}

fn compress_member(value: &Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    let compressed = compress(value);
    match &compressed {
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        _ => Some(compressed),
    }
}
