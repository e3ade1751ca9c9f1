//! Typed query-parameter parsing and validation.
//!
//! Raw query parameters arrive as strings; coercion turns `"true"`/`"false"`
//! into booleans and numeric strings into numbers before the caller-supplied
//! schema is checked. Unknown parameters pass through untouched.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid parameter `{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce a raw string the way the transport cannot: exact boolean
    /// literals become booleans, fully-numeric strings become numbers, and
    /// everything else stays text.
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            other => match other.parse::<f64>() {
                Ok(number) if !other.is_empty() => Self::Number(number),
                _ => Self::Text(other.to_string()),
            },
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    fn kind(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Number(_) => ParamType::Number,
            Self::Text(_) => ParamType::Text,
        }
    }
}

/// Expected type of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    Number,
    Text,
}

impl ParamType {
    fn label(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Text => "string",
        }
    }
}

#[derive(Debug, Clone)]
struct ParamSpec {
    name: String,
    kind: ParamType,
    required: bool,
}

/// Caller-supplied description of the expected parameters.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: ParamType) -> Self {
        self.specs.push(ParamSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: ParamType) -> Self {
        self.specs.push(ParamSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    /// Coerce and validate raw parameters against this schema.
    pub fn parse(&self, raw: &[(String, String)]) -> Result<TypedParams, ValidationError> {
        let mut values = HashMap::new();
        for (name, value) in raw {
            values.insert(name.clone(), ParamValue::coerce(value));
        }

        for spec in &self.specs {
            match values.get(&spec.name) {
                None if spec.required => {
                    return Err(ValidationError::new(&spec.name, "required parameter missing"));
                }
                None => {}
                Some(value) if value.kind() != spec.kind => {
                    return Err(ValidationError::new(
                        &spec.name,
                        format!("expected {}", spec.kind.label()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(TypedParams(values))
    }
}

/// Validated, coerced parameters.
#[derive(Debug, Clone, Default)]
pub struct TypedParams(HashMap<String, ParamValue>);

impl TypedParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ParamValue::as_bool)
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_number)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn coercion_covers_booleans_numbers_and_text() {
        assert_eq!(ParamValue::coerce("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::coerce("false"), ParamValue::Bool(false));
        assert_eq!(ParamValue::coerce("42"), ParamValue::Number(42.0));
        assert_eq!(ParamValue::coerce("3.5"), ParamValue::Number(3.5));
        assert_eq!(
            ParamValue::coerce("hello"),
            ParamValue::Text("hello".to_string())
        );
        // empty strings stay text, they are not zero
        assert_eq!(ParamValue::coerce(""), ParamValue::Text(String::new()));
    }

    #[test]
    fn schema_accepts_valid_params() {
        let schema = ParamSchema::new()
            .required("page", ParamType::Number)
            .optional("draft", ParamType::Bool)
            .optional("q", ParamType::Text);
        let params = schema
            .parse(&raw(&[("page", "2"), ("draft", "true"), ("q", "rust")]))
            .expect("valid params");
        assert_eq!(params.get_number("page"), Some(2.0));
        assert_eq!(params.get_bool("draft"), Some(true));
        assert_eq!(params.get_text("q"), Some("rust"));
    }

    #[test]
    fn missing_required_param_fails() {
        let schema = ParamSchema::new().required("page", ParamType::Number);
        let err = schema.parse(&raw(&[("q", "x")])).expect_err("missing page");
        assert_eq!(err.field, "page");
    }

    #[test]
    fn type_mismatch_fails() {
        let schema = ParamSchema::new().required("page", ParamType::Number);
        let err = schema
            .parse(&raw(&[("page", "not-a-number")]))
            .expect_err("page must be numeric");
        assert_eq!(err.field, "page");
        assert!(err.message.contains("number"));
    }

    #[test]
    fn unknown_params_pass_through() {
        let schema = ParamSchema::new().optional("page", ParamType::Number);
        let params = schema
            .parse(&raw(&[("unexpected", "fine")]))
            .expect("unknown params tolerated");
        assert_eq!(params.get_text("unexpected"), Some("fine"));
    }
}
