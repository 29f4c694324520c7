use indexmap::IndexMap;
use log::warn;
use serde_json::{Map, Value};

/// One request field, already sorted into the shapes resolution understands.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Nested(Map<String, Value>),
    /// `null`, or a list holding something other than scalars. The question's
    /// earlier responses are removed and nothing replaces them.
    Cleared,
}

/// The inbound request keyed by question reference identifier.
///
/// Accepts both the flat form and the API form that wraps the answers in a
/// `dataset` object next to `jurisdiction`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestPayload {
    fields: IndexMap<String, FieldValue>,
}

const DATASET_KEY: &str = "dataset";
const DOCUMENTATION_URL_KEY: &str = "documentationUrl";
const JURISDICTION_KEY: &str = "jurisdiction";

impl RequestPayload {
    pub fn from_value(value: &Value) -> Self {
        let mut payload = Self::default();
        let Some(object) = value.as_object() else {
            if !value.is_null() {
                warn!("Request payload is not an object, ignoring it");
            }
            return payload;
        };

        for (key, raw) in object {
            match (key.as_str(), raw) {
                (DATASET_KEY, Value::Object(inner)) => {
                    for (inner_key, inner_raw) in inner {
                        payload.insert(inner_key, inner_raw);
                    }
                }
                _ => payload.insert(key, raw),
            }
        }
        payload
    }

    fn insert(&mut self, key: &str, raw: &Value) {
        let value = field_value(raw);
        if value == FieldValue::Cleared && !raw.is_null() {
            warn!("Request field '{}' holds a list with non-scalar items, clearing it", key);
        }
        self.fields.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Trimmed text of a scalar field; blank counts as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    pub fn documentation_url(&self) -> Option<&str> {
        self.text(DOCUMENTATION_URL_KEY)
    }

    pub fn jurisdiction(&self) -> Option<&str> {
        self.text(JURISDICTION_KEY)
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_value(raw: &Value) -> FieldValue {
    match raw {
        Value::Null => FieldValue::Cleared,
        Value::Array(items) => items
            .iter()
            .map(scalar_text)
            .collect::<Option<Vec<_>>>()
            .map_or(FieldValue::Cleared, FieldValue::List),
        Value::Object(map) => FieldValue::Nested(map.clone()),
        scalar => scalar_text(scalar).map_or(FieldValue::Cleared, FieldValue::Text),
    }
}
