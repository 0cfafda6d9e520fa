use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

/// Reserved key holding an element's attributes.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Reserved key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "#text";
/// Key used when a whole document collapses to a bare string.
pub const TEXT_CONTENT_KEY: &str = "text_content";
/// Key used when a whole document collapses to nothing.
pub const EMPTY_KEY: &str = "empty";

/// The single shape every normalized XML document takes.
///
/// Mapping key order carries no meaning; equality is structural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Mapping(FxHashMap<String, CanonicalValue>),
    Sequence(Vec<CanonicalValue>),
    Text(String),
    /// An element with no attributes, no text and no children.
    Empty,
    /// A document whose root reduced to text only.
    RawText(String),
}

impl CanonicalValue {
    /// Build a mapping from `(key, value)` pairs.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, CanonicalValue)>,
    {
        CanonicalValue::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn text(value: impl Into<String>) -> Self {
        CanonicalValue::Text(value.into())
    }

    /// Look up a key when this value is a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CanonicalValue> {
        match self {
            CanonicalValue::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CanonicalValue::Text(text) | CanonicalValue::RawText(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_sequence(&self) -> Option<&[CanonicalValue]> {
        match self {
            CanonicalValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty_marker(&self) -> bool {
        matches!(self, CanonicalValue::Empty)
    }

    /// JSON rendering for a value nested inside a document. Empty elements become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            CanonicalValue::Mapping(map) => {
                let mut object = Map::with_capacity(map.len());
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json());
                }
                Value::Object(object)
            }
            CanonicalValue::Sequence(items) => {
                Value::Array(items.iter().map(CanonicalValue::to_json).collect())
            }
            CanonicalValue::Text(text) => Value::String(text.clone()),
            CanonicalValue::Empty => Value::Null,
            CanonicalValue::RawText(text) => {
                single_key_object(TEXT_CONTENT_KEY, Value::String(text.clone()))
            }
        }
    }

    /// JSON rendering for a whole decoded document; always an object.
    #[must_use]
    pub fn to_document_json(&self) -> Value {
        match self {
            CanonicalValue::Empty => single_key_object(EMPTY_KEY, Value::Bool(true)),
            CanonicalValue::Text(text) => {
                single_key_object(TEXT_CONTENT_KEY, Value::String(text.clone()))
            }
            other => other.to_json(),
        }
    }
}

fn single_key_object(key: &str, value: Value) -> Value {
    let mut object = Map::with_capacity(1);
    object.insert(key.to_string(), value);
    Value::Object(object)
}
