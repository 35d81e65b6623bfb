//! Cache Key Module
//!
//! Turns cache keys into fixed-length SHA-256 fingerprints.
//!
//! Structured keys are serialized with every mapping's keys sorted
//! (recursively), so two mappings holding the same content always
//! fingerprint identically regardless of how they were built.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::CacheError;

// == Fingerprint ==
/// 256-bit digest identifying a cache key inside the store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hashes raw bytes into a fingerprint.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

// == Cache Key ==
/// A cache key: either plain text or a string-keyed mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    /// Fingerprinted from the raw UTF-8 bytes
    Text(String),
    /// Fingerprinted from its canonical JSON form
    Structured(Map<String, Value>),
}

impl CacheKey {
    // == Constructors ==
    /// Builds a structured key from any serializable mapping-like value.
    ///
    /// Fails with `CacheError::Encoding` if the value cannot be serialized
    /// or does not serialize to a mapping.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self, CacheError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self::Structured(map)),
            Ok(other) => Err(CacheError::Encoding(format!(
                "structured key must be a mapping, got {}",
                kind_of(&other)
            ))),
            Err(e) => Err(CacheError::Encoding(e.to_string())),
        }
    }

    /// Builds the key `{"namespace": ns, "key": key}`.
    pub fn namespaced(namespace: &str, key: &str) -> Self {
        let mut map = Map::new();
        map.insert("namespace".to_string(), Value::from(namespace));
        map.insert("key".to_string(), Value::from(key));
        Self::Structured(map)
    }

    // == Canonical Form ==
    /// Returns the exact bytes that get hashed.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            CacheKey::Text(text) => text.as_bytes().to_vec(),
            CacheKey::Structured(map) => {
                let mut out = String::new();
                write_canonical_map(map, &mut out);
                out.into_bytes()
            }
        }
    }

    // == Fingerprint ==
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.canonical_bytes())
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::Text(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::Text(value)
    }
}

impl From<Map<String, Value>> for CacheKey {
    fn from(value: Map<String, Value>) -> Self {
        CacheKey::Structured(value)
    }
}

// == Canonical Serialization ==
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => write_canonical_map(map, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Display on scalars is compact JSON
        leaf => out.push_str(&leaf.to_string()),
    }
}

fn write_canonical_map(map: &Map<String, Value>, out: &mut String) {
    let mut fields: Vec<(&String, &Value)> = map.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    out.push('{');
    for (i, (name, value)) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::from(name.as_str()).to_string());
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn structured(value: Value) -> CacheKey {
        CacheKey::structured(&value).unwrap()
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let a = structured(json!({"a": 1, "b": 2}));
        let b = structured(json!({"b": 2, "a": 1}));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_distinct_strings_differ() {
        assert_ne!(
            CacheKey::from("x").fingerprint(),
            CacheKey::from("y").fingerprint()
        );
    }

    #[test]
    fn test_text_key_hashes_raw_bytes() {
        let key = CacheKey::from("hello");
        assert_eq!(key.fingerprint(), Fingerprint::of(b"hello"));
        // Known SHA-256 of "hello"
        assert_eq!(
            key.fingerprint().to_string(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_canonical_form_sorts_nested_maps() {
        let key = structured(json!({
            "z": [ {"b": true, "a": null} ],
            "m": {"y": "s", "x": 1.5},
        }));
        let text = String::from_utf8(key.canonical_bytes()).unwrap();
        assert_eq!(text, r#"{"m":{"x":1.5,"y":"s"},"z":[{"a":null,"b":true}]}"#);
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = structured(json!({"args": [1, 2]}));
        let b = structured(json!({"args": [2, 1]}));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_structured_from_hashmap() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for (k, v) in [("one", 1), ("two", 2), ("three", 3)] {
            first.insert(k, v);
        }
        for (k, v) in [("three", 3), ("one", 1), ("two", 2)] {
            second.insert(k, v);
        }
        assert_eq!(
            CacheKey::structured(&first).unwrap().fingerprint(),
            CacheKey::structured(&second).unwrap().fingerprint()
        );
    }

    #[test]
    fn test_non_mapping_is_encoding_error() {
        let result = CacheKey::structured(&vec![1, 2, 3]);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_non_string_map_keys_are_encoding_error() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys");
        let result = CacheKey::structured(&map);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_namespaced_keys_are_distinct() {
        let a = CacheKey::namespaced("api", "user:1");
        let b = CacheKey::namespaced("db", "user:1");
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), CacheKey::namespaced("api", "user:1").fingerprint());
    }
}
