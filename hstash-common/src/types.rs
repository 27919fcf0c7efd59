//! # Value Types
//!
//! Purpose: Define the application-level values stored in hash fields and the
//! ordered field map used for write payloads and multi-field reads.
//!
//! ## Design Principles
//!
//! 1. **Three Shapes**: Raw bytes, plain text, and structured JSON cover every
//!    value the adapter accepts or returns.
//! 2. **Absence Is Not Empty**: A missing field is `None` at the call site, never
//!    an empty `Value`.
//! 3. **Request Order**: `FieldMap` keeps insertion order so results come back
//!    in the order they were asked for.

use std::fmt;

use ahash::RandomState;
use bytes::Bytes;
use hashbrown::HashMap;

/// A single hash field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Untouched bytes, never interpreted.
    Raw(Bytes),
    /// Plain text, stored as-is.
    Text(String),
    /// Structured value (number, boolean, null, array, object or string).
    Json(serde_json::Value),
}

impl Value {
    /// Returns the text if this is a `Text` value or a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Json(serde_json::Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer if this is a JSON number that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Json(json) => json.as_i64(),
            _ => None,
        }
    }

    /// Returns the float if this is a JSON number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Json(json) => json.as_f64(),
            _ => None,
        }
    }

    /// Returns the boolean if this is a JSON boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Json(json) => json.as_bool(),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Raw` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the structured value if this is a `Json` value.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Json(json) => Some(json),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::Raw(bytes)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Raw(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Raw(Bytes::copy_from_slice(bytes))
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Json(flag.into())
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Json(number.into())
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Json(number.into())
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Value::Json(number.into())
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Json(number.into())
    }
}

/// Ordered mapping from field name to value.
///
/// Entries live in a vector in insertion order, with a hash index from name to
/// position. Inserting an existing name replaces the value in place.
#[derive(Clone)]
pub struct FieldMap<V = Value> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize, RandomState>,
}

impl<V> FieldMap<V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty map with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        FieldMap {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Inserts a field, returning the previous value if the name was present.
    pub fn insert(&mut self, field: impl Into<String>, value: V) -> Option<V> {
        let field = field.into();
        if let Some(&pos) = self.index.get(&field) {
            return Some(std::mem::replace(&mut self.entries[pos].1, value));
        }
        self.index.insert(field.clone(), self.entries.len());
        self.entries.push((field, value));
        None
    }

    /// Removes every listed field, returning how many were present.
    ///
    /// Order of the remaining fields is kept.
    pub fn remove_many<S: AsRef<str>>(&mut self, fields: &[S]) -> usize {
        let mut doomed = vec![false; self.entries.len()];
        let mut removed = 0;
        for field in fields {
            if let Some(pos) = self.index.remove(field.as_ref()) {
                doomed[pos] = true;
                removed += 1;
            }
        }
        if removed > 0 {
            let mut doomed = doomed.into_iter();
            self.entries.retain(|_| !doomed.next().unwrap_or(false));
            self.index.clear();
            for (pos, (name, _)) in self.entries.iter().enumerate() {
                self.index.insert(name.clone(), pos);
            }
        }
        removed
    }

    /// Returns the value for a field name.
    pub fn get(&self, field: &str) -> Option<&V> {
        self.index.get(field).map(|&pos| &self.entries[pos].1)
    }

    /// Returns true if the field name is present.
    pub fn contains_key(&self, field: &str) -> bool {
        self.index.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl<V> Default for FieldMap<V> {
    fn default() -> Self {
        FieldMap::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for FieldMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Maps are equal when they hold the same fields in the same order.
impl<V: PartialEq> PartialEq for FieldMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<V> IntoIterator for FieldMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FieldMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = FieldMap::with_capacity(iter.size_hint().0);
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_map_keeps_insertion_order() {
        let map: FieldMap<i32> = [("echo", 1), ("alpha", 2), ("mike", 3)].into_iter().collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["echo", "alpha", "mike"]);
    }

    #[test]
    fn field_map_replaces_in_place() {
        let mut map = FieldMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 3), Some(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next(), Some(("a", &3)));
    }

    #[test]
    fn field_map_lookups_scale_with_size() {
        let count = 50_000;
        let map: FieldMap<usize> = (0..count).map(|n| (format!("f{n}"), n)).collect();
        assert_eq!(map.len(), count);
        assert_eq!(map.get("f0"), Some(&0));
        assert_eq!(map.get("f49999"), Some(&49_999));
        assert!(!map.contains_key("f50000"));
        assert_eq!(map.keys().nth(12_345), Some("f12345"));
    }

    #[test]
    fn field_map_remove_many_keeps_order() {
        let mut map: FieldMap<i32> = [("a", 1), ("b", 2), ("c", 3), ("d", 4)].into_iter().collect();
        assert_eq!(map.remove_many(&["c", "a", "a", "zz"]), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "d"]);
        assert_eq!(map.get("d"), Some(&4));
        map.insert("a", 5);
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "d", "a"]);
        assert_eq!(map.get("a"), Some(&5));
    }

    #[test]
    fn field_map_equality_follows_order() {
        let ab: FieldMap<i32> = [("a", 1), ("b", 2)].into_iter().collect();
        let ba: FieldMap<i32> = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(ab, ab.clone());
        assert_ne!(ab, ba);
        assert_eq!(format!("{ab:?}"), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::from("kilo").as_str(), Some("kilo"));
        assert_eq!(Value::from(13i64).as_i64(), Some(13));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(b"\x00\x01".as_slice()).as_bytes(), Some(&b"\x00\x01"[..]));
        assert_eq!(Value::from("kilo").as_i64(), None);
    }
}
