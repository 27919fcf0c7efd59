//! # Call Arguments
//!
//! Every store operation takes a positional argument list whose shape decides
//! what the call means. `Arg` is the loosely-typed value a caller puts in one
//! position; [`args!`](crate::args) builds a list from plain Rust values.
//!
//! ## Design Principles
//!
//! 1. **Structural JSON**: A `serde_json::Value` converts into the matching
//!    `Arg` shape (array to `List`, object to `Map`), so JSON and Rust callers
//!    produce the same requests.
//! 2. **Coercion Lives Here**: Rendering an argument as a key segment, a field
//!    name or a stored value is decided once, in this module.

use bytes::Bytes;

use hstash_common::{FieldMap, Value};

/// One positional argument to a store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    List(Vec<Arg>),
    Map(FieldMap),
}

impl Arg {
    /// True for the empty or falsy shapes that never make a key.
    pub(crate) fn is_falsy(&self) -> bool {
        match self {
            Arg::Nil => true,
            Arg::Bool(flag) => !flag,
            Arg::Int(n) => *n == 0,
            Arg::Float(f) => *f == 0.0 || f.is_nan(),
            Arg::Str(s) => s.is_empty(),
            Arg::Bytes(_) | Arg::List(_) | Arg::Map(_) => false,
        }
    }

    /// Text form used when this argument is one segment of a composite key.
    pub(crate) fn segment_text(&self) -> String {
        match self {
            Arg::Nil => String::new(),
            Arg::Bool(flag) => flag.to_string(),
            Arg::Int(n) => n.to_string(),
            Arg::Float(f) => f.to_string(),
            Arg::Str(s) => s.clone(),
            Arg::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Arg::List(items) => items
                .iter()
                .map(Arg::segment_text)
                .collect::<Vec<_>>()
                .join(","),
            Arg::Map(map) => map_to_json(map.clone()).to_string(),
        }
    }

    /// Field name for this argument; only scalars name a field.
    pub(crate) fn field_name(&self) -> Option<String> {
        match self {
            Arg::Bool(flag) => Some(flag.to_string()),
            Arg::Int(n) => Some(n.to_string()),
            Arg::Float(f) => Some(f.to_string()),
            Arg::Str(s) => Some(s.clone()),
            Arg::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Arg::Nil | Arg::List(_) | Arg::Map(_) => None,
        }
    }

    /// Converts this argument into a value to be stored in a field.
    pub fn into_value(self) -> Value {
        match self {
            Arg::Str(s) => Value::Text(s),
            Arg::Bytes(bytes) => Value::Raw(bytes),
            other => Value::Json(other.into_json()),
        }
    }

    /// Converts this argument into JSON; bytes become lossy UTF-8 text.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Arg::Nil => serde_json::Value::Null,
            Arg::Bool(flag) => flag.into(),
            Arg::Int(n) => n.into(),
            Arg::Float(f) => f.into(),
            Arg::Str(s) => s.into(),
            Arg::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned().into(),
            Arg::List(items) => items.into_iter().map(Arg::into_json).collect(),
            Arg::Map(map) => map_to_json(map),
        }
    }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Raw(bytes) => String::from_utf8_lossy(&bytes).into_owned().into(),
        Value::Text(text) => text.into(),
        Value::Json(json) => json,
    }
}

fn map_to_json(map: FieldMap) -> serde_json::Value {
    serde_json::Value::Object(
        map.into_iter()
            .map(|(field, value)| (field, value_to_json(value)))
            .collect(),
    )
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_owned())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<bool> for Arg {
    fn from(flag: bool) -> Self {
        Arg::Bool(flag)
    }
}

impl From<i64> for Arg {
    fn from(n: i64) -> Self {
        Arg::Int(n)
    }
}

impl From<i32> for Arg {
    fn from(n: i32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<u32> for Arg {
    fn from(n: u32) -> Self {
        Arg::Int(n.into())
    }
}

impl From<u64> for Arg {
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Arg::Float(n as f64), Arg::Int)
    }
}

impl From<usize> for Arg {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Arg::Float(n as f64), Arg::Int)
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<Bytes> for Arg {
    fn from(bytes: Bytes) -> Self {
        Arg::Bytes(bytes)
    }
}

impl From<FieldMap> for Arg {
    fn from(map: FieldMap) -> Self {
        Arg::Map(map)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(items: Vec<T>) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Arg {
    fn from(items: [T; N]) -> Self {
        Arg::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Nil, Into::into)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Raw(bytes) => Arg::Bytes(bytes),
            Value::Text(text) => Arg::Str(text),
            Value::Json(json) => json.into(),
        }
    }
}

impl From<serde_json::Value> for Arg {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Arg::Nil,
            serde_json::Value::Bool(flag) => Arg::Bool(flag),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Arg::Int(i),
                None => Arg::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Arg::Str(s),
            serde_json::Value::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
            serde_json::Value::Object(object) => Arg::Map(
                object
                    .into_iter()
                    .map(|(field, value)| (field, Value::Json(value)))
                    .collect(),
            ),
        }
    }
}

/// Builds a `Vec<Arg>` from a list of expressions convertible into [`Arg`].
///
/// ```
/// use hstash::{Arg, args};
///
/// let call = args!["icao", "charlie", 13];
/// assert_eq!(call[2], Arg::Int(13));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_converts_structurally() {
        let arg = Arg::from(json!(["icao", 7, { "xray": 13 }]));
        let Arg::List(items) = arg else {
            panic!("expected a list");
        };
        assert_eq!(items[0], Arg::Str("icao".into()));
        assert_eq!(items[1], Arg::Int(7));
        let Arg::Map(map) = &items[2] else {
            panic!("expected a map");
        };
        assert_eq!(map.get("xray"), Some(&Value::Json(json!(13))));
    }

    #[test]
    fn falsy_shapes() {
        assert!(Arg::Nil.is_falsy());
        assert!(Arg::from("").is_falsy());
        assert!(Arg::from(0).is_falsy());
        assert!(Arg::from(false).is_falsy());
        assert!(!Arg::from("icao").is_falsy());
        assert!(!Arg::from(Vec::<Arg>::new()).is_falsy());
    }

    #[test]
    fn scalars_name_fields() {
        assert_eq!(Arg::from(7).field_name(), Some("7".into()));
        assert_eq!(Arg::from("alpha").field_name(), Some("alpha".into()));
        assert_eq!(Arg::Nil.field_name(), None);
        assert_eq!(Arg::from(vec!["a"]).field_name(), None);
    }

    #[test]
    fn values_keep_text_and_bytes() {
        assert_eq!(Arg::from("dash").into_value(), Value::Text("dash".into()));
        assert_eq!(
            Arg::from(Bytes::from_static(b"\x01")).into_value(),
            Value::Raw(Bytes::from_static(b"\x01"))
        );
        assert_eq!(Arg::from(13).into_value(), Value::Json(json!(13)));
        assert_eq!(Arg::from(vec![1, 2]).into_value(), Value::Json(json!([1, 2])));
    }

    #[test]
    fn macro_builds_arg_lists() {
        let call = crate::args!["icao", ["more", "less"], 2.5, None::<i64>];
        assert_eq!(call.len(), 4);
        assert_eq!(call[3], Arg::Nil);
        assert!(crate::args![].is_empty());
    }
}
