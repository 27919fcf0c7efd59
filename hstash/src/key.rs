//! Composite key construction.
//!
//! A key is either a single non-empty string or non-zero number used as-is,
//! or a non-empty sequence of segments joined by the configured delimiter.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::args::Arg;

/// Separator placed between the segments of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(String);

impl Delimiter {
    /// The default delimiter, `:`.
    pub const DEFAULT: &'static str = ":";

    pub fn new(delimiter: impl Into<String>) -> Self {
        Delimiter(delimiter.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Delimiter {
    fn from(delimiter: &str) -> Self {
        Delimiter::new(delimiter)
    }
}

impl From<String> for Delimiter {
    fn from(delimiter: String) -> Self {
        Delimiter(delimiter)
    }
}

impl From<i64> for Delimiter {
    fn from(delimiter: i64) -> Self {
        Delimiter(delimiter.to_string())
    }
}

impl<'de> Deserialize<'de> for Delimiter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Delimiter(text),
            Repr::Integer(n) => Delimiter(n.to_string()),
            Repr::Float(f) => Delimiter(f.to_string()),
        })
    }
}

/// Builds key strings from raw key arguments.
#[derive(Debug, Clone, Default)]
pub struct KeyComposer {
    delimiter: Delimiter,
}

impl KeyComposer {
    pub fn new(delimiter: Delimiter) -> Self {
        KeyComposer { delimiter }
    }

    pub fn delimiter(&self) -> &Delimiter {
        &self.delimiter
    }

    /// Composes a key, or returns `None` if the input cannot name a key.
    ///
    /// Sequences are joined with the delimiter; a non-empty string or a
    /// non-zero number is its own key. Every other shape is rejected.
    pub fn compose(&self, input: &Arg) -> Option<String> {
        match input {
            Arg::List(segments) if !segments.is_empty() => Some(
                segments
                    .iter()
                    .map(Arg::segment_text)
                    .collect::<Vec<_>>()
                    .join(self.delimiter.as_str()),
            ),
            Arg::Str(_) | Arg::Int(_) | Arg::Float(_) if !input.is_falsy() => {
                Some(input.segment_text())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn joins_segments_with_delimiter() {
        let keys = KeyComposer::default();
        assert_eq!(keys.compose(&Arg::from(["icao", "more"])), Some("icao:more".into()));
        let keys = KeyComposer::new(Delimiter::from("/"));
        assert_eq!(
            keys.compose(&Arg::from(args!["user", 42, "profile"])),
            Some("user/42/profile".into())
        );
    }

    #[test]
    fn single_segments_are_unchanged() {
        let keys = KeyComposer::default();
        assert_eq!(keys.compose(&Arg::from("icao")), Some("icao".into()));
        assert_eq!(keys.compose(&Arg::from(["icao"])), Some("icao".into()));
        assert_eq!(keys.compose(&Arg::from(13)), Some("13".into()));
    }

    #[test]
    fn rejects_empty_and_falsy_inputs() {
        let keys = KeyComposer::default();
        for input in [
            Arg::Nil,
            Arg::from(""),
            Arg::from(0),
            Arg::from(true),
            Arg::from(false),
            Arg::List(Vec::new()),
            Arg::Map(Default::default()),
            Arg::Bytes(bytes::Bytes::from_static(b"icao")),
        ] {
            assert_eq!(keys.compose(&input), None, "{input:?}");
        }
    }

    #[test]
    fn numeric_delimiters_are_stringified() {
        let keys = KeyComposer::new(Delimiter::from(0i64));
        assert_eq!(keys.compose(&Arg::from(["a", "b"])), Some("a0b".into()));
    }

    #[test]
    fn delimiter_deserializes_from_string_or_number() {
        let text: Delimiter = serde_json::from_str(r#""::""#).unwrap();
        assert_eq!(text.as_str(), "::");
        let number: Delimiter = serde_json::from_str("7").unwrap();
        assert_eq!(number.as_str(), "7");
    }
}
