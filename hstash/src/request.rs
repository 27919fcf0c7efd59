//! # Argument Normalization
//!
//! Reduces each operation's positional argument list to one canonical
//! request before anything is sent to the engine.
//!
//! ## Design Principles
//!
//! 1. **One Normalizer Per Operation**: Each request type has a `normalize`
//!    constructor that matches on argument count and shape up front.
//! 2. **Key First**: The first argument is always the key input and is
//!    validated before any other argument, so a missing key always reports
//!    `InvalidKey`.
//! 3. **One Level Of Splatting**: A lone sequence after the key is unwrapped
//!    as if its elements had been passed individually.
//!
//! ## Shapes
//!
//! ```text
//! read(key)                    -> all fields
//! read(key, raw?, f)           -> one field, single value
//! read(key, raw?, f1, f2, ..)  -> listed fields, ordered map
//! write(key, {f: v, ..})       -> field map
//! write(key, f1, v1, f2, ..)   -> pairs, unpaired trailing field dropped
//! delete(key)                  -> whole record
//! delete(key, f1, ..)          -> listed fields
//! clear()                      -> every key
//! clear(k1, k2, ..)            -> listed keys, invalid ones skipped
//! ```

use hstash_common::{FieldMap, StashError, StashResult};

use crate::args::Arg;
use crate::key::KeyComposer;

/// Which fields of a record an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    One(String),
    Many(Vec<String>),
}

impl FieldSelection {
    fn from_args(args: Vec<Arg>) -> StashResult<Self> {
        let mut fields = args
            .iter()
            .map(|arg| arg.field_name().ok_or(StashError::InvalidField))
            .collect::<StashResult<Vec<_>>>()?;
        Ok(match fields.len() {
            0 => FieldSelection::All,
            1 => FieldSelection::One(fields.remove(0)),
            _ => FieldSelection::Many(fields),
        })
    }
}

/// Normalized `read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub key: String,
    pub raw: bool,
    pub fields: FieldSelection,
}

impl ReadRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let (key, mut rest) = split_key(keys, args)?;
        let raw = match rest.first() {
            Some(Arg::Bool(raw)) => {
                let raw = *raw;
                rest.remove(0);
                raw
            }
            _ => false,
        };
        let fields = FieldSelection::from_args(splat(rest))?;
        Ok(ReadRequest { key, raw, fields })
    }
}

/// Normalized `write`.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub key: String,
    pub data: FieldMap,
}

impl WriteRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let (key, rest) = split_key(keys, args)?;
        let mut rest = splat(rest);
        let data = match rest.len() {
            0 => return Err(StashError::InvalidData),
            1 => match rest.remove(0) {
                Arg::Map(map) => map,
                _ => return Err(StashError::InvalidData),
            },
            _ => {
                let mut data = FieldMap::with_capacity(rest.len() / 2);
                let mut rest = rest.into_iter();
                while let (Some(field), Some(value)) = (rest.next(), rest.next()) {
                    let field = field.field_name().ok_or(StashError::InvalidField)?;
                    data.insert(field, value.into_value());
                }
                data
            }
        };
        if data.is_empty() {
            return Err(StashError::InvalidData);
        }
        Ok(WriteRequest { key, data })
    }
}

/// Normalized `exists`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistsRequest {
    pub key: String,
    pub field: String,
}

impl ExistsRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let (key, rest) = split_key(keys, args)?;
        let field = splat(rest)
            .first()
            .and_then(Arg::field_name)
            .filter(|field| !field.is_empty())
            .ok_or(StashError::InvalidField)?;
        Ok(ExistsRequest { key, field })
    }
}

/// Normalized `delete`; `FieldSelection::All` removes the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: String,
    pub fields: FieldSelection,
}

impl DeleteRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let (key, rest) = split_key(keys, args)?;
        let fields = FieldSelection::from_args(splat(rest))?;
        Ok(DeleteRequest { key, fields })
    }
}

/// Normalized `list_fields`. Arguments after the key are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub key: String,
}

impl ListRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let (key, _) = split_key(keys, args)?;
        Ok(ListRequest { key })
    }
}

/// Normalized `search_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub pattern: String,
}

impl SearchRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let pattern = args
            .first()
            .and_then(|input| keys.compose(input))
            .ok_or(StashError::InvalidPattern)?;
        Ok(SearchRequest { pattern })
    }
}

/// Normalized `clear`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearRequest {
    /// No keys given: remove every key the engine holds.
    All,
    /// Remove exactly these keys.
    Keys(Vec<String>),
}

impl ClearRequest {
    pub fn normalize(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<Self> {
        let args = splat(args);
        if args.is_empty() {
            return Ok(ClearRequest::All);
        }
        let resolved: Vec<String> = args.iter().filter_map(|input| keys.compose(input)).collect();
        if resolved.is_empty() {
            return Err(StashError::InvalidKey);
        }
        Ok(ClearRequest::Keys(resolved))
    }
}

fn split_key(keys: &KeyComposer, args: Vec<Arg>) -> StashResult<(String, Vec<Arg>)> {
    let mut args = args.into_iter();
    let key = args
        .next()
        .and_then(|input| keys.compose(&input))
        .ok_or(StashError::InvalidKey)?;
    Ok((key, args.collect()))
}

/// Unwraps a lone sequence argument into its elements.
fn splat(mut args: Vec<Arg>) -> Vec<Arg> {
    if args.len() == 1 && matches!(args[0], Arg::List(_)) {
        if let Some(Arg::List(items)) = args.pop() {
            return items;
        }
    }
    args
}
