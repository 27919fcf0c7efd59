//! # Hash Store
//!
//! The public operation surface. Each call normalizes its arguments, issues
//! at most two engine commands, and decodes the reply.
//!
//! ## Design Principles
//!
//! 1. **Validate Before Sending**: Every validation error is raised by the
//!    normalizer, before the engine sees a command.
//! 2. **Engine Errors Pass Through**: Failures from the engine are returned as
//!    `StashError::Engine` without retry or translation.
//! 3. **Eager Decoding**: Replies are decoded into plain values and ordered
//!    maps as they leave the engine boundary.
//! 4. **Cheap Handles**: `HashStore` is a reference-counted handle; clones share
//!    the engine, configuration and lifecycle forwarder.
//!
//! ## Command Mapping
//!
//! ```text
//! read       -> HGETALL | HMGET
//! write      -> HSET
//! exists     -> HEXISTS
//! delete     -> HDEL | DEL
//! list       -> HKEYS
//! search     -> KEYS
//! clear      -> [KEYS *] + DEL
//! ```

use std::slice;
use std::sync::Arc;

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use hstash_client::RespEngine;
use hstash_common::{EngineError, FieldMap, Signal, StashResult, Value};
use hstash_engine::HashEngine;

use crate::args::Arg;
use crate::codec::ValueCodec;
use crate::config::{Connection, StoreConfig};
use crate::key::{Delimiter, KeyComposer};
use crate::lifecycle::ConnectionLifecycle;
use crate::request::{
    ClearRequest, DeleteRequest, ExistsRequest, FieldSelection, ListRequest, ReadRequest,
    SearchRequest, WriteRequest,
};

/// Result of a `read`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadReply {
    /// Exactly one field was named; `None` if it is absent.
    Value(Option<Value>),
    /// Zero or several fields were named. Named fields keep request order and
    /// absent ones map to `None`.
    Fields(FieldMap<Option<Value>>),
}

impl ReadReply {
    /// The single value, if this reply is for one field.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ReadReply::Value(value) => value.as_ref(),
            ReadReply::Fields(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ReadReply::Value(value) => value,
            ReadReply::Fields(_) => None,
        }
    }

    /// The field map, if this reply is for zero or several fields.
    pub fn fields(&self) -> Option<&FieldMap<Option<Value>>> {
        match self {
            ReadReply::Fields(fields) => Some(fields),
            ReadReply::Value(_) => None,
        }
    }

    pub fn into_fields(self) -> Option<FieldMap<Option<Value>>> {
        match self {
            ReadReply::Fields(fields) => Some(fields),
            ReadReply::Value(_) => None,
        }
    }
}

struct StoreInner {
    engine: Arc<dyn HashEngine>,
    keys: KeyComposer,
    codec: ValueCodec,
    lifecycle: ConnectionLifecycle,
    runtime: Handle,
}

/// Hash-oriented key/value store over a [`HashEngine`].
#[derive(Clone)]
pub struct HashStore {
    inner: Arc<StoreInner>,
}

impl HashStore {
    /// Builds a store from `config`.
    ///
    /// Must be called from within a Tokio runtime. With connect parameters the
    /// store creates a [`RespEngine`] and starts it after subscribing to its
    /// lifecycle signals.
    pub fn new(config: StoreConfig) -> StashResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|_| EngineError::Connection("no Tokio runtime available".to_string()))?;
        let (engine, owned): (Arc<dyn HashEngine>, Option<Arc<RespEngine>>) =
            match config.connection {
                Connection::Engine(engine) => (engine, None),
                Connection::Params(params) => {
                    debug!(server = %params, "creating network engine");
                    let engine = Arc::new(RespEngine::new(params));
                    let shared: Arc<dyn HashEngine> = engine.clone();
                    (shared, Some(engine))
                }
            };
        let lifecycle = ConnectionLifecycle::attach(engine.subscribe(), &runtime);
        if let Some(owned) = owned {
            owned.start();
        }
        Ok(HashStore {
            inner: Arc::new(StoreInner {
                engine,
                keys: KeyComposer::new(config.delimiter),
                codec: ValueCodec::new(config.cast_mode),
                lifecycle,
                runtime,
            }),
        })
    }

    /// Builds a store over `engine` with default settings.
    pub fn with_engine(engine: Arc<dyn HashEngine>) -> StashResult<Self> {
        Self::new(StoreConfig::with_engine(engine))
    }

    pub fn delimiter(&self) -> &Delimiter {
        self.inner.keys.delimiter()
    }

    pub fn cast_mode(&self) -> bool {
        self.inner.codec.cast_mode()
    }

    /// The underlying engine handle.
    pub fn engine(&self) -> &Arc<dyn HashEngine> {
        &self.inner.engine
    }

    /// Subscribes to the engine's lifecycle signals as republished by this store.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.inner.lifecycle.subscribe()
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Reads one field, several fields, or the whole record.
    ///
    /// `args`: key, optional raw-mode flag, then field names.
    pub async fn read(&self, args: Vec<Arg>) -> StashResult<ReadReply> {
        let ReadRequest { key, raw, fields } = ReadRequest::normalize(&self.inner.keys, args)?;
        debug!(%key, raw, ?fields, "read");
        let engine = &self.inner.engine;
        let codec = &self.inner.codec;
        match fields {
            FieldSelection::All => {
                let pairs = engine.hash_read_all(&key).await?;
                Ok(ReadReply::Fields(
                    pairs
                        .into_iter()
                        .map(|(field, value)| (text(&field), codec.decode(Some(value), raw)))
                        .collect(),
                ))
            }
            FieldSelection::One(field) => {
                let mut values = self.read_many(&key, slice::from_ref(&field)).await?;
                Ok(ReadReply::Value(codec.decode(values.pop().flatten(), raw)))
            }
            FieldSelection::Many(fields) => {
                let values = self.read_many(&key, &fields).await?;
                Ok(ReadReply::Fields(
                    fields
                        .into_iter()
                        .zip(values)
                        .map(|(field, value)| (field, codec.decode(value, raw)))
                        .collect(),
                ))
            }
        }
    }

    /// HMGET with one reply slot per requested field.
    async fn read_many(&self, key: &str, fields: &[String]) -> StashResult<Vec<Option<Bytes>>> {
        let values = self.inner.engine.hash_read_many(key, fields).await?;
        if values.len() != fields.len() {
            warn!(%key, asked = fields.len(), got = values.len(), "HMGET reply length mismatch");
            return Err(EngineError::UnexpectedReply { command: "HMGET" }.into());
        }
        Ok(values)
    }

    /// Writes fields from a field map or from alternating field/value pairs.
    pub async fn write(&self, args: Vec<Arg>) -> StashResult<()> {
        let WriteRequest { key, data } = WriteRequest::normalize(&self.inner.keys, args)?;
        debug!(%key, fields = data.len(), "write");
        let pairs = data
            .into_iter()
            .map(|(field, value)| {
                let encoded = self.inner.codec.encode(&field, value)?;
                Ok((field, encoded.into_bytes()))
            })
            .collect::<StashResult<Vec<_>>>()?;
        self.inner.engine.hash_write_many(&key, pairs).await?;
        Ok(())
    }

    /// Reports whether a field exists in a record.
    pub async fn exists(&self, args: Vec<Arg>) -> StashResult<bool> {
        let ExistsRequest { key, field } = ExistsRequest::normalize(&self.inner.keys, args)?;
        debug!(%key, %field, "exists");
        Ok(self.inner.engine.hash_field_exists(&key, &field).await?)
    }

    /// Deletes the named fields, or the whole record when none are named.
    pub async fn delete(&self, args: Vec<Arg>) -> StashResult<()> {
        let DeleteRequest { key, fields } = DeleteRequest::normalize(&self.inner.keys, args)?;
        debug!(%key, ?fields, "delete");
        let engine = &self.inner.engine;
        match fields {
            FieldSelection::All => engine.delete_keys(slice::from_ref(&key)).await?,
            FieldSelection::One(field) => {
                engine
                    .hash_delete_fields(&key, slice::from_ref(&field))
                    .await?
            }
            FieldSelection::Many(fields) => engine.hash_delete_fields(&key, &fields).await?,
        };
        Ok(())
    }

    /// Lists the field names of a record; empty if the record does not exist.
    pub async fn list_fields(&self, args: Vec<Arg>) -> StashResult<Vec<String>> {
        let ListRequest { key } = ListRequest::normalize(&self.inner.keys, args)?;
        debug!(%key, "list fields");
        let fields = self.inner.engine.hash_list_fields(&key).await?;
        Ok(fields.iter().map(text).collect())
    }

    /// Lists keys matching a glob pattern.
    pub async fn search_keys(&self, args: Vec<Arg>) -> StashResult<Vec<String>> {
        let SearchRequest { pattern } = SearchRequest::normalize(&self.inner.keys, args)?;
        debug!(%pattern, "search keys");
        let keys = self.inner.engine.search_keys(&pattern).await?;
        Ok(keys.iter().map(text).collect())
    }

    /// Deletes the given keys, or every key when none are given.
    pub async fn clear(&self, args: Vec<Arg>) -> StashResult<()> {
        let keys = match ClearRequest::normalize(&self.inner.keys, args)? {
            ClearRequest::Keys(keys) => keys,
            ClearRequest::All => {
                let found = self.inner.engine.search_keys("*").await?;
                found.iter().map(text).collect()
            }
        };
        debug!(keys = keys.len(), "clear");
        if keys.is_empty() {
            return Ok(());
        }
        self.inner.engine.delete_keys(&keys).await?;
        Ok(())
    }
}

fn text(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use hstash_common::{EngineResult, StashError};
    use hstash_engine::MemoryEngine;

    fn store() -> (Arc<MemoryEngine>, HashStore) {
        let engine = Arc::new(MemoryEngine::new());
        let store = HashStore::with_engine(engine.clone()).unwrap();
        (engine, store)
    }

    #[tokio::test]
    async fn reads_whole_record_in_write_order() {
        let (_, store) = store();
        store
            .write(args!["icao", "alpha", "a", "bravo", 2])
            .await
            .unwrap();
        let fields = store.read(args!["icao"]).await.unwrap().into_fields().unwrap();
        let names: Vec<_> = fields.keys().collect();
        assert_eq!(names, ["alpha", "bravo"]);
        assert_eq!(fields.get("bravo"), Some(&Some(Value::Json(2.into()))));
    }

    #[tokio::test]
    async fn whole_record_of_missing_key_is_empty() {
        let (_, store) = store();
        let fields = store.read(args!["nothing"]).await.unwrap().into_fields().unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn delete_without_fields_drops_record() {
        let (engine, store) = store();
        store.write(args!["icao", "alpha", "a"]).await.unwrap();
        store.delete(args!["icao"]).await.unwrap();
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn clear_all_on_empty_engine_skips_delete() {
        let (engine, store) = store();
        store.clear(args![]).await.unwrap();
        assert_eq!(engine.commands_executed(), 1);
    }

    #[tokio::test]
    async fn cast_mode_off_rejects_structured_values_before_sending() {
        let engine = Arc::new(MemoryEngine::new());
        let store =
            HashStore::new(StoreConfig::with_engine(engine.clone()).with_cast_mode(false)).unwrap();
        let err = store
            .write(args!["icao", "yankee", vec![1, 2]])
            .await
            .unwrap_err();
        assert!(matches!(err, StashError::InvalidValue { .. }));
        assert_eq!(engine.commands_executed(), 0);
    }

    /// Drops the last slot of every HMGET reply.
    struct ShortReplies(MemoryEngine);

    #[async_trait::async_trait]
    impl HashEngine for ShortReplies {
        async fn hash_read_all(&self, key: &str) -> EngineResult<Vec<(Bytes, Bytes)>> {
            self.0.hash_read_all(key).await
        }
        async fn hash_read_many(
            &self,
            key: &str,
            fields: &[String],
        ) -> EngineResult<Vec<Option<Bytes>>> {
            let mut values = self.0.hash_read_many(key, fields).await?;
            values.pop();
            Ok(values)
        }
        async fn hash_write_many(&self, key: &str, pairs: Vec<(String, Bytes)>) -> EngineResult<()> {
            self.0.hash_write_many(key, pairs).await
        }
        async fn hash_field_exists(&self, key: &str, field: &str) -> EngineResult<bool> {
            self.0.hash_field_exists(key, field).await
        }
        async fn hash_delete_fields(&self, key: &str, fields: &[String]) -> EngineResult<u64> {
            self.0.hash_delete_fields(key, fields).await
        }
        async fn hash_list_fields(&self, key: &str) -> EngineResult<Vec<Bytes>> {
            self.0.hash_list_fields(key).await
        }
        async fn search_keys(&self, pattern: &str) -> EngineResult<Vec<Bytes>> {
            self.0.search_keys(pattern).await
        }
        async fn delete_keys(&self, keys: &[String]) -> EngineResult<u64> {
            self.0.delete_keys(keys).await
        }
        fn subscribe(&self) -> broadcast::Receiver<Signal> {
            self.0.subscribe()
        }
    }

    #[tokio::test]
    async fn short_hmget_reply_is_an_error() {
        let store = HashStore::with_engine(Arc::new(ShortReplies(MemoryEngine::new()))).unwrap();
        store.write(args!["icao", "alpha", "a", "bravo", "b"]).await.unwrap();
        let expected = StashError::Engine(EngineError::UnexpectedReply { command: "HMGET" });
        assert_eq!(store.read(args!["icao", "alpha", "bravo"]).await.unwrap_err(), expected);
        assert_eq!(store.read(args!["icao", "alpha"]).await.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn empty_field_name_never_reaches_engine() {
        let (engine, store) = store();
        let err = store.exists(args!["icao", ""]).await.unwrap_err();
        assert_eq!(err, StashError::InvalidField);
        assert_eq!(engine.commands_executed(), 0);
    }

    #[test]
    fn construction_needs_a_runtime() {
        let err = HashStore::with_engine(Arc::new(MemoryEngine::new()))
            .err()
            .unwrap();
        assert!(matches!(err, StashError::Engine(EngineError::Connection(_))));
    }
}
