//! # Redis Network Engine
//!
//! `HashEngine` implementation that talks to a Redis-compatible server through
//! a `redis` multiplexed connection.
//!
//! ## Design Principles
//!
//! 1. **Offline Queue**: The engine is usable as soon as it is created;
//!    commands issued before the connection is up wait for it.
//! 2. **Single Connection**: One multiplexed connection carries every command;
//!    callers share it by cloning the handle.
//! 3. **No Retry**: A failed connection fails every later command, emits
//!    `Error` then `Closed`, and is not reopened. A server that goes away is
//!    noticed by the next command sent to it.
//! 4. **Subscribe Before Start**: `new` and `start` are split so observers can
//!    subscribe before the first lifecycle signal is emitted.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --start--> Connecting --handshake--> Ready --io error--> Closed
//!                     \________________failure_________________/
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::MultiplexedConnection;
use redis::{Cmd, IntoConnectionInfo, RedisError, Value};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use hstash_common::{EngineError, EngineResult, SIGNAL_CHANNEL_CAPACITY, Signal};
use hstash_engine::HashEngine;

use crate::params::ConnectParams;

/// Upper bound on establishing the connection, including `AUTH` and `SELECT`.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

enum State {
    Idle,
    Connecting,
    Ready(MultiplexedConnection),
    Closed(EngineError),
}

struct Shared {
    params: ConnectParams,
    state: watch::Sender<State>,
    signals: broadcast::Sender<Signal>,
}

/// Network engine backed by a Redis server.
pub struct RespEngine {
    shared: Arc<Shared>,
    started: AtomicBool,
}

impl RespEngine {
    /// Creates an engine without connecting.
    ///
    /// Commands are accepted and wait; nothing is sent until [`start`](Self::start).
    pub fn new(params: ConnectParams) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let (state, _) = watch::channel(State::Idle);
        RespEngine {
            shared: Arc::new(Shared {
                params,
                state,
                signals,
            }),
            started: AtomicBool::new(false),
        }
    }

    /// Creates an engine and starts connecting immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(params: ConnectParams) -> Self {
        let engine = Self::new(params);
        engine.start();
        engine
    }

    /// Spawns the connection task on the current Tokio runtime.
    ///
    /// Only the first call has an effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.state.send_replace(State::Connecting);
        tokio::spawn(Arc::clone(&self.shared).run());
    }

    /// Parameters this engine connects with.
    pub fn params(&self) -> &ConnectParams {
        &self.shared.params
    }

    /// Sends a command and waits for its reply, mapping error replies to
    /// [`EngineError::Reply`].
    ///
    /// Waits for the connection if it is not up yet. A connection-level
    /// failure closes the engine.
    pub async fn execute(&self, name: &'static str, command: &Cmd) -> EngineResult<Value> {
        let mut connection = self.connection().await?;
        let reply: Result<Value, RedisError> = command.query_async(&mut connection).await;
        reply.map_err(|err| {
            let err = engine_error(&err);
            if err.is_connection() {
                self.shared.close_with(err.clone());
            } else {
                warn!(command = name, "engine replied with error: {err}");
            }
            err
        })
    }

    async fn connection(&self) -> EngineResult<MultiplexedConnection> {
        let mut state = self.shared.state.subscribe();
        let settled = state
            .wait_for(|state| matches!(state, State::Ready(_) | State::Closed(_)))
            .await
            .map_err(|_| EngineError::Disconnected)?;
        match &*settled {
            State::Ready(connection) => Ok(connection.clone()),
            State::Closed(err) => Err(err.clone()),
            State::Idle | State::Connecting => Err(EngineError::Disconnected),
        }
    }
}

impl Shared {
    async fn run(self: Arc<Self>) {
        info!(server = %self.params, db = self.params.db, "connecting");
        match self.open().await {
            Ok(connection) => {
                self.state.send_replace(State::Ready(connection));
                info!(server = %self.params, "connection ready");
                self.emit(Signal::Ready);
            }
            Err(err) => self.close_with(err),
        }
    }

    async fn open(&self) -> EngineResult<MultiplexedConnection> {
        let mut info = (self.params.host.as_str(), self.params.port)
            .into_connection_info()
            .map_err(connect_error)?;
        info.redis.db = i64::from(self.params.db);
        info.redis.password = self.params.password.clone();

        let client = redis::Client::open(info).map_err(connect_error)?;
        let mut connection =
            tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
                .await
                .map_err(|_| {
                    EngineError::Connection(format!("timed out connecting to {}", self.params))
                })?
                .map_err(connect_error)?;
        self.emit(Signal::Connected);

        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(connect_error)?;
        if pong != "PONG" {
            return Err(EngineError::UnexpectedReply { command: "PING" });
        }
        Ok(connection)
    }

    /// Moves to `Closed` and emits `Error` then `Closed`, once.
    fn close_with(&self, err: EngineError) {
        let closed = self.state.send_if_modified(|state| {
            if matches!(state, State::Closed(_)) {
                return false;
            }
            *state = State::Closed(err.clone());
            true
        });
        if closed {
            error!(server = %self.params, "connection closed: {err}");
            self.emit(Signal::Error(err));
            self.emit(Signal::Closed);
        }
    }

    fn emit(&self, signal: Signal) {
        debug!(signal = signal.name(), "engine signal");
        let _ = self.signals.send(signal);
    }
}

/// Every failure while connecting is a connection failure.
fn connect_error(err: RedisError) -> EngineError {
    EngineError::Connection(err.to_string())
}

fn engine_error(err: &RedisError) -> EngineError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        return EngineError::Connection(err.to_string());
    }
    match (err.code(), err.detail()) {
        (Some(code), Some(detail)) => EngineError::Reply(format!("{code} {detail}")),
        (Some(code), None) => EngineError::Reply(code.to_string()),
        _ => EngineError::Protocol(err.to_string()),
    }
}

fn integer(reply: Value, command: &'static str) -> EngineResult<i64> {
    match reply {
        Value::Int(n) => Ok(n),
        _ => Err(EngineError::UnexpectedReply { command }),
    }
}

fn optional_bulk(reply: Value, command: &'static str) -> EngineResult<Option<Bytes>> {
    match reply {
        Value::Nil => Ok(None),
        Value::BulkString(data) => Ok(Some(Bytes::from(data))),
        Value::SimpleString(text) => Ok(Some(Bytes::from(text))),
        _ => Err(EngineError::UnexpectedReply { command }),
    }
}

fn optional_bulks(reply: Value, command: &'static str) -> EngineResult<Vec<Option<Bytes>>> {
    match reply {
        Value::Array(items) | Value::Set(items) => items
            .into_iter()
            .map(|item| optional_bulk(item, command))
            .collect(),
        _ => Err(EngineError::UnexpectedReply { command }),
    }
}

fn bulks(reply: Value, command: &'static str) -> EngineResult<Vec<Bytes>> {
    optional_bulks(reply, command)?
        .into_iter()
        .map(|item| item.ok_or(EngineError::UnexpectedReply { command }))
        .collect()
}

#[async_trait]
impl HashEngine for RespEngine {
    async fn hash_read_all(&self, key: &str) -> EngineResult<Vec<(Bytes, Bytes)>> {
        let reply = self.execute("HGETALL", redis::cmd("HGETALL").arg(key)).await?;
        let reply = match reply {
            Value::Map(pairs) => Value::Array(
                pairs
                    .into_iter()
                    .flat_map(|(field, value)| [field, value])
                    .collect(),
            ),
            reply => reply,
        };
        let items = bulks(reply, "HGETALL")?;
        if items.len() % 2 != 0 {
            return Err(EngineError::UnexpectedReply { command: "HGETALL" });
        }
        let mut items = items.into_iter();
        let mut pairs = Vec::with_capacity(items.len() / 2);
        while let (Some(field), Some(value)) = (items.next(), items.next()) {
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    async fn hash_read_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> EngineResult<Vec<Option<Bytes>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let reply = self.execute("HMGET", redis::cmd("HMGET").arg(key).arg(fields)).await?;
        let values = optional_bulks(reply, "HMGET")?;
        if values.len() != fields.len() {
            return Err(EngineError::UnexpectedReply { command: "HMGET" });
        }
        Ok(values)
    }

    async fn hash_write_many(&self, key: &str, pairs: Vec<(String, Bytes)>) -> EngineResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        let mut command = redis::cmd("HSET");
        command.arg(key);
        for (field, value) in &pairs {
            command.arg(field).arg(&value[..]);
        }
        match self.execute("HSET", &command).await? {
            Value::Int(_) | Value::Okay => Ok(()),
            _ => Err(EngineError::UnexpectedReply { command: "HSET" }),
        }
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> EngineResult<bool> {
        let reply = self
            .execute("HEXISTS", redis::cmd("HEXISTS").arg(key).arg(field))
            .await?;
        Ok(integer(reply, "HEXISTS")? == 1)
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[String]) -> EngineResult<u64> {
        if fields.is_empty() {
            return Ok(0);
        }
        let reply = self.execute("HDEL", redis::cmd("HDEL").arg(key).arg(fields)).await?;
        Ok(integer(reply, "HDEL")?.max(0) as u64)
    }

    async fn hash_list_fields(&self, key: &str) -> EngineResult<Vec<Bytes>> {
        let reply = self.execute("HKEYS", redis::cmd("HKEYS").arg(key)).await?;
        bulks(reply, "HKEYS")
    }

    async fn search_keys(&self, pattern: &str) -> EngineResult<Vec<Bytes>> {
        let reply = self.execute("KEYS", redis::cmd("KEYS").arg(pattern)).await?;
        bulks(reply, "KEYS")
    }

    async fn delete_keys(&self, keys: &[String]) -> EngineResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let reply = self.execute("DEL", redis::cmd("DEL").arg(keys)).await?;
        Ok(integer(reply, "DEL")?.max(0) as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.shared.signals.subscribe()
    }
}
