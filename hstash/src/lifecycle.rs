//! # Connection Lifecycle
//!
//! Republishes the engine's lifecycle signals on the store's own channel.
//!
//! ## Design Principles
//!
//! 1. **Subscribe Once**: The engine receiver is taken when the store is built,
//!    before a store-owned engine is started, so no signal is missed.
//! 2. **Verbatim Forwarding**: Every signal is re-sent unchanged. The store
//!    never originates a signal of its own.
//! 3. **Bound To The Store**: The forwarding task is aborted when the last
//!    store handle is dropped.

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use hstash_common::{SIGNAL_CHANNEL_CAPACITY, Signal};

/// Observer surface for engine lifecycle signals.
pub struct ConnectionLifecycle {
    signals: broadcast::Sender<Signal>,
    forwarder: JoinHandle<()>,
}

impl ConnectionLifecycle {
    /// Starts forwarding signals from `engine` on `runtime`.
    pub fn attach(engine: broadcast::Receiver<Signal>, runtime: &Handle) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        let forwarder = runtime.spawn(forward(engine, signals.clone()));
        ConnectionLifecycle { signals, forwarder }
    }

    /// Returns a receiver for every signal forwarded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }
}

impl Drop for ConnectionLifecycle {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

async fn forward(mut engine: broadcast::Receiver<Signal>, signals: broadcast::Sender<Signal>) {
    loop {
        let signal = match engine.recv().await {
            Ok(signal) => signal,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "lifecycle forwarder lagged behind engine");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        match &signal {
            Signal::Connected => debug!("engine connected"),
            Signal::Ready => info!("engine ready"),
            Signal::Closed => info!("engine connection closed"),
            Signal::Error(err) => error!(code = err.code(), "engine error: {err}"),
        }
        // No observers is not an error.
        let _ = signals.send(signal);
    }
    debug!("engine signal channel closed; lifecycle forwarder exiting");
}
