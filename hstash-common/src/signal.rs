//! # Lifecycle Signals
//!
//! Connection state changes published by an engine and republished, unchanged,
//! by the store to its own observers.

use crate::error::EngineError;

/// Capacity of the broadcast channels that carry lifecycle signals.
pub const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// A lifecycle event from the engine connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The engine is ready to accept commands.
    Ready,
    /// The transport connection is established.
    Connected,
    /// The connection has been closed and will not be reopened.
    Closed,
    /// The connection reported a failure.
    Error(EngineError),
}

impl Signal {
    /// Short lowercase name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Signal::Ready => "ready",
            Signal::Connected => "connected",
            Signal::Closed => "closed",
            Signal::Error(_) => "error",
        }
    }
}
