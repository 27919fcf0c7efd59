//! # HashStash Error Types
//!
//! ## Design Principles
//!
//! 1. **Stable Codes**: Each variant has a fixed numeric code so callers can
//!    match on errors without comparing strings.
//! 2. **Categorized Ranges**: Codes are grouped by intent (validation, engine).
//! 3. **Validate Before Dispatch**: Validation errors are raised before any
//!    engine command is issued; engine errors are passed through untouched.
//! 4. **Cloneable**: Engine errors are also published on the lifecycle
//!    channel, so every variant is `Clone`.

/// Result type used across HashStash components.
pub type StashResult<T> = core::result::Result<T, StashError>;

/// Result type returned by engine implementations.
pub type EngineResult<T> = core::result::Result<T, EngineError>;

/// High-level category for grouping error codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StashErrorCategory {
    /// The call shape or its arguments were rejected before reaching the engine.
    Validation,
    /// The engine (or the connection to it) reported a failure.
    Engine,
}

/// Errors returned by store operations.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StashError {
    /// Validation error: key input did not compose into a key (code 1).
    #[error("invalid key")]
    InvalidKey,
    /// Validation error: a required field is missing or not a scalar (code 2).
    #[error("invalid field")]
    InvalidField,
    /// Validation error: a write resolved to zero field/value pairs (code 3).
    #[error("invalid data")]
    InvalidData,
    /// Validation error: search pattern is empty or malformed (code 4).
    #[error("invalid pattern")]
    InvalidPattern,
    /// Validation error: value cannot be encoded with cast mode disabled (code 5).
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Engine error: surfaced by the engine, never retried (code 20+).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl StashError {
    /// Returns the stable numeric code for the error.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidKey => 1,
            Self::InvalidField => 2,
            Self::InvalidData => 3,
            Self::InvalidPattern => 4,
            Self::InvalidValue { .. } => 5,
            Self::Engine(err) => err.code(),
        }
    }

    /// Returns the coarse category of the error.
    pub fn category(&self) -> StashErrorCategory {
        match self {
            Self::Engine(_) => StashErrorCategory::Engine,
            _ => StashErrorCategory::Validation,
        }
    }

    /// Returns true if the error was raised before any engine command was sent.
    pub fn is_validation(&self) -> bool {
        self.category() == StashErrorCategory::Validation
    }
}

/// Failures reported by an engine implementation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The connection was closed before a reply arrived (code 20).
    #[error("connection closed")]
    Disconnected,
    /// The connection could not be established or broke mid-flight (code 21).
    #[error("connection failed: {0}")]
    Connection(String),
    /// The engine answered with an error reply, kept verbatim (code 22).
    #[error("{0}")]
    Reply(String),
    /// The engine sent bytes that are not valid protocol (code 23).
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The engine sent a well-formed reply of the wrong shape (code 24).
    #[error("unexpected reply to {command}")]
    UnexpectedReply { command: &'static str },
}

impl EngineError {
    /// Returns the stable numeric code for the error.
    pub const fn code(&self) -> u16 {
        match self {
            Self::Disconnected => 20,
            Self::Connection(_) => 21,
            Self::Reply(_) => 22,
            Self::Protocol(_) => 23,
            Self::UnexpectedReply { .. } => 24,
        }
    }

    /// Returns true if the failure happened at the connection level.
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Connection(_))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
