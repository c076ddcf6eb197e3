//! Error types for the context compression engine.

/// Result type alias for `uc-core` operations.
pub type Result<T> = std::result::Result<T, UcError>;

/// Main error type for the compression engine.
///
/// The engine's happy path never returns an error except for misuse
/// (an unsupported `mode`); every other anomaly degrades gracefully and
/// is surfaced through counters on the returned stats instead.
#[derive(Debug, thiserror::Error)]
pub enum UcError {
    /// Caller requested a `mode` the engine does not implement.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Caller-supplied input violated a documented precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A user-supplied search pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Serialization/deserialization of provenance or message payloads failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal errors that don't fit another variant.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapped anyhow errors for compatibility with callers upstream.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UcError {
    /// Create a new "not implemented" error for an unsupported mode.
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True iff this is the reserved "not implemented" misuse kind.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }
}
