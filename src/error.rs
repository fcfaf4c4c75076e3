//! Error types for the key agent.
//!
//! ## Key Components
//!
//! - [`KeyAgentError`]: Outcomes returned by cache, queue and protocol
//!   operations that did not produce a value.
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`ConfigError`]: Returned when agent configuration parameters are invalid
//!   (e.g. zero capacity).
//!
//! A cache miss is not an error. `KeyCache::lookup` reports it as `None` and
//! `KeyAgent::resolve` as `Resolution::Pending`.
//!
//! ## Example Usage
//!
//! ```
//! use keyagent::config::AgentConfig;
//! use keyagent::error::ConfigError;
//!
//! let config = AgentConfig {
//!     max_applications: 0,
//!     ..AgentConfig::default()
//! };
//! let err: ConfigError = config.validate().unwrap_err();
//! assert!(err.to_string().contains("max_applications"));
//! ```

use crate::types::Identifier;

/// Convenience alias used throughout the crate.
pub type Result<T, E = KeyAgentError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// KeyAgentError
// ---------------------------------------------------------------------------

/// Typed failure outcomes of key-agent operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyAgentError {
    /// Producer backpressure: the target queue had no free slot.
    #[error("{queue} queue is full")]
    QueueFull { queue: QueueKind },

    /// Consumer found nothing to dequeue.
    #[error("{queue} queue is empty")]
    QueueEmpty { queue: QueueKind },

    /// Removal or clear target is absent from the cache.
    #[error("not found: application {application}{}", key_suffix(.key))]
    NotFound {
        application: Identifier,
        key: Option<Identifier>,
    },

    /// The credential gate rejected the caller.
    #[error("access denied for application {application}")]
    AccessDenied { application: Identifier },

    /// Reported by the crypto collaborator.
    #[error("crypto failure: {message}")]
    CryptoFailure { message: String },

    /// Reported by the serialization collaborator.
    #[error("serialization failure: {message}")]
    SerializationFailure { message: String },

    /// The key-control service answered with a failure outcome.
    #[error("key service failed for application {application} key {key}: code {code}: {message}")]
    ServiceFailure {
        application: Identifier,
        key: Identifier,
        code: u32,
        message: String,
    },

    /// A slot could not be obtained even after eviction. Internal fault.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(&'static str),

    /// Key material does not fit the fixed-size buffer.
    #[error("key material is {len} bytes, at most {max} allowed")]
    KeyTooLong { len: usize, max: usize },

    #[error("key agent not initialized")]
    NotInitialized,

    #[error("key agent already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn key_suffix(key: &Option<Identifier>) -> String {
    key.map(|k| format!(" key {k}")).unwrap_or_default()
}

/// Which of the two queues an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Command,
    Reply,
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Command => f.write_str("command"),
            QueueKind::Reply => f.write_str("reply"),
        }
    }
}

impl KeyAgentError {
    /// Error for [`EnvelopeCipher`](crate::crypto::EnvelopeCipher)
    /// implementations to return when sealing or opening fails.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::CryptoFailure {
            message: message.into(),
        }
    }

    pub(crate) fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationFailure {
            message: message.into(),
        }
    }

    /// Returns `true` for backpressure/polling outcomes a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull { .. } | Self::QueueEmpty { .. })
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` on [`RecencyList`](crate::ds::RecencyList)
/// and [`KeyCache`](crate::cache::KeyCache). Carries a human-readable
/// description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when agent configuration parameters are invalid.
///
/// Produced by [`AgentConfig::validate`](crate::config::AgentConfig::validate),
/// the YAML loader and [`AgentBuilder::build`](crate::config::AgentBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
