//! Messages exchanged with the key-control service.
//!
//! A [`CommandNode`] travels out through the command queue, a [`ReplyNode`]
//! comes back through the reply queue. Both are correlated by the
//! `(application_id, key_id)` pair.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KeyAgentError, Result};
use crate::types::{Identifier, KeyValue};

/// What a command asks the service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Create a new key for the application.
    Generate,
    /// Fetch a key the local cache does not hold.
    Search,
    /// Drop a key from the local cache.
    Delete,
    /// Destroy a key at the service as well.
    Destroy,
    /// Register application account information.
    SaveInfo,
    /// Drop an application's cached state.
    Clear,
}

/// Outbound request, consumed once by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandNode {
    pub application_id: Identifier,
    pub key_id: Identifier,
    pub kind: OperationKind,
    /// Opaque to this crate.
    #[serde(default, with = "hex::serde")]
    pub payload: Vec<u8>,
}

impl CommandNode {
    pub fn new(application_id: Identifier, key_id: Identifier, kind: OperationKind) -> Self {
        Self {
            application_id,
            key_id,
            kind,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Application account credentials delivered by a `SaveInfo` reply.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AccountInfo {
    pub account: String,
    pub password: String,
}

impl fmt::Debug for AccountInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountInfo")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Result the service reports for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// Resolved key material.
    Key { value: KeyValue },
    /// Application account information.
    Info { info: AccountInfo },
    /// Acknowledged without data.
    Done,
    /// The service refused or failed.
    Failed { code: u32, message: String },
}

impl ReplyOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, ReplyOutcome::Failed { .. })
    }
}

/// Inbound response, consumed once by reply application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyNode {
    pub application_id: Identifier,
    pub key_id: Identifier,
    pub kind: OperationKind,
    pub outcome: ReplyOutcome,
}

impl ReplyNode {
    pub fn key(application_id: Identifier, key_id: Identifier, kind: OperationKind, value: KeyValue) -> Self {
        Self {
            application_id,
            key_id,
            kind,
            outcome: ReplyOutcome::Key { value },
        }
    }

    pub fn failed(
        application_id: Identifier,
        key_id: Identifier,
        kind: OperationKind,
        code: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            application_id,
            key_id,
            kind,
            outcome: ReplyOutcome::Failed {
                code,
                message: message.into(),
            },
        }
    }

    /// Whether this reply answers `command`.
    pub fn answers(&self, command: &CommandNode) -> bool {
        self.application_id.matches(&command.application_id)
            && self.key_id.matches(&command.key_id)
            && self.kind == command.kind
    }
}

/// Result of [`KeyAgent::resolve`](crate::agent::KeyAgent::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Cache hit.
    Resolved(KeyValue),
    /// Miss; a `Search` command is queued. Drain replies and resolve again.
    Pending,
}

/// State a request reached once its reply was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyState {
    /// Success outcome folded into the cache (or credential store).
    Resolved,
    /// Failure outcome; carries the service's code and message.
    Failed { code: u32, message: String },
}

impl ReplyState {
    /// Converts a failed state into [`KeyAgentError::ServiceFailure`] for
    /// callers that want `?` propagation.
    pub fn into_result(self, reply: &ReplyNode) -> Result<()> {
        match self {
            ReplyState::Resolved => Ok(()),
            ReplyState::Failed { code, message } => Err(KeyAgentError::ServiceFailure {
                application: reply.application_id,
                key: reply.key_id,
                code,
                message,
            }),
        }
    }
}
