pub use crate::agent::KeyAgent;
pub use crate::cache::{InsertOutcome, KeyCache};
pub use crate::codec::{JsonCodec, MessageCodec};
pub use crate::config::{AgentBuilder, AgentConfig};
pub use crate::credentials::{CredentialStore, CredentialVerifier};
pub use crate::crypto::{Envelope, EnvelopeCipher};
pub use crate::ds::{CircularQueue, QueueFull, RecencyList, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError, KeyAgentError, QueueKind, Result};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::{AgentMetricsSnapshot, KeyCacheMetricsSnapshot};
pub use crate::protocol::{
    AccountInfo, CommandNode, OperationKind, ReplyNode, ReplyOutcome, ReplyState, Resolution,
};
pub use crate::types::{Identifier, KeyValue, KEY_VALUE_CAPACITY};
