//! Wire encoding of commands and replies.
//!
//! [`MessageCodec`] is the seam to whatever format the key-control service
//! speaks. [`JsonCodec`] is the provided implementation.

use crate::error::{KeyAgentError, Result};
use crate::protocol::{CommandNode, ReplyNode};

/// Lossless conversion between messages and their wire bytes.
pub trait MessageCodec: Send + Sync {
    fn encode_command(&self, command: &CommandNode) -> Result<Vec<u8>>;
    fn decode_command(&self, bytes: &[u8]) -> Result<CommandNode>;
    fn encode_reply(&self, reply: &ReplyNode) -> Result<Vec<u8>>;
    fn decode_reply(&self, bytes: &[u8]) -> Result<ReplyNode>;
}

/// JSON via `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode_command(&self, command: &CommandNode) -> Result<Vec<u8>> {
        serde_json::to_vec(command).map_err(|e| KeyAgentError::serialization(e.to_string()))
    }

    fn decode_command(&self, bytes: &[u8]) -> Result<CommandNode> {
        serde_json::from_slice(bytes).map_err(|e| KeyAgentError::serialization(e.to_string()))
    }

    fn encode_reply(&self, reply: &ReplyNode) -> Result<Vec<u8>> {
        serde_json::to_vec(reply).map_err(|e| KeyAgentError::serialization(e.to_string()))
    }

    fn decode_reply(&self, bytes: &[u8]) -> Result<ReplyNode> {
        serde_json::from_slice(bytes).map_err(|e| KeyAgentError::serialization(e.to_string()))
    }
}
