//! Envelope encryption seam.
//!
//! Outbound commands are sealed for the key-control service: the payload is
//! encrypted under a fresh symmetric key, and that key is wrapped under the
//! service's public key. Inbound replies are opened with the agent's private
//! key. The algorithms belong to the implementor of [`EnvelopeCipher`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sealed message as exchanged with the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Symmetric key, encrypted for the recipient.
    #[serde(with = "hex::serde")]
    pub wrapped_key: Vec<u8>,
    /// Message bytes, encrypted under the symmetric key.
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

/// Seals outbound and opens inbound payloads.
///
/// Implementations report every failure as
/// [`KeyAgentError::CryptoFailure`](crate::error::KeyAgentError::CryptoFailure).
pub trait EnvelopeCipher: Send + Sync {
    /// Encrypts `plaintext` for the key-control service.
    fn seal(&self, plaintext: &[u8]) -> Result<Envelope>;

    /// Decrypts an envelope addressed to this agent.
    fn open(&self, envelope: &Envelope) -> Result<Vec<u8>>;
}
