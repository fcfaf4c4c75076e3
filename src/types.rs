//! Identifiers and key material.
//!
//! ## Key Components
//!
//! - [`Identifier`]: 128-bit opaque id for applications and keys. Equality is
//!   the only relation; there is no `Ord`.
//! - [`KeyValue`]: fixed-size key buffer, zeroized on drop and redacted in
//!   `Debug`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyAgentError;

/// Number of bytes a [`KeyValue`] can hold.
pub const KEY_VALUE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// 128-bit application or key identifier.
///
/// Comparison always inspects all sixteen bytes.
#[derive(Clone, Copy, Eq)]
pub struct Identifier([u8; 16]);

impl Identifier {
    pub const NIL: Identifier = Identifier([0; 16]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Full-width equality with no early exit.
    #[inline]
    pub fn matches(&self, other: &Identifier) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(*uuid.as_bytes())
    }
}

impl From<Identifier> for Uuid {
    fn from(id: Identifier) -> Self {
        Uuid::from_bytes(id.0)
    }
}

impl FromStr for Identifier {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Uuid::from_bytes(self.0).hyphenated(), f)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Uuid::from_bytes(self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from)
    }
}

// ---------------------------------------------------------------------------
// KeyValue
// ---------------------------------------------------------------------------

/// Key material held in a fixed-size buffer.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyValue {
    buf: [u8; KEY_VALUE_CAPACITY],
    len: u8,
}

impl KeyValue {
    /// Copies `bytes` into a new buffer.
    ///
    /// Fails with [`KeyAgentError::KeyTooLong`] if `bytes` exceeds
    /// [`KEY_VALUE_CAPACITY`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyAgentError> {
        if bytes.len() > KEY_VALUE_CAPACITY {
            return Err(KeyAgentError::KeyTooLong {
                len: bytes.len(),
                max: KEY_VALUE_CAPACITY,
            });
        }
        let mut buf = [0u8; KEY_VALUE_CAPACITY];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            buf,
            len: bytes.len() as u8,
        })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .as_bytes()
                .iter()
                .zip(other.as_bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

impl Eq for KeyValue {}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValue")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.as_bytes()))
    }
}

impl<'de> Deserialize<'de> for KeyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let mut bytes = hex::decode(&encoded).map_err(serde::de::Error::custom)?;
        let value = KeyValue::from_slice(&bytes).map_err(serde::de::Error::custom);
        bytes.zeroize();
        value
    }
}
