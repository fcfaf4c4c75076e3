//! keyagent: bounded two-level LRU key cache and request/reply queues for a
//! trusted key agent.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod agent;
pub mod cache;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod ds;
pub mod error;
pub mod global;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod protocol;
pub mod types;
