//! Process-wide agent instance.
//!
//! Hosts that expose the agent through free-standing entry points install one
//! [`KeyAgent`] at startup and reach it through [`agent`]. The instance lives
//! for the rest of the process; [`reset`] empties it without replacing it.
//!
//! ```rust,ignore
//! keyagent::global::install(KeyAgent::builder().build(cipher)?)?;
//! let agent = keyagent::global::agent()?;
//! agent.resolve(&app, &key)?;
//! ```

use std::sync::OnceLock;

use crate::agent::KeyAgent;
use crate::error::{KeyAgentError, Result};

static AGENT: OnceLock<KeyAgent> = OnceLock::new();

/// Installs `agent` as the process-wide instance.
///
/// Fails with [`KeyAgentError::AlreadyInitialized`] if one is installed; the
/// rejected agent is dropped.
pub fn install(agent: KeyAgent) -> Result<&'static KeyAgent> {
    AGENT
        .set(agent)
        .map_err(|_rejected| KeyAgentError::AlreadyInitialized)?;
    tracing::debug!("installed process-wide key agent");
    self::agent()
}

/// The installed instance, or [`KeyAgentError::NotInitialized`].
pub fn agent() -> Result<&'static KeyAgent> {
    AGENT.get().ok_or(KeyAgentError::NotInitialized)
}

pub fn is_initialized() -> bool {
    AGENT.get().is_some()
}

/// Empties the installed instance: cache, queues and credentials.
pub fn reset() -> Result<()> {
    agent()?.reset();
    Ok(())
}
