//! Agent configuration and builder.
//!
//! [`AgentConfig`] carries the four capacities the agent is sized by. It can
//! be deserialized from YAML and is validated before any structure is
//! allocated.
//!
//! ## Example
//!
//! ```rust
//! use keyagent::config::AgentConfig;
//!
//! let config = AgentConfig::from_yaml_str(
//!     "max_applications: 4\nmax_keys_per_application: 8\n",
//! )
//! .unwrap();
//! assert_eq!(config.max_applications, 4);
//! assert_eq!(config.command_queue_capacity, AgentConfig::default().command_queue_capacity);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::KeyAgent;
use crate::codec::{JsonCodec, MessageCodec};
use crate::credentials::CredentialVerifier;
use crate::crypto::EnvelopeCipher;
use crate::error::ConfigError;

pub const DEFAULT_MAX_APPLICATIONS: usize = 16;
pub const DEFAULT_MAX_KEYS_PER_APPLICATION: usize = 16;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Capacities of the cache levels and of both queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Applications held by the cache at once.
    pub max_applications: usize,
    /// Keys held per application at once.
    pub max_keys_per_application: usize,
    /// Outbound commands awaiting the transport.
    pub command_queue_capacity: usize,
    /// Inbound replies awaiting application.
    pub reply_queue_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_applications: DEFAULT_MAX_APPLICATIONS,
            max_keys_per_application: DEFAULT_MAX_KEYS_PER_APPLICATION,
            command_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            reply_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl AgentConfig {
    /// Rejects zero capacities, naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("max_applications", self.max_applications),
            ("max_keys_per_application", self.max_keys_per_application),
            ("command_queue_capacity", self.command_queue_capacity),
            ("reply_queue_capacity", self.reply_queue_capacity),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigError::new(format!("{name} must be > 0"))),
            None => Ok(()),
        }
    }

    /// Parses and validates a YAML document. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("invalid agent config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

/// Fluent construction of a [`KeyAgent`].
///
/// The credential verifier defaults to the agent's own
/// [`CredentialStore`](crate::credentials::CredentialStore) and the codec to
/// [`JsonCodec`]. The envelope cipher has no default and is passed to
/// [`build`](Self::build).
///
/// ```rust,ignore
/// let agent = AgentBuilder::new()
///     .max_applications(8)
///     .command_queue_capacity(32)
///     .build(MyCipher::new(service_public_key, agent_private_key))?;
/// ```
pub struct AgentBuilder {
    config: AgentConfig,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    codec: Box<dyn MessageCodec>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::from_config(AgentConfig::default())
    }

    pub fn from_config(config: AgentConfig) -> Self {
        Self {
            config,
            verifier: None,
            codec: Box::new(JsonCodec),
        }
    }

    pub fn max_applications(mut self, max_applications: usize) -> Self {
        self.config.max_applications = max_applications;
        self
    }

    pub fn max_keys_per_application(mut self, max_keys: usize) -> Self {
        self.config.max_keys_per_application = max_keys;
        self
    }

    pub fn command_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.command_queue_capacity = capacity;
        self
    }

    pub fn reply_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.reply_queue_capacity = capacity;
        self
    }

    /// Replaces the credential gate used by `clear_application_cache`.
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn codec(mut self, codec: impl MessageCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Validates the configuration and allocates every structure up front.
    pub fn build(self, cipher: impl EnvelopeCipher + 'static) -> Result<KeyAgent, ConfigError> {
        self.config.validate()?;
        Ok(KeyAgent::from_parts(
            self.config,
            self.verifier,
            self.codec,
            Box::new(cipher),
        ))
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AgentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBuilder")
            .field("config", &self.config)
            .field("custom_verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AgentConfig::default().validate().is_ok());
    }

    #[test]
    fn each_zero_capacity_is_named() {
        let cases = [
            (
                AgentConfig {
                    max_applications: 0,
                    ..AgentConfig::default()
                },
                "max_applications",
            ),
            (
                AgentConfig {
                    max_keys_per_application: 0,
                    ..AgentConfig::default()
                },
                "max_keys_per_application",
            ),
            (
                AgentConfig {
                    command_queue_capacity: 0,
                    ..AgentConfig::default()
                },
                "command_queue_capacity",
            ),
            (
                AgentConfig {
                    reply_queue_capacity: 0,
                    ..AgentConfig::default()
                },
                "reply_queue_capacity",
            ),
        ];
        for (config, field) in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.message(), format!("{field} must be > 0"));
        }
    }

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = AgentConfig::from_yaml_str("reply_queue_capacity: 3\n").unwrap();
        assert_eq!(config.reply_queue_capacity, 3);
        assert_eq!(config.max_applications, DEFAULT_MAX_APPLICATIONS);
    }

    #[test]
    fn yaml_rejects_unknown_fields_and_zero_capacities() {
        assert!(AgentConfig::from_yaml_str("max_apps: 3\n").is_err());
        let err = AgentConfig::from_yaml_str("max_keys_per_application: 0\n").unwrap_err();
        assert!(err.message().contains("max_keys_per_application"));
    }

    #[test]
    fn builder_overrides_config_fields() {
        let builder = AgentBuilder::new()
            .max_applications(2)
            .max_keys_per_application(3)
            .command_queue_capacity(4)
            .reply_queue_capacity(5);
        assert_eq!(
            *builder.config(),
            AgentConfig {
                max_applications: 2,
                max_keys_per_application: 3,
                command_queue_capacity: 4,
                reply_queue_capacity: 5,
            }
        );
    }
}
