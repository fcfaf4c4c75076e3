//! # Key Agent
//!
//! Ties the [`KeyCache`] to the two bounded queues and to the external
//! collaborators. Every entry point is synchronous and bounded; a key that is
//! not cached is resolved in two phases instead of by blocking.
//!
//! ## Architecture
//!
//! ```text
//!   caller                       KeyAgent                          transport
//!   ──────                       ────────                          ─────────
//!                    ┌──────────────────────────────────┐
//!   resolve ───────► │ Mutex<KeyCache>                  │
//!      │  miss       │                                  │
//!      └───────────► │ Mutex<Channel<CommandNode>> ─────┼──► next_request
//!   generate_key ──► │   (FIFO, bounded)                │     encode + seal
//!   destroy_key ───► │                                  │
//!                    │ Mutex<Channel<ReplyNode>>   ◄────┼─── accept_response
//!   drain_reply ◄─── │   (FIFO, bounded)                │     open + decode
//!      │             │                                  │
//!      └─ apply ───► │ KeyCache / CredentialStore       │
//!                    └──────────────────────────────────┘
//! ```
//!
//! ## Resolution Flow
//!
//! ```text
//!   resolve(app, key)
//!     ├─ hit   → Resolution::Resolved(value)        (both levels promoted)
//!     └─ miss  → enqueue Search → Resolution::Pending
//!                                  └─ QueueFull when the command queue is full
//!
//!   drain_reply()
//!     ├─ Key     → insert into cache          → ReplyState::Resolved
//!     ├─ Info    → register credentials       → ReplyState::Resolved
//!     ├─ Done    → local removal for Delete/Destroy
//!     └─ Failed  → ReplyState::Failed { code, message }
//! ```
//!
//! ## Locking
//!
//! The cache and each queue sit behind their own `parking_lot::Mutex`. No
//! operation holds two of them at once. The credential store is only taken
//! while the cache lock is held (or alone), which keeps registered
//! credentials in step with the applications the cache holds.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::{InsertOutcome, KeyCache};
use crate::codec::MessageCodec;
use crate::config::{AgentBuilder, AgentConfig};
use crate::credentials::{CredentialStore, CredentialVerifier};
use crate::crypto::{Envelope, EnvelopeCipher};
use crate::ds::CircularQueue;
use crate::error::{InvariantError, KeyAgentError, QueueKind, Result};
use crate::protocol::{CommandNode, OperationKind, ReplyNode, ReplyOutcome, ReplyState, Resolution};
use crate::types::Identifier;

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::QueueMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::{AgentMetricsSnapshot, QueueMetricsSnapshot};
#[cfg(feature = "metrics")]
use crate::metrics::traits::{MetricsSnapshotProvider, QueueMetricsRecorder};

/// One bounded queue plus its counters.
#[derive(Debug)]
struct Channel<T> {
    kind: QueueKind,
    queue: CircularQueue<T>,
    #[cfg(feature = "metrics")]
    metrics: QueueMetrics,
}

impl<T> Channel<T> {
    fn new(kind: QueueKind, capacity: usize) -> Self {
        Self {
            kind,
            queue: CircularQueue::new(capacity),
            #[cfg(feature = "metrics")]
            metrics: QueueMetrics::default(),
        }
    }

    fn push(&mut self, item: T) -> Result<()> {
        match self.queue.enqueue(item) {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_enqueue();
                Ok(())
            },
            Err(_rejected) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_enqueue_rejected();
                tracing::warn!(
                    queue = %self.kind,
                    capacity = self.queue.capacity(),
                    "queue full, item rejected"
                );
                Err(KeyAgentError::QueueFull { queue: self.kind })
            },
        }
    }

    fn pop(&mut self) -> Result<T> {
        match self.queue.dequeue() {
            Some(item) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_dequeue();
                Ok(item)
            },
            None => {
                #[cfg(feature = "metrics")]
                self.metrics.record_dequeue_empty();
                Err(KeyAgentError::QueueEmpty { queue: self.kind })
            },
        }
    }

    #[cfg(feature = "metrics")]
    fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            enqueued: self.metrics.enqueued,
            rejected: self.metrics.rejected,
            dequeued: self.metrics.dequeued,
            empty_polls: self.metrics.empty_polls,
            len: self.queue.len(),
            capacity: self.queue.capacity(),
        }
    }
}

/// The key agent: cache, queues and collaborators.
///
/// Build one with [`AgentBuilder`] (or [`KeyAgent::builder`]). The agent is
/// `Send + Sync`; share it by reference or through [`crate::global`].
pub struct KeyAgent {
    config: AgentConfig,
    cache: Mutex<KeyCache>,
    commands: Mutex<Channel<CommandNode>>,
    replies: Mutex<Channel<ReplyNode>>,
    credentials: Arc<CredentialStore>,
    verifier: Arc<dyn CredentialVerifier>,
    codec: Box<dyn MessageCodec>,
    cipher: Box<dyn EnvelopeCipher>,
}

impl KeyAgent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub(crate) fn from_parts(
        config: AgentConfig,
        verifier: Option<Arc<dyn CredentialVerifier>>,
        codec: Box<dyn MessageCodec>,
        cipher: Box<dyn EnvelopeCipher>,
    ) -> Self {
        let credentials = Arc::new(CredentialStore::new());
        let verifier = verifier.unwrap_or_else(|| credentials.clone() as Arc<dyn CredentialVerifier>);
        Self {
            cache: Mutex::new(KeyCache::new(
                config.max_applications,
                config.max_keys_per_application,
            )),
            commands: Mutex::new(Channel::new(QueueKind::Command, config.command_queue_capacity)),
            replies: Mutex::new(Channel::new(QueueKind::Reply, config.reply_queue_capacity)),
            config,
            credentials,
            verifier,
            codec,
            cipher,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Credentials registered by `SaveInfo` replies.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // ---------------------------------------------------------------------
    // Caller-facing operations
    // ---------------------------------------------------------------------

    /// Returns the cached key, or queues a `Search` command for it.
    ///
    /// On [`Resolution::Pending`] the caller drains replies (see
    /// [`drain_reply`](Self::drain_reply)) and resolves again. A full
    /// command queue is reported as [`KeyAgentError::QueueFull`], never as a
    /// miss.
    pub fn resolve(&self, application: &Identifier, key: &Identifier) -> Result<Resolution> {
        if let Some(value) = self.cache.lock().lookup(application, key) {
            tracing::debug!(application = %application, key = %key, "key cache hit");
            return Ok(Resolution::Resolved(value.clone()));
        }

        tracing::debug!(application = %application, key = %key, "key cache miss, requesting key");
        self.enqueue_command(CommandNode::new(*application, *key, OperationKind::Search))?;
        Ok(Resolution::Pending)
    }

    /// Asks the key-control service to create a key. The new key arrives as
    /// a reply.
    pub fn generate_key(
        &self,
        application: &Identifier,
        key: &Identifier,
        payload: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let command = CommandNode::new(*application, *key, OperationKind::Generate).with_payload(payload);
        self.enqueue_command(command)
    }

    /// Drops a cached key locally. The service keeps it.
    pub fn delete_key(&self, application: &Identifier, key: &Identifier) -> Result<()> {
        self.cache.lock().remove_key(application, key)?;
        tracing::debug!(application = %application, key = %key, "deleted cached key");
        Ok(())
    }

    /// Asks the service to destroy a key and drops the local copy.
    ///
    /// The local copy is only removed once the `Destroy` command was
    /// accepted, so a `QueueFull` leaves the cache untouched. A key that is
    /// not cached locally is not an error.
    pub fn destroy_key(&self, application: &Identifier, key: &Identifier) -> Result<()> {
        self.enqueue_command(CommandNode::new(*application, *key, OperationKind::Destroy))?;
        let removed = self.cache.lock().remove_key(application, key).is_ok();
        tracing::debug!(
            application = %application,
            key = %key,
            cached = removed,
            "destroy requested"
        );
        Ok(())
    }

    /// Drops one application and all of its keys after checking the caller's
    /// credentials. Returns how many keys were dropped.
    pub fn clear_application_cache(
        &self,
        application: &Identifier,
        account: &str,
        password: &str,
    ) -> Result<usize> {
        if !self.verifier.verify(application, account, password) {
            tracing::warn!(application = %application, "credential check failed, cache not cleared");
            return Err(KeyAgentError::AccessDenied {
                application: *application,
            });
        }
        let keys = {
            let mut cache = self.cache.lock();
            let keys = cache.remove_application(application)?;
            self.credentials.forget(application);
            keys
        };
        tracing::debug!(application = %application, keys, "cleared application cache");
        Ok(keys)
    }

    /// Dequeues the oldest reply and folds it into the cache.
    ///
    /// Returns the reply together with the state its request reached.
    /// [`KeyAgentError::QueueEmpty`] when nothing is waiting.
    pub fn drain_reply(&self) -> Result<(ReplyNode, ReplyState)> {
        let reply = self.replies.lock().pop()?;
        let state = self.apply_reply(&reply)?;
        Ok((reply, state))
    }

    /// Drains every waiting reply. Stops at the first error.
    pub fn drain_replies(&self) -> Result<Vec<(ReplyNode, ReplyState)>> {
        let mut applied = Vec::new();
        loop {
            match self.drain_reply() {
                Ok(entry) => applied.push(entry),
                Err(KeyAgentError::QueueEmpty { .. }) => return Ok(applied),
                Err(err) => return Err(err),
            }
        }
    }

    fn apply_reply(&self, reply: &ReplyNode) -> Result<ReplyState> {
        let application = reply.application_id;
        let key = reply.key_id;
        match &reply.outcome {
            ReplyOutcome::Key { value } => {
                let mut cache = self.cache.lock();
                let outcome = cache.insert(application, key, value.clone())?;
                if let InsertOutcome::EvictedApplication { application: evicted, keys } = outcome {
                    self.credentials.forget(&evicted);
                    drop(cache);
                    tracing::debug!(
                        application = %application,
                        evicted = %evicted,
                        keys,
                        "key reply displaced an application"
                    );
                }
                tracing::debug!(application = %application, key = %key, kind = ?reply.kind, "key reply applied");
                Ok(ReplyState::Resolved)
            },
            ReplyOutcome::Info { info } => {
                let cache = self.cache.lock();
                if cache.contains_application(&application) {
                    self.credentials
                        .register(application, &info.account, &info.password);
                } else {
                    drop(cache);
                    tracing::warn!(
                        application = %application,
                        "credentials for an uncached application dropped"
                    );
                }
                Ok(ReplyState::Resolved)
            },
            ReplyOutcome::Done => {
                if matches!(reply.kind, OperationKind::Delete | OperationKind::Destroy) {
                    let removed = self.cache.lock().remove_key(&application, &key).is_ok();
                    tracing::debug!(
                        application = %application,
                        key = %key,
                        removed,
                        "service acknowledged removal"
                    );
                }
                Ok(ReplyState::Resolved)
            },
            ReplyOutcome::Failed { code, message } => {
                tracing::warn!(
                    application = %application,
                    key = %key,
                    kind = ?reply.kind,
                    code,
                    message = %message,
                    "key service reported failure"
                );
                Ok(ReplyState::Failed {
                    code: *code,
                    message: message.clone(),
                })
            },
        }
    }

    // ---------------------------------------------------------------------
    // Transport-facing operations
    // ---------------------------------------------------------------------

    /// Encodes and seals the oldest queued command.
    ///
    /// `Ok(None)` when the command queue is empty. A command whose encoding
    /// or sealing fails stays at the head of the queue.
    pub fn next_request(&self) -> Result<Option<Envelope>> {
        let mut commands = self.commands.lock();
        let Some(command) = commands.queue.peek() else {
            return Ok(None);
        };
        let bytes = self.codec.encode_command(command)?;
        let envelope = self.cipher.seal(&bytes)?;
        let command = commands.pop()?;
        tracing::debug!(
            application = %command.application_id,
            key = %command.key_id,
            kind = ?command.kind,
            "command handed to transport"
        );
        Ok(Some(envelope))
    }

    /// Dequeues the oldest command without encoding it.
    pub fn take_command(&self) -> Result<CommandNode> {
        self.commands.lock().pop()
    }

    /// Opens and decodes a response envelope and queues the reply.
    pub fn accept_response(&self, envelope: &Envelope) -> Result<()> {
        let bytes = self.cipher.open(envelope)?;
        let reply = self.codec.decode_reply(&bytes)?;
        self.submit_reply(reply)
    }

    /// Queues an already decoded reply.
    pub fn submit_reply(&self, reply: ReplyNode) -> Result<()> {
        let (application, key, kind) = (reply.application_id, reply.key_id, reply.kind);
        self.replies.lock().push(reply)?;
        tracing::debug!(application = %application, key = %key, kind = ?kind, "reply queued");
        Ok(())
    }

    fn enqueue_command(&self, command: CommandNode) -> Result<()> {
        let (application, key, kind) = (command.application_id, command.key_id, command.kind);
        self.commands.lock().push(command)?;
        tracing::debug!(application = %application, key = %key, kind = ?kind, "command queued");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Inspection / lifecycle
    // ---------------------------------------------------------------------

    /// Runs `f` against the cache without changing recency.
    pub fn inspect<R>(&self, f: impl FnOnce(&KeyCache) -> R) -> R {
        f(&self.cache.lock())
    }

    pub fn contains_key(&self, application: &Identifier, key: &Identifier) -> bool {
        self.cache.lock().contains(application, key)
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.lock().queue.len()
    }

    pub fn pending_replies(&self) -> usize {
        self.replies.lock().queue.len()
    }

    /// Drops cached keys, queued messages and registered credentials.
    pub fn reset(&self) {
        self.cache.lock().clear();
        self.commands.lock().queue.clear();
        self.replies.lock().queue.clear();
        self.credentials.clear();
        tracing::debug!("key agent reset");
    }

    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        self.cache.lock().check_invariants().map_err(|err| {
            tracing::error!(error = %err, "key cache invariant violated");
            err
        })
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<AgentMetricsSnapshot> for KeyAgent {
    fn snapshot(&self) -> AgentMetricsSnapshot {
        AgentMetricsSnapshot {
            cache: self.cache.lock().snapshot(),
            commands: self.commands.lock().snapshot(),
            replies: self.replies.lock().snapshot(),
        }
    }
}

impl std::fmt::Debug for KeyAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let applications = self.cache.lock().len();
        f.debug_struct("KeyAgent")
            .field("config", &self.config)
            .field("applications", &applications)
            .field("pending_commands", &self.pending_commands())
            .field("pending_replies", &self.pending_replies())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AccountInfo;
    use crate::types::KeyValue;

    struct XorCipher(u8);

    impl EnvelopeCipher for XorCipher {
        fn seal(&self, plaintext: &[u8]) -> Result<Envelope> {
            Ok(Envelope {
                wrapped_key: vec![self.0],
                ciphertext: plaintext.iter().map(|b| b ^ self.0).collect(),
            })
        }

        fn open(&self, envelope: &Envelope) -> Result<Vec<u8>> {
            if envelope.wrapped_key != [self.0] {
                return Err(KeyAgentError::crypto("wrong recipient"));
            }
            Ok(envelope.ciphertext.iter().map(|b| b ^ self.0).collect())
        }
    }

    struct FailingCipher;

    impl EnvelopeCipher for FailingCipher {
        fn seal(&self, _plaintext: &[u8]) -> Result<Envelope> {
            Err(KeyAgentError::crypto("no service key"))
        }

        fn open(&self, _envelope: &Envelope) -> Result<Vec<u8>> {
            Err(KeyAgentError::crypto("no agent key"))
        }
    }

    struct AllowAll;

    impl CredentialVerifier for AllowAll {
        fn verify(&self, _: &Identifier, _: &str, _: &str) -> bool {
            true
        }
    }

    fn id(n: u128) -> Identifier {
        Identifier::from_u128(n)
    }

    fn val(bytes: &[u8]) -> KeyValue {
        KeyValue::from_slice(bytes).unwrap()
    }

    fn agent(apps: usize, keys: usize, queue: usize) -> KeyAgent {
        AgentBuilder::new()
            .max_applications(apps)
            .max_keys_per_application(keys)
            .command_queue_capacity(queue)
            .reply_queue_capacity(queue)
            .build(XorCipher(0x5a))
            .unwrap()
    }

    fn seed(agent: &KeyAgent, app: u128, key: u128, value: &[u8]) {
        agent
            .submit_reply(ReplyNode::key(id(app), id(key), OperationKind::Search, val(value)))
            .unwrap();
        agent.drain_reply().unwrap();
    }

    // ==============================================
    // Resolution
    // ==============================================

    #[test]
    fn miss_queues_search_then_reply_resolves() {
        let agent = agent(2, 2, 4);
        assert_eq!(agent.resolve(&id(1), &id(10)).unwrap(), Resolution::Pending);

        let cmd = agent.take_command().unwrap();
        assert_eq!(cmd.kind, OperationKind::Search);
        assert_eq!((cmd.application_id, cmd.key_id), (id(1), id(10)));

        agent
            .submit_reply(ReplyNode::key(id(1), id(10), OperationKind::Search, val(b"secret")))
            .unwrap();
        let (reply, state) = agent.drain_reply().unwrap();
        assert!(reply.answers(&cmd));
        assert_eq!(state, ReplyState::Resolved);

        assert_eq!(
            agent.resolve(&id(1), &id(10)).unwrap(),
            Resolution::Resolved(val(b"secret"))
        );
        assert_eq!(agent.pending_commands(), 0);
    }

    #[test]
    fn full_command_queue_is_distinct_from_a_miss() {
        let agent = agent(2, 2, 1);
        assert_eq!(agent.resolve(&id(1), &id(1)).unwrap(), Resolution::Pending);
        let err = agent.resolve(&id(1), &id(2)).unwrap_err();
        assert_eq!(
            err,
            KeyAgentError::QueueFull {
                queue: QueueKind::Command
            }
        );
        assert_eq!(agent.pending_commands(), 1);
    }

    #[test]
    fn hit_queues_nothing() {
        let agent = agent(2, 2, 2);
        seed(&agent, 1, 1, b"a");
        assert!(matches!(agent.resolve(&id(1), &id(1)).unwrap(), Resolution::Resolved(_)));
        assert_eq!(agent.pending_commands(), 0);
    }

    #[test]
    fn failed_reply_leaves_cache_untouched() {
        let agent = agent(2, 2, 2);
        agent
            .submit_reply(ReplyNode::failed(id(1), id(1), OperationKind::Search, 8, "no such key"))
            .unwrap();
        let (reply, state) = agent.drain_reply().unwrap();
        assert_eq!(
            state,
            ReplyState::Failed {
                code: 8,
                message: "no such key".into()
            }
        );
        assert!(state.into_result(&reply).is_err());
        assert!(!agent.contains_key(&id(1), &id(1)));
    }

    #[test]
    fn empty_reply_queue_is_reported() {
        let agent = agent(1, 1, 1);
        assert_eq!(
            agent.drain_reply().unwrap_err(),
            KeyAgentError::QueueEmpty {
                queue: QueueKind::Reply
            }
        );
        assert!(agent.drain_replies().unwrap().is_empty());
    }

    #[test]
    fn full_reply_queue_rejects_submission() {
        let agent = agent(1, 1, 1);
        let reply = ReplyNode::key(id(1), id(1), OperationKind::Search, val(b"x"));
        agent.submit_reply(reply.clone()).unwrap();
        assert_eq!(
            agent.submit_reply(reply).unwrap_err(),
            KeyAgentError::QueueFull {
                queue: QueueKind::Reply
            }
        );
    }

    // ==============================================
    // Management operations
    // ==============================================

    #[test]
    fn generate_key_relays_payload() {
        let agent = agent(1, 1, 2);
        agent.generate_key(&id(3), &id(4), b"params".to_vec()).unwrap();
        let cmd = agent.take_command().unwrap();
        assert_eq!(cmd.kind, OperationKind::Generate);
        assert_eq!(cmd.payload, b"params");
    }

    #[test]
    fn delete_key_is_local_and_reports_absence() {
        let agent = agent(2, 2, 2);
        seed(&agent, 1, 1, b"a");
        agent.delete_key(&id(1), &id(1)).unwrap();
        assert!(!agent.contains_key(&id(1), &id(1)));
        assert_eq!(
            agent.delete_key(&id(1), &id(1)).unwrap_err(),
            KeyAgentError::NotFound {
                application: id(1),
                key: Some(id(1))
            }
        );
        assert_eq!(agent.pending_commands(), 0);
    }

    #[test]
    fn destroy_key_queues_command_and_drops_local_copy() {
        let agent = agent(2, 2, 2);
        seed(&agent, 1, 1, b"a");
        agent.destroy_key(&id(1), &id(1)).unwrap();
        assert!(!agent.contains_key(&id(1), &id(1)));
        assert_eq!(agent.take_command().unwrap().kind, OperationKind::Destroy);

        // not cached is fine
        agent.destroy_key(&id(9), &id(9)).unwrap();
    }

    #[test]
    fn rejected_destroy_keeps_local_copy() {
        let agent = agent(2, 2, 1);
        seed(&agent, 1, 1, b"a");
        agent.generate_key(&id(2), &id(2), Vec::new()).unwrap();
        assert!(agent.destroy_key(&id(1), &id(1)).is_err());
        assert!(agent.contains_key(&id(1), &id(1)));
    }

    #[test]
    fn done_reply_removes_key_for_destroy_only() {
        let agent = agent(2, 2, 4);
        seed(&agent, 1, 1, b"a");
        seed(&agent, 1, 2, b"b");
        let done = |key, kind| ReplyNode {
            application_id: id(1),
            key_id: id(key),
            kind,
            outcome: ReplyOutcome::Done,
        };
        agent.submit_reply(done(1, OperationKind::Clear)).unwrap();
        agent.submit_reply(done(2, OperationKind::Destroy)).unwrap();
        let applied = agent.drain_replies().unwrap();
        assert_eq!(applied.len(), 2);
        assert!(agent.contains_key(&id(1), &id(1)));
        assert!(!agent.contains_key(&id(1), &id(2)));
    }

    #[test]
    fn clear_requires_registered_credentials() {
        let agent = agent(2, 4, 4);
        seed(&agent, 1, 1, b"a");
        seed(&agent, 1, 2, b"b");

        assert_eq!(
            agent.clear_application_cache(&id(1), "acct", "pw").unwrap_err(),
            KeyAgentError::AccessDenied { application: id(1) }
        );

        agent.submit_reply(save_info(1, "acct", "pw")).unwrap();
        agent.drain_reply().unwrap();

        assert_eq!(agent.clear_application_cache(&id(1), "acct", "pw").unwrap(), 2);
        assert!(agent.inspect(|cache| cache.is_empty()));
        assert_eq!(
            agent.clear_application_cache(&id(1), "acct", "pw").unwrap_err(),
            KeyAgentError::NotFound {
                application: id(1),
                key: None
            }
        );
    }

    fn save_info(app: u128, account: &str, password: &str) -> ReplyNode {
        ReplyNode {
            application_id: id(app),
            key_id: Identifier::NIL,
            kind: OperationKind::SaveInfo,
            outcome: ReplyOutcome::Info {
                info: AccountInfo {
                    account: account.into(),
                    password: password.into(),
                },
            },
        }
    }

    #[test]
    fn credentials_stay_bounded_by_cached_applications() {
        let agent = agent(2, 1, 4);
        for app in 0..1000u128 {
            seed(&agent, app, 1, b"k");
            agent.submit_reply(save_info(app, "acct", "pw")).unwrap();
            agent.drain_reply().unwrap();
            assert!(agent.credentials().len() <= agent.config().max_applications);
        }
        assert_eq!(agent.credentials().len(), 2);
        assert!(agent.credentials().is_registered(&id(999)));
        assert!(agent.credentials().is_registered(&id(998)));
        assert!(!agent.credentials().is_registered(&id(997)));
    }

    #[test]
    fn info_for_uncached_application_is_dropped() {
        let agent = agent(2, 2, 4);
        for app in 0..100u128 {
            agent.submit_reply(save_info(app, "acct", "pw")).unwrap();
            let (_, state) = agent.drain_reply().unwrap();
            assert_eq!(state, ReplyState::Resolved);
        }
        assert!(agent.credentials().is_empty());
    }

    #[test]
    fn clearing_an_application_forgets_its_credentials() {
        let agent = agent(2, 2, 4);
        seed(&agent, 1, 1, b"a");
        agent.submit_reply(save_info(1, "acct", "pw")).unwrap();
        agent.drain_reply().unwrap();

        agent.clear_application_cache(&id(1), "acct", "pw").unwrap();
        assert!(!agent.credentials().is_registered(&id(1)));

        // re-caching the application does not bring the old credentials back
        seed(&agent, 1, 1, b"a");
        assert_eq!(
            agent.clear_application_cache(&id(1), "acct", "pw").unwrap_err(),
            KeyAgentError::AccessDenied { application: id(1) }
        );
    }

    #[test]
    fn debug_output_does_not_deadlock() {
        let agent = agent(2, 2, 2);
        seed(&agent, 1, 1, b"a");
        let rendered = format!("{agent:?}");
        assert!(rendered.contains("applications: 1"));
    }

    #[test]
    fn custom_verifier_replaces_credential_store() {
        let agent = AgentBuilder::new()
            .verifier(Arc::new(AllowAll))
            .build(XorCipher(1))
            .unwrap();
        seed(&agent, 5, 5, b"k");
        assert_eq!(agent.clear_application_cache(&id(5), "", "").unwrap(), 1);
    }

    // ==============================================
    // Transport
    // ==============================================

    #[test]
    fn request_and_response_cross_the_envelope() {
        let agent = agent(2, 2, 2);
        assert!(agent.next_request().unwrap().is_none());

        agent.resolve(&id(1), &id(2)).unwrap();
        let envelope = agent.next_request().unwrap().unwrap();
        assert_eq!(agent.pending_commands(), 0);

        let plain = XorCipher(0x5a).open(&envelope).unwrap();
        let cmd: CommandNode = serde_json::from_slice(&plain).unwrap();
        assert_eq!(cmd.kind, OperationKind::Search);

        let reply = ReplyNode::key(id(1), id(2), OperationKind::Search, val(b"v"));
        let response = XorCipher(0x5a)
            .seal(&serde_json::to_vec(&reply).unwrap())
            .unwrap();
        agent.accept_response(&response).unwrap();
        agent.drain_reply().unwrap();
        assert_eq!(
            agent.resolve(&id(1), &id(2)).unwrap(),
            Resolution::Resolved(val(b"v"))
        );
    }

    #[test]
    fn seal_failure_keeps_command_queued() {
        let agent = AgentBuilder::new().build(FailingCipher).unwrap();
        agent.resolve(&id(1), &id(1)).unwrap();
        assert!(matches!(
            agent.next_request().unwrap_err(),
            KeyAgentError::CryptoFailure { .. }
        ));
        assert_eq!(agent.pending_commands(), 1);
    }

    #[test]
    fn response_for_another_recipient_is_rejected() {
        let agent = agent(1, 1, 1);
        let envelope = XorCipher(0x11).seal(b"{}").unwrap();
        assert!(matches!(
            agent.accept_response(&envelope).unwrap_err(),
            KeyAgentError::CryptoFailure { .. }
        ));
        assert_eq!(agent.pending_replies(), 0);
    }

    #[test]
    fn undecodable_response_is_a_serialization_failure() {
        let agent = agent(1, 1, 1);
        let envelope = XorCipher(0x5a).seal(b"not json").unwrap();
        assert!(matches!(
            agent.accept_response(&envelope).unwrap_err(),
            KeyAgentError::SerializationFailure { .. }
        ));
    }

    #[test]
    fn reset_drops_everything() {
        let agent = agent(2, 2, 2);
        seed(&agent, 1, 1, b"a");
        agent.resolve(&id(2), &id(2)).unwrap();
        agent.credentials().register(id(1), "a", "b");
        agent.reset();
        assert!(agent.inspect(|cache| cache.is_empty()));
        assert_eq!(agent.pending_commands(), 0);
        assert!(agent.credentials().is_empty());
        assert!(agent.check_invariants().is_ok());
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn snapshot_counts_queue_traffic() {
        let agent = agent(1, 1, 1);
        agent.resolve(&id(1), &id(1)).unwrap();
        let _ = agent.resolve(&id(1), &id(2));
        let _ = agent.drain_reply();
        let snapshot = agent.snapshot();
        assert_eq!(snapshot.commands.enqueued, 1);
        assert_eq!(snapshot.commands.rejected, 1);
        assert_eq!(snapshot.commands.len, 1);
        assert_eq!(snapshot.replies.empty_polls, 1);
        assert_eq!(snapshot.cache.lookup_misses, 2);
    }
}
