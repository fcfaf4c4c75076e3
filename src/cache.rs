//! # Two-Level LRU Key Cache
//!
//! Holds key material per application. Both levels are recency chains over
//! fixed slot arrays: the cache orders applications, and each application
//! orders its own keys.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ KeyCache                                                             │
//!   │                                                                      │
//!   │   applications: RecencyList<ApplicationSlot>   (max_applications)    │
//!   │                                                                      │
//!   │   head ─► [app A] ──────► [app C] ──────► [app B] ◄── tail           │
//!   │             │               │               │                        │
//!   │             ▼               ▼               ▼                        │
//!   │   keys:  [k1]─►[k3]      [k7]          [k2]─►[k5]─►[k4]              │
//!   │          MRU   LRU                     MRU         LRU               │
//!   │                                                                      │
//!   │   each ApplicationSlot owns RecencyList<KeySlot> (max_keys_per_app)  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations Flow
//!
//! ```text
//!   lookup(B, k5)  hit
//!   ═══════════════════════════════════════════════════════════════════════
//!     apps:  [A] ─► [C] ─► [B]        →   [B] ─► [A] ─► [C]
//!     B.keys: [k2] ─► [k5] ─► [k4]    →   [k5] ─► [k2] ─► [k4]
//!
//!   insert(D, k9)  application level full
//!   ═══════════════════════════════════════════════════════════════════════
//!     1. pop tail application (C) together with all of its keys
//!     2. reuse its slot for D, linked at head, holding only k9
//!
//!   insert(B, k8)  B's key level full
//!   ═══════════════════════════════════════════════════════════════════════
//!     1. promote B to head
//!     2. pop B's tail key (k4), reuse its slot for k8 at B's head
//! ```
//!
//! ## Notes
//! - Identifiers are unique per level. Inserting an id that is already
//!   present overwrites the value and promotes instead of linking a twin.
//! - A lookup that finds the application but not the key is a plain miss and
//!   does not touch recency at either level.
//! - Adding a key to an application that is already cached never evicts
//!   another application; it only evicts within that application.
//! - Every scan is bounded by the configured capacities.

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::KeyCacheMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::KeyCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{KeyCacheMetricsRecorder, MetricsSnapshotProvider};

use crate::ds::RecencyList;
use crate::error::{ConfigError, InvariantError, KeyAgentError, Result};
use crate::types::{Identifier, KeyValue};

/// One cached key.
#[derive(Debug)]
pub struct KeySlot {
    id: Identifier,
    value: KeyValue,
}

impl KeySlot {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }
}

/// One application's key collection.
#[derive(Debug)]
pub struct ApplicationSlot {
    id: Identifier,
    keys: RecencyList<KeySlot>,
}

impl ApplicationSlot {
    fn new(id: Identifier, key_capacity: usize) -> Self {
        Self {
            id,
            keys: RecencyList::with_capacity(key_capacity),
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Key ids from most to least recently used.
    pub fn key_ids(&self) -> impl Iterator<Item = &Identifier> {
        self.keys.iter().map(|slot| &slot.id)
    }

    fn insert_key(&mut self, key: Identifier, value: KeyValue) -> Result<InsertOutcome> {
        if let Some(at) = self.keys.find(|slot| slot.id.matches(&key)) {
            self.keys.promote(at);
            if let Some(slot) = self.keys.front_mut() {
                slot.value = value;
            }
            return Ok(InsertOutcome::Updated);
        }

        let mut outcome = InsertOutcome::Inserted;
        if self.keys.is_full() {
            let evicted = self
                .keys
                .pop_back()
                .ok_or(KeyAgentError::CapacityExhausted("key level full without a tail"))?;
            tracing::debug!(
                application = %self.id,
                key = %evicted.id,
                "evicted least-recently-used key"
            );
            outcome = InsertOutcome::EvictedKey { key: evicted.id };
        }

        self.keys
            .push_front(KeySlot { id: key, value })
            .map_err(|_| KeyAgentError::CapacityExhausted("no free key slot after eviction"))?;
        Ok(outcome)
    }
}

/// What `insert` had to do to make room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Linked into a free slot.
    Inserted,
    /// Identifier was present; value overwritten and promoted.
    Updated,
    /// The application's least-recently-used key was dropped.
    EvictedKey { key: Identifier },
    /// The least-recently-used application was dropped with all its keys.
    EvictedApplication {
        application: Identifier,
        keys: usize,
    },
}

/// Application → key LRU cache with fixed capacity at both levels.
#[derive(Debug)]
pub struct KeyCache {
    applications: RecencyList<ApplicationSlot>,
    keys_per_application: usize,
    #[cfg(feature = "metrics")]
    metrics: KeyCacheMetrics,
}

impl KeyCache {
    /// Creates an empty cache.
    ///
    /// A zero capacity at either level yields a cache whose inserts fail with
    /// [`KeyAgentError::CapacityExhausted`]; use [`KeyCache::try_new`] to
    /// reject such parameters up front.
    ///
    /// # Example
    /// ```
    /// use keyagent::cache::KeyCache;
    ///
    /// let cache = KeyCache::new(16, 8);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(max_applications: usize, max_keys_per_application: usize) -> Self {
        Self {
            applications: RecencyList::with_capacity(max_applications),
            keys_per_application: max_keys_per_application,
            #[cfg(feature = "metrics")]
            metrics: KeyCacheMetrics::default(),
        }
    }

    /// Creates an empty cache, rejecting zero capacities.
    pub fn try_new(
        max_applications: usize,
        max_keys_per_application: usize,
    ) -> std::result::Result<Self, ConfigError> {
        if max_applications == 0 {
            return Err(ConfigError::new("max_applications must be > 0"));
        }
        if max_keys_per_application == 0 {
            return Err(ConfigError::new("max_keys_per_application must be > 0"));
        }
        Ok(Self::new(max_applications, max_keys_per_application))
    }

    /// Number of cached applications.
    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn application_capacity(&self) -> usize {
        self.applications.capacity()
    }

    pub fn key_capacity(&self) -> usize {
        self.keys_per_application
    }

    /// Number of keys cached across all applications.
    pub fn total_keys(&self) -> usize {
        self.applications.iter().map(ApplicationSlot::key_count).sum()
    }

    /// Returns the key and promotes it, and its application, to most recently used.
    ///
    /// An unknown application and an unknown key are the same miss.
    pub fn lookup(&mut self, application: &Identifier, key: &Identifier) -> Option<&KeyValue> {
        if !self.promote(application, key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_lookup_miss();
            return None;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_lookup_hit();

        self.applications
            .front()
            .and_then(|app| app.keys.front())
            .map(|slot| &slot.value)
    }

    /// Returns the key without changing recency.
    pub fn peek(&self, application: &Identifier, key: &Identifier) -> Option<&KeyValue> {
        self.application(application)?
            .keys
            .iter()
            .find(|slot| slot.id.matches(key))
            .map(|slot| &slot.value)
    }

    /// Moves the application to the global head and the key to the
    /// application's head. Returns `false` (and changes nothing) unless both
    /// are present.
    pub fn promote(&mut self, application: &Identifier, key: &Identifier) -> bool {
        let Some(app_at) = self.applications.find(|app| app.id.matches(application)) else {
            return false;
        };
        let Some(key_at) = self
            .applications
            .get(app_at.id)
            .and_then(|app| app.keys.find(|slot| slot.id.matches(key)))
        else {
            return false;
        };

        self.applications.promote(app_at);
        match self.applications.get_mut(app_at.id) {
            Some(app) => app.keys.promote(key_at),
            None => false,
        }
    }

    /// Inserts or overwrites a key; the entry becomes most recently used at
    /// both levels.
    pub fn insert(
        &mut self,
        application: Identifier,
        key: Identifier,
        value: KeyValue,
    ) -> Result<InsertOutcome> {
        let outcome = self.insert_inner(application, key, value)?;

        #[cfg(feature = "metrics")]
        match &outcome {
            InsertOutcome::Updated => self.metrics.record_insert_update(),
            InsertOutcome::Inserted => self.metrics.record_insert_new(),
            InsertOutcome::EvictedKey { .. } => {
                self.metrics.record_insert_new();
                self.metrics.record_key_evicted();
            },
            InsertOutcome::EvictedApplication { .. } => {
                self.metrics.record_insert_new();
                self.metrics.record_application_evicted();
            },
        }

        Ok(outcome)
    }

    fn insert_inner(
        &mut self,
        application: Identifier,
        key: Identifier,
        value: KeyValue,
    ) -> Result<InsertOutcome> {
        if let Some(app_at) = self.applications.find(|app| app.id.matches(&application)) {
            self.applications.promote(app_at);
            let app = self
                .applications
                .front_mut()
                .ok_or(KeyAgentError::CapacityExhausted("promoted application missing"))?;
            return app.insert_key(key, value);
        }

        let mut outcome = InsertOutcome::Inserted;
        if self.applications.is_full() {
            let evicted = self
                .applications
                .pop_back()
                .ok_or(KeyAgentError::CapacityExhausted(
                    "application level full without a tail",
                ))?;
            tracing::debug!(
                application = %evicted.id,
                keys = evicted.key_count(),
                "evicted least-recently-used application"
            );
            outcome = InsertOutcome::EvictedApplication {
                application: evicted.id,
                keys: evicted.key_count(),
            };
        }

        let mut slot = ApplicationSlot::new(application, self.keys_per_application);
        slot.insert_key(key, value)?;
        self.applications.push_front(slot).map_err(|_| {
            KeyAgentError::CapacityExhausted("no free application slot after eviction")
        })?;
        Ok(outcome)
    }

    /// Unlinks one key; the application stays cached even when it becomes empty.
    pub fn remove_key(&mut self, application: &Identifier, key: &Identifier) -> Result<KeyValue> {
        let not_found = || KeyAgentError::NotFound {
            application: *application,
            key: Some(*key),
        };
        let app_at = self
            .applications
            .find(|app| app.id.matches(application))
            .ok_or_else(not_found)?;
        let app = self.applications.get_mut(app_at.id).ok_or_else(not_found)?;
        let slot = app
            .keys
            .remove_where(|slot| slot.id.matches(key))
            .ok_or_else(not_found)?;

        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
        Ok(slot.value)
    }

    /// Unlinks an application with all of its keys and returns how many keys went with it.
    pub fn remove_application(&mut self, application: &Identifier) -> Result<usize> {
        let removed = self
            .applications
            .remove_where(|app| app.id.matches(application))
            .ok_or(KeyAgentError::NotFound {
                application: *application,
                key: None,
            })?;

        #[cfg(feature = "metrics")]
        self.metrics.record_remove();
        Ok(removed.key_count())
    }

    pub fn contains(&self, application: &Identifier, key: &Identifier) -> bool {
        self.peek(application, key).is_some()
    }

    pub fn contains_application(&self, application: &Identifier) -> bool {
        self.application(application).is_some()
    }

    /// Returns the application slot without changing recency.
    pub fn application(&self, application: &Identifier) -> Option<&ApplicationSlot> {
        self.applications
            .iter()
            .find(|app| app.id.matches(application))
    }

    pub fn key_count(&self, application: &Identifier) -> Option<usize> {
        self.application(application).map(ApplicationSlot::key_count)
    }

    /// Application ids from most to least recently used.
    pub fn application_ids(&self) -> Vec<Identifier> {
        self.applications.iter().map(|app| app.id).collect()
    }

    /// Key ids of one application from most to least recently used.
    pub fn key_ids(&self, application: &Identifier) -> Option<Vec<Identifier>> {
        self.application(application)
            .map(|app| app.key_ids().copied().collect())
    }

    /// The application the next application-level eviction would drop.
    pub fn lru_application(&self) -> Option<Identifier> {
        self.applications.back().map(|app| app.id)
    }

    /// Drops every application and key.
    pub fn clear(&mut self) {
        self.applications.clear();
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();
    }

    /// Verifies both recency levels and identifier uniqueness.
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        self.applications.check_invariants()?;

        let apps: Vec<&ApplicationSlot> = self.applications.iter().collect();
        for (i, app) in apps.iter().enumerate() {
            if apps[i + 1..].iter().any(|other| other.id.matches(&app.id)) {
                return Err(InvariantError::new(format!(
                    "application {} linked twice",
                    app.id
                )));
            }
            if app.keys.capacity() != self.keys_per_application {
                return Err(InvariantError::new(format!(
                    "application {} has key capacity {} (expected {})",
                    app.id,
                    app.keys.capacity(),
                    self.keys_per_application
                )));
            }
            app.keys.check_invariants().map_err(|err| {
                InvariantError::new(format!("application {}: {}", app.id, err.message()))
            })?;

            let keys: Vec<&Identifier> = app.key_ids().collect();
            for (j, key) in keys.iter().enumerate() {
                if keys[j + 1..].iter().any(|other| other.matches(key)) {
                    return Err(InvariantError::new(format!(
                        "key {} linked twice under application {}",
                        key, app.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<KeyCacheMetricsSnapshot> for KeyCache {
    fn snapshot(&self) -> KeyCacheMetricsSnapshot {
        KeyCacheMetricsSnapshot {
            lookup_calls: self.metrics.lookup_calls,
            lookup_hits: self.metrics.lookup_hits,
            lookup_misses: self.metrics.lookup_misses,
            insert_new: self.metrics.insert_new,
            insert_updates: self.metrics.insert_updates,
            evicted_applications: self.metrics.evicted_applications,
            evicted_keys: self.metrics.evicted_keys,
            removals: self.metrics.removals,
            clears: self.metrics.clears,
            applications: self.len(),
            keys: self.total_keys(),
            application_capacity: self.application_capacity(),
        }
    }
}

#[cfg(feature = "metrics")]
impl KeyCache {
    /// Zeroes every counter; cached entries are untouched.
    pub fn reset_metrics(&mut self) {
        self.metrics = KeyCacheMetrics::default();
    }
}
