//! Credential gate for destructive per-application operations.
//!
//! [`CredentialVerifier`] is the yes/no seam consulted by
//! [`KeyAgent::clear_application_cache`](crate::agent::KeyAgent::clear_application_cache).
//! [`CredentialStore`] is the provided implementation: it is fed by
//! `SaveInfo` replies and keeps only a SHA-256 digest of each application's
//! account and password. The agent forgets an application's entry when the
//! application leaves the cache.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::types::Identifier;

/// Decides whether a caller may act on an application's cached state.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, application: &Identifier, account: &str, password: &str) -> bool;
}

/// Digests of registered application credentials.
#[derive(Debug, Default)]
pub struct CredentialStore {
    digests: RwLock<FxHashMap<Identifier, Vec<u8>>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) the credentials of `application`.
    pub fn register(&self, application: Identifier, account: &str, password: &str) {
        let digest = credential_digest(account, password);
        self.digests.write().insert(application, digest);
        tracing::debug!(application = %application, "registered application credentials");
    }

    /// Drops the credentials of `application`. Returns whether any were held.
    pub fn forget(&self, application: &Identifier) -> bool {
        self.digests.write().remove(application).is_some()
    }

    pub fn is_registered(&self, application: &Identifier) -> bool {
        self.digests.read().contains_key(application)
    }

    pub fn len(&self) -> usize {
        self.digests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.read().is_empty()
    }

    pub fn clear(&self) {
        self.digests.write().clear();
    }
}

impl CredentialVerifier for CredentialStore {
    fn verify(&self, application: &Identifier, account: &str, password: &str) -> bool {
        let candidate = credential_digest(account, password);
        match self.digests.read().get(application) {
            Some(stored) => digests_match(stored, &candidate),
            None => false,
        }
    }
}

fn credential_digest(account: &str, password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    // each field is length-prefixed, so no byte can move across the boundary
    for field in [account, password] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_vec()
}

/// Compares every byte regardless of where the first difference is.
fn digests_match(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(n: u128) -> Identifier {
        Identifier::from_u128(n)
    }

    #[test]
    fn unregistered_application_is_rejected() {
        let store = CredentialStore::new();
        assert!(!store.verify(&app(1), "acct", "pw"));
    }

    #[test]
    fn registered_credentials_verify() {
        let store = CredentialStore::new();
        store.register(app(1), "acct", "pw");
        assert!(store.verify(&app(1), "acct", "pw"));
        assert!(!store.verify(&app(1), "acct", "pw2"));
        assert!(!store.verify(&app(1), "other", "pw"));
        assert!(!store.verify(&app(2), "acct", "pw"));
    }

    #[test]
    fn field_boundary_is_part_of_the_digest() {
        let store = CredentialStore::new();
        store.register(app(1), "ab", "c");
        assert!(!store.verify(&app(1), "a", "bc"));

        // NUL inside a field must not stand in for the boundary
        store.register(app(2), "a\0", "b");
        assert!(!store.verify(&app(2), "a", "\0b"));
        assert!(store.verify(&app(2), "a\0", "b"));
    }

    #[test]
    fn register_replaces_and_forget_removes() {
        let store = CredentialStore::new();
        store.register(app(1), "acct", "old");
        store.register(app(1), "acct", "new");
        assert_eq!(store.len(), 1);
        assert!(!store.verify(&app(1), "acct", "old"));
        assert!(store.verify(&app(1), "acct", "new"));

        assert!(store.is_registered(&app(1)));
        assert!(store.forget(&app(1)));
        assert!(!store.forget(&app(1)));
        assert!(!store.is_registered(&app(1)));
        assert!(store.is_empty());
    }

    #[test]
    fn digest_is_not_the_plaintext() {
        let digest = credential_digest("acct", "secret");
        assert_eq!(digest.len(), 32);
        assert!(!digest.windows(6).any(|w| w == b"secret"));
    }

    #[test]
    fn digests_of_different_length_never_match() {
        assert!(!digests_match(&[1, 2, 3], &[1, 2]));
        assert!(digests_match(&[1, 2, 3], &[1, 2, 3]));
    }
}
