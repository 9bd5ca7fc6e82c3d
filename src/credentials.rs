use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::convert::Infallible;

/// Checks a submitted identity/secret pair against a user registry.
///
/// The return value must not distinguish an unknown identity from a wrong
/// secret (both are an ordinary `Ok(false)`), so that callers cannot leak a
/// user-enumeration side channel. The distinction exists in server-side logs
/// only. Absence of a user is never an error.
#[async_trait]
pub trait CredentialBackend {
    /// The error produced by this backend. The in-memory registry cannot fail
    /// and uses [`std::convert::Infallible`]; an external backend surfaces its
    /// driver error here.
    type Error;

    /// Return true iff `secret` matches the stored verifier for `identity`.
    /// Deterministic and side-effect free besides logging.
    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, Self::Error>;
}

/// The SHA-256 digest of a secret, as lowercase hex.
/// Registries store digests only; the plaintext never touches storage.
pub fn secret_digest(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// An in-memory user registry: identity → SHA-256 password digest.
///
/// Identities are unique map keys; lookup is exact-match and case-sensitive.
/// Users are provisioned at construction time and immutable afterwards. The
/// registry maps 1:1 onto a relational
/// `users(identity PK, secret_hash, created_at)` table.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRegistry {
    users: HashMap<String, String>,
}

impl MemoryUserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a user, digesting `password` immediately.
    /// Re-adding an identity replaces its digest.
    pub fn with_user(mut self, identity: impl Into<String>, password: &str) -> Self {
        self.users.insert(identity.into(), secret_digest(password));
        self
    }

    /// A registry preloaded with the documented demo accounts
    /// `test1`/`test1` and `test2`/`test2`.
    pub fn with_demo_users() -> Self {
        Self::new()
            .with_user("test1", "test1")
            .with_user("test2", "test2")
    }
}

#[async_trait]
impl CredentialBackend for MemoryUserRegistry {
    type Error = Infallible;

    async fn verify(&self, identity: &str, secret: &str) -> Result<bool, Infallible> {
        let Some(stored_digest) = self.users.get(identity) else {
            tracing::debug!("verification requested for unknown identity {identity:?}");
            return Ok(false);
        };
        Ok(*stored_digest == secret_digest(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex_and_deterministic() {
        let digest = secret_digest("test1");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, secret_digest("test1"));
        assert_ne!(digest, secret_digest("test2"));
    }
}
