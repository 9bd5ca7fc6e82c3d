use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A server-side session record, keyed by its token in the session store.
///
/// Records are created on login and destroyed on logout or on first access
/// after expiry. They are never updated in place; there is no sliding
/// expiration in this design. The shape maps 1:1 onto a row of a relational
/// `sessions(token PK, identity FK, created_at, expires_at)` table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The identity owning this session.
    pub identity: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid. Always after `created_at`.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create a record for `identity`, valid for `ttl` starting at `now`.
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>, ttl: Duration) -> Self {
        debug_assert!(ttl > Duration::zero());
        Self {
            identity: identity.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Return true if the record must be treated as absent, even before it is
    /// physically deleted from the store.
    ///
    /// A record is expired strictly after its expiry timestamp: at
    /// `expires_at` itself it still validates.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use chrono::{Duration, TimeZone, Utc};
    /// # use persistent_auth::SessionRecord;
    /// let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    /// let record = SessionRecord::new("test1", created, Duration::hours(24));
    /// assert!(!record.is_expired(created + Duration::hours(23) + Duration::minutes(59)));
    /// assert!(record.is_expired(created + Duration::hours(24) + Duration::seconds(1)));
    /// ```
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Authentication state of one connection/render context.
///
/// This is a cache derived from the request cookie and the session store,
/// never the source of truth. Every connection context (a tab, a reload)
/// starts from [`ConnectionState::new`] and is re-derived by the auth gate's
/// synchronous cookie check; the state is exclusively owned by its connection
/// and never shared between connections, even within the same browser.
///
/// Only the auth gate transitions this state, which keeps the invariant that
/// the authenticated flag, identity and token are always set and cleared
/// together.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ConnectionState {
    authenticated: bool,
    identity: Option<String>,
    token: Option<String>,
}

impl ConnectionState {
    /// The state of a freshly opened connection: unauthenticated, no identity,
    /// no token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return true if this connection has an authenticated session.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The identity this connection is logged in as, if any.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// The session token backing this connection's login, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The identity, but only while the connection is authenticated.
    pub(crate) fn authenticated_identity(&self) -> Option<&str> {
        if self.authenticated {
            self.identity.as_deref()
        } else {
            None
        }
    }

    pub(crate) fn set_authenticated(&mut self, identity: String, token: String) {
        self.authenticated = true;
        self.identity = Some(identity);
        self.token = Some(token);
    }

    /// Reset to exactly the state of a fresh connection.
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let record = SessionRecord::new("test1", created, Duration::hours(24));
        assert_eq!(record.expires_at, created + Duration::hours(24));
        assert!(!record.is_expired(record.expires_at));
        assert!(record.is_expired(record.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_cleared_state_equals_fresh_state() {
        let mut state = ConnectionState::new();
        state.set_authenticated("test1".to_owned(), "token".to_owned());
        assert!(state.is_authenticated());
        assert_eq!(state.authenticated_identity(), Some("test1"));
        state.clear();
        assert_eq!(state, ConnectionState::new());
        assert_eq!(state.authenticated_identity(), None);
    }
}
