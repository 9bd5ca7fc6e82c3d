use crate::error::Error;
use crate::session::SessionRecord;
use crate::token::{token_prefix, SessionTokenGenerator};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, PoisonError};

/// An async session store.
///
/// This is the user-facing interface of the store. It layers the token
/// protocol (generation from a strong random source, retry on collision,
/// lazy expiry on access) over a CRUD [`SessionBackend`].
///
/// The store is shared by every connection of the process. All methods take
/// `&self`; backends serialize their own mutations, and the token generator
/// sits behind a mutex here.
#[derive(Debug)]
pub struct SessionStore<Backend, Generator> {
    backend: Backend,
    generator: Mutex<Generator>,
    ttl: Duration,
}

impl<Backend: SessionBackend, Generator: SessionTokenGenerator>
    SessionStore<Backend, Generator>
{
    /// Create a session store over `backend`, minting tokens with `generator`.
    /// Sessions live for `ttl` from their creation; there is no sliding
    /// expiration.
    pub fn new(backend: Backend, generator: Generator, ttl: Duration) -> Self {
        Self {
            backend,
            generator: Mutex::new(generator),
            ttl,
        }
    }

    /// Create a session for `identity` and return its token.
    ///
    /// The token is freshly generated, unguessable and unique within the
    /// store; on the (negligibly likely) collision the backend reports it and
    /// a new token is generated, up to the backend's retry limit.
    pub async fn create(&self, identity: &str) -> Result<String, Error<Backend::Error>> {
        self.create_at(identity, Utc::now()).await
    }

    /// Like [`create`](Self::create), with an explicit creation instant.
    pub async fn create_at(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<String, Error<Backend::Error>> {
        let record = SessionRecord::new(identity, now, self.ttl);

        if let Some(maximum) = Backend::MAXIMUM_RETRIES_ON_TOKEN_COLLISION {
            for _ in 0..maximum {
                if let Some(token) = self.try_create(&record).await? {
                    return Ok(token);
                }
            }
            Err(Error::MaximumTokenGenerationRetriesReached {
                maximum: maximum.into(),
            })
        } else {
            loop {
                if let Some(token) = self.try_create(&record).await? {
                    return Ok(token);
                }
            }
        }
    }

    async fn try_create(
        &self,
        record: &SessionRecord,
    ) -> Result<Option<String>, Error<Backend::Error>> {
        let token = self.generate_token();
        match self.backend.create_session(&token, record).await? {
            WriteSessionResult::Ok => {
                tracing::info!(
                    "session created for user {:?} (token prefix {})",
                    record.identity,
                    token_prefix(&token)
                );
                Ok(Some(token))
            }
            WriteSessionResult::TokenExists => Ok(None),
        }
    }

    /// Resolve `token` to the identity owning it.
    ///
    /// Returns `Ok(None)` for an empty token (no lookup is performed), for an
    /// unknown token, and for an expired one. An expired record is deleted on
    /// this access; expiry is lazy, there is no background sweep.
    pub async fn validate(&self, token: &str) -> Result<Option<String>, Error<Backend::Error>> {
        self.validate_at(token, Utc::now()).await
    }

    /// Like [`validate`](Self::validate), with an explicit evaluation instant.
    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, Error<Backend::Error>> {
        if token.is_empty() {
            return Ok(None);
        }

        let Some(record) = self.backend.read_session(token).await? else {
            tracing::debug!("no session for token prefix {}", token_prefix(token));
            return Ok(None);
        };

        if record.is_expired(now) {
            tracing::info!(
                "session expired for token prefix {} — removing",
                token_prefix(token)
            );
            self.backend.delete_session(token).await?;
            return Ok(None);
        }

        Ok(Some(record.identity))
    }

    /// Remove the session stored under `token`, if any.
    /// Destroying an absent token is a no-op, not an error.
    pub async fn destroy(&self, token: &str) -> Result<(), Error<Backend::Error>> {
        self.backend.delete_session(token).await?;
        tracing::info!("session destroyed (token prefix {})", token_prefix(token));
        Ok(())
    }

    /// Empties the entire store, deleting all sessions.
    pub async fn clear_store(&self) -> Result<(), Error<Backend::Error>> {
        self.backend.clear().await?;
        Ok(())
    }

    /// The configured session lifetime. The browser cookie expiry matches it.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Consume the store, returning the underlying backend.
    pub fn into_inner(self) -> Backend {
        self.backend
    }

    fn generate_token(&self) -> String {
        self.generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate_token()
    }
}

/// The backend-facing interface of the session store.
/// It defines simple [CRUD]-methods on session records, with the token as the
/// primary key.
///
/// Implementations must tolerate interleaved calls from concurrent
/// connections: all mutations go through a single point of serialization
/// (the in-memory backend uses one mutex; a relational backend relies on the
/// database's row-level guarantees). Each method maps 1:1 onto SQL against a
/// `sessions(token PK, identity FK, created_at, expires_at)` table with an
/// index on `expires_at`.
///
/// [CRUD]: https://en.wikipedia.org/wiki/Create,_read,_update_and_delete
#[async_trait]
pub trait SessionBackend {
    /// The error produced by this backend. The in-memory backend cannot fail
    /// and uses [`std::convert::Infallible`]; an external backend surfaces its
    /// driver error here, and callers must treat it as a server fault rather
    /// than as "not authenticated".
    type Error;

    /// Writing a session may fail if the token already exists.
    /// This constant indicates how often the caller should retry with
    /// different randomly generated tokens until it should give up.
    /// The value `None` indicates that the caller should never give up,
    /// possibly looping infinitely.
    const MAXIMUM_RETRIES_ON_TOKEN_COLLISION: Option<u8>;

    /// Insert `record` under `token`.
    async fn create_session(
        &self,
        token: &str,
        record: &SessionRecord,
    ) -> Result<WriteSessionResult, Self::Error>;

    /// Read the record stored under `token`. Expiry is evaluated by the
    /// caller, not here.
    async fn read_session(&self, token: &str) -> Result<Option<SessionRecord>, Self::Error>;

    /// Delete the record stored under `token`. Deleting an absent token is a
    /// no-op.
    async fn delete_session(&self, token: &str) -> Result<(), Self::Error>;

    /// Delete all session records.
    async fn clear(&self) -> Result<(), Self::Error>;
}

/// The result of writing a session, indicating if the session could be
/// written, or if the token collided.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WriteSessionResult {
    /// The session could be written without token collision.
    Ok,
    /// The session could not be written, because the chosen token already
    /// exists.
    TokenExists,
}
