use crate::session::SessionRecord;
use crate::session_store::{SessionBackend, WriteSessionResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// # In-memory session backend
///
/// A process-wide map from tokens to session records, guarded by a single
/// mutex. Because there is no external persistence, this backend is ephemeral:
/// a server restart clears every session, and previously issued cookies stop
/// validating even though the browser still holds them.
///
/// # ***READ THIS BEFORE USING IN A PRODUCTION DEPLOYMENT***
///
/// Storing sessions only in memory brings the following problems:
///
/// 1. All sessions must fit in available memory (important for high load services)
/// 2. Expiry is lazy: an expired session is removed only when it is next
///    accessed. Sessions belonging to browsers that never return stay in
///    memory until a restart
/// 3. All sessions will be lost on shutdown
/// 4. If the service is clustered, a particular session will be stored only on
///    a single instance. Migrating to a shared external store means
///    implementing [`SessionBackend`] against it; the trait's methods map 1:1
///    onto SQL
#[derive(Debug, Default)]
pub struct MemoryStore {
    session_map: Mutex<HashMap<String, SessionRecord>>,
}

#[async_trait]
impl SessionBackend for MemoryStore {
    type Error = Infallible;

    const MAXIMUM_RETRIES_ON_TOKEN_COLLISION: Option<u8> = None;

    async fn create_session(
        &self,
        token: &str,
        record: &SessionRecord,
    ) -> Result<WriteSessionResult, Infallible> {
        let mut session_map = self.lock();
        // replace with `try_insert` once stable #82766
        if session_map.contains_key(token) {
            Ok(WriteSessionResult::TokenExists)
        } else {
            session_map.insert(token.to_owned(), record.clone());
            Ok(WriteSessionResult::Ok)
        }
    }

    async fn read_session(&self, token: &str) -> Result<Option<SessionRecord>, Infallible> {
        Ok(self.lock().get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), Infallible> {
        self.lock().remove(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Infallible> {
        self.lock().clear();
        Ok(())
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the number of sessions in the memory store.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the memory store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionRecord>> {
        self.session_map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
