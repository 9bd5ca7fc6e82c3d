//! Browser-persistent authentication for rerun-based, server-rendered UIs.
//!
//! This crate bridges an ephemeral per-connection state model, where nothing
//! survives a page reload or a new tab, with a durable, cross-tab,
//! single-browser login session, using only a browser cookie and a
//! server-side session table. It provides the session lifecycle (create,
//! validate with lazy expiry, destroy), the token protocol, the credential
//! verifier seam, and the cookie synchronization state machine that keeps the
//! asynchronous browser-side cookie agent from racing the server's render
//! cycle.
//!
//! # Cookie synchronization
//!
//! Reading the cookie is synchronous: the host framework reads it from the
//! incoming request's headers and hands it to
//! [`AuthGate::begin_render`]. Writing and deleting are not: they are
//! performed by a browser-side agent that runs after the render output is
//! delivered and triggers the next render when done. [`CookieSync`] models
//! this as an explicit state machine: queuing a mutation and halting the
//! render are one operation, the queued [`CookieMutation`] leaves with the
//! final output of the same render pass, and the machine only returns to idle
//! on the browser-triggered rerun. A render driver that breaks the sequence
//! panics instead of silently dropping a cookie write.
//!
//! # Security
//!
//! Tokens are sampled from a cryptographically secure source
//! ([`rand::rngs::ThreadRng`]) with over 128 bits of entropy, are never
//! derived from user input, and appear in logs only as 8-character prefixes.
//! The user registry stores SHA-256 digests, never plaintext secrets, and the
//! verifier's result does not distinguish an unknown identity from a wrong
//! secret.
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use persistent_auth::{
//!     AuthGate, AuthOutcome, ConnectionState, CookieMutation, CookieSync,
//!     DefaultSessionTokenGenerator, LoginOutcome, MemoryStore, MemoryUserRegistry,
//!     SessionStore,
//! };
//!
//! # async_std::task::block_on(async {
//! let users = MemoryUserRegistry::new().with_user("ada", "correct horse");
//! let store = SessionStore::new(
//!     MemoryStore::new(),
//!     DefaultSessionTokenGenerator,
//!     Duration::hours(24),
//! );
//! let gate = AuthGate::new(users, store);
//!
//! // Each connection context owns fresh state and its own sync machine.
//! let mut connection = ConnectionState::new();
//! let mut sync = CookieSync::new();
//!
//! // First render: no cookie yet, so the login form is shown.
//! let outcome = gate.begin_render(&mut connection, &mut sync, None).await.unwrap();
//! assert_eq!(outcome, AuthOutcome::Unauthenticated);
//!
//! // The form is submitted: a session is created, a cookie write is queued
//! // and the render halts.
//! let LoginOutcome::LoggedIn(_halt) = gate
//!     .login(&mut connection, &mut sync, "ada", "correct horse")
//!     .await
//!     .unwrap()
//! else {
//!     panic!("credentials are valid")
//! };
//!
//! // The driver delivers the mutation with the final output; the browser
//! // agent applies it and triggers the next render.
//! let Some(CookieMutation::Write { value: token, .. }) = sync.take_queued() else {
//!     panic!("a write was queued")
//! };
//!
//! // Reload: a fresh connection presents the cookie and is restored.
//! let mut reloaded = ConnectionState::new();
//! let mut sync = CookieSync::new();
//! let outcome = gate
//!     .begin_render(&mut reloaded, &mut sync, Some(&token))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome, AuthOutcome::Authenticated { identity: "ada".into() });
//! # });
//! ```

#![forbid(unsafe_code)]
#![deny(
    future_incompatible,
    missing_debug_implementations,
    nonstandard_style,
    missing_docs,
    unreachable_pub,
    missing_copy_implementations,
    unused_qualifications
)]

mod config;
mod cookie_sync;
mod credentials;
mod error;
mod gate;
mod memory_store;
mod session;
mod session_store;
mod token;

pub use config::{AuthConfig, DatabaseConfig};
pub use cookie_sync::{CookieMutation, CookieSync, Halt};
pub use credentials::{secret_digest, CredentialBackend, MemoryUserRegistry};
pub use error::Error;
pub use gate::{AuthGate, AuthOutcome, LoginOutcome, COOKIE_PATH, DEFAULT_COOKIE_NAME};
pub use memory_store::MemoryStore;
pub use session::{ConnectionState, SessionRecord};
pub use session_store::{SessionBackend, SessionStore, WriteSessionResult};
pub use token::{
    token_prefix, DebugSessionTokenGenerator, DefaultSessionTokenGenerator,
    SessionTokenGenerator, TOKEN_LENGTH,
};

/// A result with this crate's [`Error`] type, generic over the backend error.
pub type Result<T, BackendError> = std::result::Result<T, Error<BackendError>>;
