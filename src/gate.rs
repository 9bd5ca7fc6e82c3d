use crate::cookie_sync::{CookieSync, Halt};
use crate::credentials::CredentialBackend;
use crate::error::Error;
use crate::session::ConnectionState;
use crate::session_store::{SessionBackend, SessionStore};
use crate::token::{token_prefix, SessionTokenGenerator};
use chrono::Utc;

/// The name of the browser cookie holding the session token, unless
/// overridden via [`AuthGate::with_cookie_name`].
pub const DEFAULT_COOKIE_NAME: &str = "auth_session";

/// The path attribute of the session cookie: the entire site. The cookie
/// belongs in the top-level browser cookie jar, not an iframe-isolated one.
pub const COOKIE_PATH: &str = "/";

/// The outcome of the synchronous auth check at the start of a render.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AuthOutcome {
    /// The connection holds a valid session: proceed with protected
    /// rendering.
    Authenticated {
        /// The identity owning the session.
        identity: String,
    },
    /// No valid session: render the login form and nothing else; no
    /// protected content is reachable on this render.
    Unauthenticated,
}

/// The outcome of a login submission.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoginOutcome {
    /// A session was created and a cookie write was queued; the render must
    /// halt.
    LoggedIn(Halt),
    /// Unknown identity or wrong secret. Report the failure inline and keep
    /// the form; no state was changed and no session exists.
    InvalidCredentials,
}

/// The composition root: orchestrates the credential verifier, the session
/// store and each connection's cookie synchronization machine.
///
/// One gate is shared by every connection of the process. The per-connection
/// pieces, [`ConnectionState`] and [`CookieSync`], are owned by the host's
/// connection context and passed into each call.
///
/// The host must resolve navigation/routing *before* calling
/// [`login`](Self::login) or [`logout`](Self::logout): both may halt the
/// render, and a halt never discards the user's destination because routing
/// state is connection-scoped and independent of authentication.
#[derive(Debug)]
pub struct AuthGate<Credentials, Backend, Generator> {
    credentials: Credentials,
    store: SessionStore<Backend, Generator>,
    cookie_name: String,
}

impl<Credentials, Backend, Generator> AuthGate<Credentials, Backend, Generator>
where
    Credentials: CredentialBackend,
    Backend: SessionBackend<Error = Credentials::Error>,
    Generator: SessionTokenGenerator,
{
    /// Create a gate over a credential backend and a session store, using
    /// [`DEFAULT_COOKIE_NAME`] for the session cookie.
    pub fn new(credentials: Credentials, store: SessionStore<Backend, Generator>) -> Self {
        Self {
            credentials,
            store,
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
        }
    }

    /// Use a different cookie name.
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    /// The name of the request cookie the host must read synchronously and
    /// hand to [`begin_render`](Self::begin_render).
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Access the session store shared by all connections.
    pub fn store(&self) -> &SessionStore<Backend, Generator> {
        &self.store
    }

    /// Run the auth check for one render cycle.
    ///
    /// `request_token` is the session cookie's value, read synchronously from
    /// the incoming request's headers by the host. Reading needs no state
    /// machine and no multi-render delay.
    ///
    /// The machine in `sync` is resumed first: this render *is* the
    /// browser-triggered rerun that follows a halt, if one was in flight.
    /// Then, in order: a connection that already authenticated during its
    /// lifetime stays authenticated; otherwise the cookie token is validated
    /// against the store and the connection state is derived from the result.
    /// An invalid, expired or missing cookie is never surfaced as an error:
    /// it renders the login form, and the distinction lives in the logs.
    pub async fn begin_render(
        &self,
        connection: &mut ConnectionState,
        sync: &mut CookieSync,
        request_token: Option<&str>,
    ) -> Result<AuthOutcome, Error<Credentials::Error>> {
        sync.resume();

        if let Some(identity) = connection.authenticated_identity() {
            return Ok(AuthOutcome::Authenticated {
                identity: identity.to_owned(),
            });
        }

        let Some(token) = request_token.filter(|token| !token.is_empty()) else {
            tracing::debug!("no session cookie — showing login form");
            return Ok(AuthOutcome::Unauthenticated);
        };

        match self.store.validate(token).await? {
            Some(identity) => {
                tracing::info!(
                    "session restored from cookie for user {:?} (token prefix {})",
                    identity,
                    token_prefix(token)
                );
                connection.set_authenticated(identity.clone(), token.to_owned());
                Ok(AuthOutcome::Authenticated { identity })
            }
            None => {
                tracing::info!(
                    "cookie present but invalid or expired (token prefix {}) — ignoring",
                    token_prefix(token)
                );
                Ok(AuthOutcome::Unauthenticated)
            }
        }
    }

    /// Handle a login form submission.
    ///
    /// On success the connection state is set *before* the halt, so the rerun
    /// triggered by the browser agent already sees an authenticated
    /// connection, and a cookie write is queued whose expiry matches the
    /// session's. On failure nothing changes and the caller re-renders the
    /// form with an inline error.
    pub async fn login(
        &self,
        connection: &mut ConnectionState,
        sync: &mut CookieSync,
        identity: &str,
        secret: &str,
    ) -> Result<LoginOutcome, Error<Credentials::Error>> {
        if identity.is_empty() || secret.is_empty() {
            tracing::warn!("login attempt with empty identity or secret");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        if !self.credentials.verify(identity, secret).await? {
            tracing::warn!("login failed for identity {identity:?}: bad credentials");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let token = self.store.create(identity).await?;
        tracing::info!(
            "login succeeded for user {:?} (token prefix {})",
            identity,
            token_prefix(&token)
        );

        connection.set_authenticated(identity.to_owned(), token.clone());
        let expires_at = Utc::now() + self.store.ttl();
        Ok(LoginOutcome::LoggedIn(sync.queue_write(
            self.cookie_name.clone(),
            token,
            expires_at,
        )))
    }

    /// Handle a logout action.
    ///
    /// Destroys the server-side session (if the connection holds one), resets
    /// the connection state to exactly that of a fresh connection, queues the
    /// cookie delete and halts.
    pub async fn logout(
        &self,
        connection: &mut ConnectionState,
        sync: &mut CookieSync,
    ) -> Result<Halt, Error<Credentials::Error>> {
        if let Some(token) = connection.token() {
            self.store.destroy(token).await?;
        }
        tracing::info!("logout: user {:?} signed out", connection.identity());

        connection.clear();
        Ok(sync.queue_delete(self.cookie_name.clone()))
    }
}
