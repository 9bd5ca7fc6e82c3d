/// All errors that can occur in this crate.
///
/// The type is generic over the error produced by the credential and session
/// backends, so that an external backend (e.g. a relational database) can
/// surface its driver errors unchanged. The in-memory backends use
/// [`std::convert::Infallible`] here.
#[derive(Debug, thiserror::Error)]
#[allow(missing_copy_implementations)]
pub enum Error<BackendError> {
    /// Tried as often as the backend allows to generate a session token,
    /// but every generated token already existed.
    #[error("the maximum number of retries to generate a session token was reached")]
    MaximumTokenGenerationRetriesReached {
        /// The maximum number of retries that was reached.
        maximum: u32,
    },

    /// The credential or session backend failed.
    ///
    /// Callers must surface this as a server fault. In particular, the auth
    /// gate never maps a backend failure to "not authenticated": a backend
    /// outage and a missing session are different things.
    #[error("{0}")]
    Backend(BackendError),
}

impl<BackendError> From<BackendError> for Error<BackendError> {
    fn from(error: BackendError) -> Self {
        Self::Backend(error)
    }
}

mod expect_impl_error {
    trait ExpectImplError: std::error::Error {}

    impl<BackendError: std::error::Error> ExpectImplError for super::Error<BackendError> {}
}
