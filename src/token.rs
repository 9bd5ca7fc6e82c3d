use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::fmt::Write;

/// The length of generated session tokens, in characters.
///
/// Alphanumeric characters carry `log_2(26+26+10) ≥ 5.95` bits of entropy each,
/// so 64 characters give well over 128 bits, making tokens unguessable.
pub const TOKEN_LENGTH: usize = 64;

/// A type with the ability to generate session tokens.
///
/// Tokens are opaque strings that double as browser cookie values and as
/// primary keys in the session store. They must be drawn from a
/// cryptographically strong random source and must never be sequential or
/// derived from user-controlled input.
pub trait SessionTokenGenerator {
    /// Generate a token, i.e. a string that is a valid HTTP cookie value.
    fn generate_token(&mut self) -> String;
}

/// The default token generator with focus on security.
/// It samples [`rand::rngs::ThreadRng`] with the [`Alphanumeric`] distribution,
/// producing [`TOKEN_LENGTH`] characters per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSessionTokenGenerator;

impl SessionTokenGenerator for DefaultSessionTokenGenerator {
    fn generate_token(&mut self) -> String {
        thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// A debug token generator that produces an ascending sequence of integers,
/// formatted as strings padded with zeroes. Deterministic, for tests only.
#[derive(Debug, Default)]
#[allow(missing_copy_implementations)]
pub struct DebugSessionTokenGenerator {
    next_index: usize,
}

impl SessionTokenGenerator for DebugSessionTokenGenerator {
    fn generate_token(&mut self) -> String {
        let mut token = String::new();
        write!(&mut token, "{:0width$}", self.next_index, width = TOKEN_LENGTH).unwrap();
        assert_eq!(token.len(), TOKEN_LENGTH);
        self.next_index += 1;
        token
    }
}

/// The first eight characters of a token, for logging.
///
/// Tokens never appear whole in logs. Values shorter than eight characters
/// (necessarily invalid) are returned unchanged.
pub fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
