use chrono::{DateTime, Utc};
use std::mem;

/// A queued browser-side cookie mutation.
///
/// Cookie writes and deletes that must reach the *browser's* cookie jar cannot
/// be expressed as a field of the server response in this UI model. They are
/// delivered inside the render output and executed by a browser-side agent
/// after that output reaches the browser. The agent's completion signal
/// triggers the next render; the server never does.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CookieMutation {
    /// Write `value` under `name`. The cookie is scoped to the entire site
    /// path and lives in the top-level cookie jar.
    Write {
        /// The cookie name.
        name: String,
        /// The cookie value, i.e. the session token.
        value: String,
        /// The cookie expiry. Matches the session record's expiry.
        expires_at: DateTime<Utc>,
    },
    /// Delete the cookie stored under `name`.
    Delete {
        /// The cookie name.
        name: String,
    },
}

/// Witness that the current render cycle must stop producing output.
///
/// Returned by every operation that queues a cookie mutation. On receiving it
/// the render driver must terminate the current render: the queued mutation
/// travels inside the output produced so far, and issuing further output or a
/// server-initiated rerun after this point competes with the browser agent for
/// the chance to execute, silently dropping the mutation if the agent is torn
/// down first.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[must_use = "a queued cookie mutation is lost unless the render halts"]
pub struct Halt;

#[derive(Debug, Clone, Eq, PartialEq)]
enum SyncState {
    /// No mutation pending; rendering proceeds normally.
    Idle,
    /// A mutation was queued during the current render pass and has not yet
    /// been handed to the render driver.
    MutationQueued(CookieMutation),
    /// The mutation left with the render output; waiting for the
    /// browser-triggered rerun.
    Halted,
}

/// Reconciles asynchronous browser-side cookie mutation with the synchronous
/// request/render cycle.
///
/// One machine per connection. States:
///
/// ```text
/// idle → mutation queued → halted → (externally resumed) → idle
/// ```
///
/// Queuing and halting are a single operation ([`queue_write`](Self::queue_write),
/// [`queue_delete`](Self::queue_delete)), so the render layer cannot
/// accidentally interleave other output between the two. The only forced
/// transition, `mutation queued → halted`, happens when the driver collects
/// the mutation via [`take_queued`](Self::take_queued), within the same
/// render pass, as the last thing the render does. Resumption is driven
/// externally by the browser agent's completion signal, which arrives as the
/// next render ([`resume`](Self::resume)).
///
/// Skipping a halt, or starting another render while a mutation is still
/// queued, is a programming-contract violation and panics rather than being
/// handled at runtime.
///
/// # Example
///
/// ```rust
/// # use persistent_auth::{CookieMutation, CookieSync};
/// let mut sync = CookieSync::new();
/// assert!(sync.is_idle());
///
/// let _halt = sync.queue_delete("auth_session");
/// let mutation = sync.take_queued().unwrap();
/// assert_eq!(mutation, CookieMutation::Delete { name: "auth_session".into() });
/// assert!(sync.is_halted());
///
/// // The browser agent ran and triggered the next render.
/// sync.resume();
/// assert!(sync.is_idle());
/// ```
#[derive(Debug, Default)]
pub struct CookieSync {
    state: SyncState,
}

impl CookieSync {
    /// A machine in the idle state, ready for its connection's first render.
    pub fn new() -> Self {
        Default::default()
    }

    /// Queue a cookie write and halt the current render, in one step.
    ///
    /// **Panics** if another mutation is already in flight.
    pub fn queue_write(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Halt {
        self.queue(CookieMutation::Write {
            name: name.into(),
            value: value.into(),
            expires_at,
        })
    }

    /// Queue a cookie delete and halt the current render, in one step.
    ///
    /// **Panics** if another mutation is already in flight.
    pub fn queue_delete(&mut self, name: impl Into<String>) -> Halt {
        self.queue(CookieMutation::Delete { name: name.into() })
    }

    fn queue(&mut self, mutation: CookieMutation) -> Halt {
        match &self.state {
            SyncState::Idle => {
                tracing::debug!("cookie mutation queued, halting render");
                self.state = SyncState::MutationQueued(mutation);
                Halt
            }
            state => panic!("attempted to queue a cookie mutation while one is in flight: {state:?}"),
        }
    }

    /// Hand the queued mutation to the render driver for delivery.
    ///
    /// This is the forced `mutation queued → halted` transition. The driver
    /// must call it while finalizing the very render pass that queued the
    /// mutation, embed the mutation in that pass's output, and emit nothing
    /// afterwards. Returns `None` when nothing is queued.
    pub fn take_queued(&mut self) -> Option<CookieMutation> {
        if matches!(self.state, SyncState::MutationQueued(_)) {
            let SyncState::MutationQueued(mutation) =
                mem::replace(&mut self.state, SyncState::Halted)
            else {
                unreachable!()
            };
            Some(mutation)
        } else {
            None
        }
    }

    /// Return to idle at the start of a browser-triggered rerun.
    ///
    /// Calling this from the idle state is a no-op: most renders have no
    /// mutation in flight.
    ///
    /// **Panics** if a mutation is still queued: the render that queued it
    /// continued without halting, which can drop the mutation.
    pub fn resume(&mut self) {
        match &self.state {
            SyncState::Halted => self.state = SyncState::Idle,
            SyncState::Idle => {}
            state @ SyncState::MutationQueued(_) => {
                panic!("a queued cookie mutation was never delivered to the browser: {state:?}")
            }
        }
    }

    /// True while a delivered mutation is travelling to the browser.
    pub fn is_halted(&self) -> bool {
        matches!(self.state, SyncState::Halted)
    }

    /// True when no mutation is pending or in flight.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, SyncState::Idle)
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_write_walks_the_full_cycle() {
        let expires_at = Utc::now();
        let mut sync = CookieSync::new();

        let _halt = sync.queue_write("auth_session", "token", expires_at);
        assert!(!sync.is_idle());
        assert!(!sync.is_halted());

        assert_eq!(
            sync.take_queued(),
            Some(CookieMutation::Write {
                name: "auth_session".into(),
                value: "token".into(),
                expires_at,
            })
        );
        assert!(sync.is_halted());
        assert_eq!(sync.take_queued(), None);

        sync.resume();
        assert!(sync.is_idle());
    }

    #[test]
    fn test_resume_from_idle_is_a_noop() {
        let mut sync = CookieSync::new();
        sync.resume();
        assert!(sync.is_idle());
        assert_eq!(sync.take_queued(), None);
    }

    #[test]
    #[should_panic(expected = "in flight")]
    fn test_queuing_twice_in_one_render_panics() {
        let mut sync = CookieSync::new();
        let _halt = sync.queue_delete("auth_session");
        let _halt = sync.queue_delete("auth_session");
    }

    #[test]
    #[should_panic(expected = "never delivered")]
    fn test_rerunning_past_an_undelivered_mutation_panics() {
        let mut sync = CookieSync::new();
        let _halt = sync.queue_delete("auth_session");
        sync.resume();
    }
}
