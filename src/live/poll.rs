//! Long-poll wait.
//!
//! ```text
//! CheckingImmediate ──changed──────────────────────────► Resolved(Changed)
//!        │
//!        └─subscribed─► Waiting ──notified──────────────► Resolved(Changed)
//!                          ├──────timed out─────────────► Resolved(NotModified)
//!                          └──────cancelled─────────────► Resolved(Cancelled)
//! ```
//!
//! The subscription is owned by the `Waiting` state; leaving it drops the
//! subscription, which deregisters exactly once.

use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam::channel::{Receiver, select};

use super::broker::Subscription;
use super::registry::FileRegistry;

/// Default time a poll stays parked before answering "not modified".
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// How a long-poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Content changed after the client's timestamp.
    Changed,
    /// Nothing changed before the timeout.
    NotModified,
    /// The wait was abandoned (server shutting down).
    Cancelled,
}

enum PollState {
    CheckingImmediate,
    Waiting(Subscription),
    Resolved(PollOutcome),
}

/// One long-poll request.
pub struct LongPoll<'a> {
    registry: &'a FileRegistry,
    since: DateTime<Utc>,
    timeout: Duration,
    cancel: &'a Receiver<()>,
}

impl<'a> LongPoll<'a> {
    /// `cancel` fires (message or disconnect) to abandon the wait.
    pub fn new(
        registry: &'a FileRegistry,
        since: DateTime<Utc>,
        timeout: Duration,
        cancel: &'a Receiver<()>,
    ) -> Self {
        Self {
            registry,
            since,
            timeout,
            cancel,
        }
    }

    /// Drive the state machine to completion. Blocks while waiting.
    pub fn run(self) -> PollOutcome {
        let mut state = PollState::CheckingImmediate;
        loop {
            state = match state {
                PollState::CheckingImmediate => match self.registry.subscribe_since(self.since) {
                    None => PollState::Resolved(PollOutcome::Changed),
                    Some(subscription) => PollState::Waiting(subscription),
                },
                PollState::Waiting(subscription) => {
                    let outcome = self.wait(&subscription);
                    crate::debug!("poll"; "subscriber {} resolved: {:?}", subscription.id(), outcome);
                    PollState::Resolved(outcome)
                }
                PollState::Resolved(outcome) => return outcome,
            };
        }
    }

    fn wait(&self, subscription: &Subscription) -> PollOutcome {
        select! {
            recv(subscription.receiver()) -> msg => match msg {
                Ok(()) => PollOutcome::Changed,
                // Broker dropped our sender: nothing will ever arrive.
                Err(_) => PollOutcome::Cancelled,
            },
            recv(self.cancel) -> _ => PollOutcome::Cancelled,
            default(self.timeout) => PollOutcome::NotModified,
        }
    }
}
