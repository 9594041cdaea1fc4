//! Delivery state machine for queued mail.

use serde::{Deserialize, Serialize};

/// Mail delivery state.
///
/// State transitions:
/// - Queued -> Running -> Succeeded
/// - Queued -> Running -> RetryScheduled -> Queued (loop until max_attempts)
/// - Queued -> Running -> Dead (when max_attempts exceeded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Ready to be leased.
    Queued,

    /// Leased by a worker, transport call in flight.
    Running,

    /// Handed to the transport successfully.
    Succeeded,

    /// Waiting for retry (delayed due to backoff).
    RetryScheduled,

    /// Failed permanently (max_attempts exceeded).
    Dead,
}

impl DeliveryState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::Succeeded | DeliveryState::Dead)
    }

    /// Is this mail eligible for lease?
    pub fn is_runnable(self) -> bool {
        matches!(self, DeliveryState::Queued)
    }
}
