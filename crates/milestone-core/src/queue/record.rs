//! Mail record: metadata + payload.

use std::time::Instant;

use super::DeliveryState;
use crate::domain::MailId;
use crate::ports::OutboundMail;

/// Metadata + payload for a mail in the queue.
///
/// Design:
/// - This is the "single source of truth" for delivery state.
/// - Queue structures (ready/scheduled) hold MailId only.
/// - All state transitions happen here.
#[derive(Debug, Clone)]
pub struct MailRecord {
    pub mail_id: MailId,
    pub mail: OutboundMail,
    pub state: DeliveryState,

    /// Number of transport calls made (including current attempt if Running).
    pub attempts: u32,

    pub max_attempts: u32,

    pub last_error: Option<String>,

    /// When to retry next (for RetryScheduled state).
    pub next_run_at: Option<Instant>,

    pub created_at: Instant,
    pub updated_at: Instant,
}

impl MailRecord {
    pub fn new(mail_id: MailId, mail: OutboundMail, max_attempts: u32) -> Self {
        let now = Instant::now();
        Self {
            mail_id,
            mail,
            state: DeliveryState::Queued,
            attempts: 0,
            max_attempts,
            last_error: None,
            next_run_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark as running (increment attempts).
    pub fn start_attempt(&mut self) {
        self.state = DeliveryState::Running;
        self.attempts += 1;
        self.updated_at = Instant::now();
    }

    pub fn mark_succeeded(&mut self) {
        self.state = DeliveryState::Succeeded;
        self.updated_at = Instant::now();
    }

    pub fn mark_dead(&mut self, error: String) {
        self.state = DeliveryState::Dead;
        self.last_error = Some(error);
        self.updated_at = Instant::now();
    }

    pub fn schedule_retry(&mut self, next_run_at: Instant, error: String) {
        self.state = DeliveryState::RetryScheduled;
        self.next_run_at = Some(next_run_at);
        self.last_error = Some(error);
        self.updated_at = Instant::now();
    }

    /// Move from RetryScheduled back to Queued.
    pub fn requeue(&mut self) {
        self.state = DeliveryState::Queued;
        self.next_run_at = None;
        self.updated_at = Instant::now();
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}
