//! Queue status views.

use serde::{Deserialize, Serialize};

/// Mail queue の状態別件数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub queued: usize,
    pub running: usize,
    pub succeeded: usize,
    pub retry_scheduled: usize,
    pub dead: usize,
}

impl QueueCounts {
    /// Mails that may still be delivered.
    pub fn pending(&self) -> usize {
        self.queued + self.running + self.retry_scheduled
    }

    /// Every mail reached `Succeeded` or `Dead`.
    pub fn is_settled(&self) -> bool {
        self.pending() == 0
    }
}
