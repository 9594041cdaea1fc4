//! Outbound mail queue: state management, retry logic, and in-memory implementation.
//!
//! Handler は `QueuedMailTransport` 経由でメールを積むだけで、実際の送信は
//! `MailWorkerGroup` が lease して行います（at-least-once）。

mod memory;
mod record;
mod retry;
mod state;
mod transport;

pub use memory::InMemoryMailQueue;
pub use record::MailRecord;
pub use retry::RetryPolicy;
pub use state::DeliveryState;
pub use transport::QueuedMailTransport;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::MailId;
use crate::observability::QueueCounts;
use crate::ports::OutboundMail;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("mail queue is closed")]
    Closed,

    #[error("mail {0} is not in the queue")]
    UnknownMail(MailId),
}

/// A leased mail for delivery.
/// The worker owns this lease and must either `ack` or `fail`.
///
/// - Queue manages state transitions (Queued -> Running -> ...).
/// - Worker calls the transport and reports the result.
#[async_trait]
pub trait MailLease: Send {
    fn mail_id(&self) -> MailId;

    fn mail(&self) -> &OutboundMail;

    /// 何回目の送信か（1 始まり）
    fn attempt(&self) -> u32;

    /// Mark success.
    async fn ack(self: Box<Self>) -> Result<(), QueueError>;

    /// Mark failure (queue decides retry/dead policy).
    async fn fail(self: Box<Self>, error: String) -> Result<(), QueueError>;
}

/// Queue port.
#[async_trait]
pub trait MailQueue: Send + Sync {
    async fn enqueue(&self, mail: OutboundMail) -> Result<MailId, QueueError>;

    /// Lease one ready mail (waits until available, or returns None once closed).
    async fn lease(&self) -> Option<Box<dyn MailLease>>;

    /// Stop accepting mail and wake idle `lease()` callers.
    /// Ready mail is still handed out; mail waiting for a retry stays `RetryScheduled`.
    async fn close(&self);

    async fn counts_by_state(&self) -> QueueCounts;
}
