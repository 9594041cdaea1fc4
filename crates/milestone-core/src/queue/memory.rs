//! In-memory mail queue implementation.

use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use super::{DeliveryState, MailLease, MailQueue, MailRecord, QueueError, RetryPolicy};
use crate::domain::MailId;
use crate::observability::QueueCounts;
use crate::ports::{IdGenerator, OutboundMail};

/// Scheduled mail entry for priority queue.
///
/// We use Reverse ordering so BinaryHeap acts as a min-heap (earliest first).
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledMail {
    next_run_at: Instant,
    mail_id: MailId,
}

impl PartialOrd for ScheduledMail {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledMail {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse ordering: earlier times have higher priority
        other
            .next_run_at
            .cmp(&self.next_run_at)
            .then_with(|| other.mail_id.cmp(&self.mail_id))
    }
}

struct QueueState {
    /// All mail records (single source of truth).
    records: HashMap<MailId, MailRecord>,

    /// Ready queue (MailIds only).
    ready: VecDeque<MailId>,

    /// Scheduled queue (retry backoff).
    scheduled: BinaryHeap<ScheduledMail>,

    closed: bool,
}

impl QueueState {
    fn new() -> Self {
        Self {
            records: HashMap::new(),
            ready: VecDeque::new(),
            scheduled: BinaryHeap::new(),
            closed: false,
        }
    }

    /// Move mails from scheduled to ready if their time has come.
    fn promote_scheduled(&mut self) {
        let now = Instant::now();
        while self
            .scheduled
            .peek()
            .is_some_and(|entry| entry.next_run_at <= now)
        {
            let Some(entry) = self.scheduled.pop() else {
                break;
            };
            if let Some(record) = self.records.get_mut(&entry.mail_id)
                && record.state == DeliveryState::RetryScheduled
            {
                record.requeue();
                self.ready.push_back(entry.mail_id);
            }
        }
    }

    fn counts_by_state(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in self.records.values() {
            match record.state {
                DeliveryState::Queued => counts.queued += 1,
                DeliveryState::Running => counts.running += 1,
                DeliveryState::Succeeded => counts.succeeded += 1,
                DeliveryState::RetryScheduled => counts.retry_scheduled += 1,
                DeliveryState::Dead => counts.dead += 1,
            }
        }
        counts
    }
}

/// In-memory mail queue.
///
/// - 状態は tokio `Mutex` 1 つで守る。transport 呼び出し中はロックを持たない
/// - `Notify` で待機中の lease() を起こす
pub struct InMemoryMailQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    retry_policy: RetryPolicy,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryMailQueue {
    pub fn new(retry_policy: RetryPolicy, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::new())),
            notify: Arc::new(Notify::new()),
            retry_policy,
            ids,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Snapshot of a single record.
    pub async fn record(&self, mail_id: MailId) -> Option<MailRecord> {
        let state = self.state.lock().await;
        state.records.get(&mail_id).cloned()
    }

    /// Mails that exhausted their attempts.
    pub async fn dead_letters(&self) -> Vec<MailRecord> {
        let state = self.state.lock().await;
        let mut dead: Vec<MailRecord> = state
            .records
            .values()
            .filter(|record| record.state == DeliveryState::Dead)
            .cloned()
            .collect();
        dead.sort_by_key(|record| record.created_at);
        dead
    }
}

#[async_trait]
impl MailQueue for InMemoryMailQueue {
    async fn enqueue(&self, mail: OutboundMail) -> Result<MailId, QueueError> {
        let mail_id = self.ids.generate_mail_id();
        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(QueueError::Closed);
            }
            let record = MailRecord::new(mail_id, mail, self.retry_policy.max_attempts);
            state.records.insert(mail_id, record);
            state.ready.push_back(mail_id);
        }

        // Notify waiting workers
        self.notify.notify_one();
        Ok(mail_id)
    }

    async fn lease(&self) -> Option<Box<dyn MailLease>> {
        loop {
            // 状態を見る前に登録しておかないと、その間の notify を取りこぼす
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next_wake = {
                let mut state = self.state.lock().await;
                state.promote_scheduled();

                if let Some(mail_id) = state.ready.pop_front()
                    && let Some(record) = state.records.get_mut(&mail_id)
                {
                    record.start_attempt();
                    return Some(Box::new(InMemoryLease {
                        mail_id,
                        mail: record.mail.clone(),
                        attempt: record.attempts,
                        state: Arc::clone(&self.state),
                        retry_policy: self.retry_policy.clone(),
                        notify: Arc::clone(&self.notify),
                    }));
                }

                if state.closed {
                    return None;
                }

                // No ready mails - check if we have scheduled ones
                state.scheduled.peek().map(|entry| entry.next_run_at)
            };

            // Wait for notification OR next scheduled mail
            if let Some(wake_time) = next_wake {
                tokio::select! {
                    _ = &mut notified => {},
                    _ = tokio::time::sleep_until(wake_time.into()) => {},
                }
            } else {
                notified.await;
            }
        }
    }

    async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    async fn counts_by_state(&self) -> QueueCounts {
        self.state.lock().await.counts_by_state()
    }
}

/// Lease implementation for InMemoryMailQueue.
struct InMemoryLease {
    mail_id: MailId,
    mail: OutboundMail,
    attempt: u32,
    state: Arc<Mutex<QueueState>>,
    retry_policy: RetryPolicy,
    notify: Arc<Notify>,
}

#[async_trait]
impl MailLease for InMemoryLease {
    fn mail_id(&self) -> MailId {
        self.mail_id
    }

    fn mail(&self) -> &OutboundMail {
        &self.mail
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    async fn ack(self: Box<Self>) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let record = state
            .records
            .get_mut(&self.mail_id)
            .ok_or(QueueError::UnknownMail(self.mail_id))?;
        record.mark_succeeded();
        Ok(())
    }

    async fn fail(self: Box<Self>, error: String) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            let record = state
                .records
                .get_mut(&self.mail_id)
                .ok_or(QueueError::UnknownMail(self.mail_id))?;

            if record.attempts_exhausted() {
                warn!(
                    mail_id = %self.mail_id,
                    to = %record.mail.to,
                    attempts = record.attempts,
                    error = %error,
                    "mail marked dead"
                );
                record.mark_dead(error);
                // Terminal state, no need to notify
                return Ok(());
            }

            let delay = self.retry_policy.next_delay(record.attempts);
            let now = Instant::now();
            let next_run_at = now
                .checked_add(delay)
                .or_else(|| now.checked_add(self.retry_policy.max_delay))
                .unwrap_or(now);
            debug!(
                mail_id = %self.mail_id,
                attempts = record.attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "mail retry scheduled"
            );
            record.schedule_retry(next_run_at, error);
            state.scheduled.push(ScheduledMail {
                next_run_at,
                mail_id: self.mail_id,
            });
        } // Lock released here

        // Notify outside the lock so a sleeping worker recomputes its wake time
        self.notify.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{SystemClock, UlidGenerator};
    use std::time::Duration;

    fn queue(policy: RetryPolicy) -> InMemoryMailQueue {
        InMemoryMailQueue::new(policy, Arc::new(UlidGenerator::new(SystemClock)))
    }

    fn mail(to: &str) -> OutboundMail {
        OutboundMail::new(to, "subject", "template", serde_json::json!({}))
    }

    async fn lease(queue: &InMemoryMailQueue) -> Box<dyn MailLease> {
        tokio::time::timeout(Duration::from_secs(1), queue.lease())
            .await
            .expect("lease timed out")
            .expect("queue closed")
    }

    #[tokio::test]
    async fn enqueue_and_counts() {
        let queue = queue(RetryPolicy::default());
        queue.enqueue(mail("a@example.com")).await.unwrap();

        let counts = queue.counts_by_state().await;
        assert_eq!(counts.queued, 1);
        assert_eq!(counts.running, 0);
    }

    #[tokio::test]
    async fn lease_transitions_to_running() {
        let queue = queue(RetryPolicy::default());
        let mail_id = queue.enqueue(mail("a@example.com")).await.unwrap();

        let lease = lease(&queue).await;
        assert_eq!(lease.mail_id(), mail_id);
        assert_eq!(lease.mail().to, "a@example.com");
        assert_eq!(lease.attempt(), 1);

        let counts = queue.counts_by_state().await;
        assert_eq!(counts.queued, 0);
        assert_eq!(counts.running, 1);
    }

    #[tokio::test]
    async fn ack_marks_succeeded() {
        let queue = queue(RetryPolicy::default());
        queue.enqueue(mail("a@example.com")).await.unwrap();
        lease(&queue).await.ack().await.unwrap();

        let counts = queue.counts_by_state().await;
        assert_eq!(counts.succeeded, 1);
        assert!(counts.is_settled());
    }

    #[tokio::test]
    async fn mails_are_leased_in_fifo_order() {
        let queue = queue(RetryPolicy::default());
        queue.enqueue(mail("first@example.com")).await.unwrap();
        queue.enqueue(mail("second@example.com")).await.unwrap();

        assert_eq!(lease(&queue).await.mail().to, "first@example.com");
        assert_eq!(lease(&queue).await.mail().to, "second@example.com");
    }

    #[tokio::test]
    async fn failed_mail_is_retried_after_backoff() {
        let queue = queue(RetryPolicy::new(Duration::from_millis(20), 2.0, 3));
        let mail_id = queue.enqueue(mail("a@example.com")).await.unwrap();

        lease(&queue).await.fail("smtp down".to_string()).await.unwrap();
        let record = queue.record(mail_id).await.unwrap();
        assert_eq!(record.state, DeliveryState::RetryScheduled);
        assert_eq!(record.last_error.as_deref(), Some("smtp down"));

        let retry = lease(&queue).await;
        assert_eq!(retry.mail_id(), mail_id);
        assert_eq!(retry.attempt(), 2);
        retry.ack().await.unwrap();

        assert_eq!(
            queue.record(mail_id).await.unwrap().state,
            DeliveryState::Succeeded
        );
    }

    #[tokio::test]
    async fn mail_goes_dead_after_max_attempts() {
        let queue = queue(RetryPolicy::new(Duration::ZERO, 1.0, 2));
        let mail_id = queue.enqueue(mail("a@example.com")).await.unwrap();

        lease(&queue).await.fail("err1".to_string()).await.unwrap();
        lease(&queue).await.fail("err2".to_string()).await.unwrap();

        let counts = queue.counts_by_state().await;
        assert_eq!(counts.dead, 1);
        let dead = queue.dead_letters().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].mail_id, mail_id);
        assert_eq!(dead[0].attempts, 2);
        assert_eq!(dead[0].last_error.as_deref(), Some("err2"));
    }

    #[tokio::test]
    async fn unrepresentable_backoff_does_not_poison_the_lease() {
        let policy = RetryPolicy::new(Duration::from_millis(1), 1e308, 3)
            .with_max_delay(Duration::MAX);
        let queue = queue(policy);
        let mail_id = queue.enqueue(mail("a@example.com")).await.unwrap();

        lease(&queue).await.fail("err1".to_string()).await.unwrap();
        lease(&queue).await.fail("err2".to_string()).await.unwrap();
        assert_eq!(
            queue.record(mail_id).await.unwrap().state,
            DeliveryState::RetryScheduled
        );

        let third = lease(&queue).await;
        assert_eq!(third.attempt(), 3);
        third.ack().await.unwrap();
        assert_eq!(queue.counts_by_state().await.succeeded, 1);
    }

    #[tokio::test]
    async fn close_rejects_new_mail_and_releases_waiters() {
        let queue = Arc::new(queue(RetryPolicy::default()));
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.lease().await.is_none() })
        };
        tokio::task::yield_now().await;

        queue.close().await;

        assert!(tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap());
        assert_eq!(
            queue.enqueue(mail("late@example.com")).await,
            Err(QueueError::Closed)
        );
    }

    #[tokio::test]
    async fn closed_queue_still_drains_ready_mail() {
        let queue = queue(RetryPolicy::default());
        queue.enqueue(mail("a@example.com")).await.unwrap();
        queue.close().await;

        assert!(queue.lease().await.is_some());
        assert!(queue.lease().await.is_none());
    }
}
