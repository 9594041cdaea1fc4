//! MailWorkerGroup - Queue から mail を lease して本物の transport に渡す

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::dispatch::panic_message;
use crate::ports::MailTransport;
use crate::queue::MailQueue;

/// Worker group handle.
/// - `request_shutdown()` で全ワーカーが新しい lease を取らなくなる
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
pub struct MailWorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl MailWorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(n: usize, queue: Arc<dyn MailQueue>, transport: Arc<dyn MailTransport>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let queue = Arc::clone(&queue);
            let transport = Arc::clone(&transport);
            let mut rx = shutdown_rx.clone();

            joins.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, transport, &mut rx).await;
            }));
        }
        info!(workers = n, "mail workers started");

        Self { shutdown_tx, joins }
    }

    pub fn worker_count(&self) -> usize {
        self.joins.len()
    }

    /// Request shutdown for all workers.
    /// In-flight transport calls are not cancelled; workers just stop taking new leases.
    pub fn request_shutdown(&self) {
        // receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            if let Err(err) = join.await {
                warn!(error = %err, "mail worker task ended abnormally");
            }
        }
        info!("mail workers stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn MailQueue>,
    transport: Arc<dyn MailTransport>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // lease は待つことがあるので shutdown と競合させる
        let lease = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // sender dropped
                    break;
                }
                continue;
            }
            lease = queue.lease() => lease,
        };

        let Some(lease) = lease else {
            debug!(worker_id, "mail queue closed");
            break;
        };

        let mail_id = lease.mail_id();
        let attempt = lease.attempt();
        // transport が panic しても lease は必ず fail で返す
        let sent = match AssertUnwindSafe(transport.send(lease.mail()))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(|err| err.to_string()),
            Err(panic) => Err(format!(
                "transport panicked: {}",
                panic_message(panic.as_ref())
            )),
        };
        match sent {
            Ok(()) => {
                debug!(worker_id, %mail_id, attempt, "mail delivered");
                if let Err(err) = lease.ack().await {
                    warn!(worker_id, %mail_id, error = %err, "ack failed");
                }
            }
            Err(err) => {
                warn!(worker_id, %mail_id, attempt, error = %err, "mail delivery failed");
                // retry/dead の判断は queue 側
                if let Err(err) = lease.fail(err).await {
                    warn!(worker_id, %mail_id, error = %err, "fail report failed");
                }
            }
        }
    }
}
