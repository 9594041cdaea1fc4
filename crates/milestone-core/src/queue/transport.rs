//! QueuedMailTransport - MailTransport を「キューに積む」だけにする

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::MailQueue;
use crate::domain::MailError;
use crate::ports::{MailTransport, OutboundMail};

/// Handler から見ると普通の MailTransport。
///
/// `send` が成功しても配送済みとは限りません。実際の送信結果は
/// Queue の状態（`Succeeded` / `Dead`）で確認します。
pub struct QueuedMailTransport {
    queue: Arc<dyn MailQueue>,
}

impl QueuedMailTransport {
    pub fn new(queue: Arc<dyn MailQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl MailTransport for QueuedMailTransport {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        let mail_id = self
            .queue
            .enqueue(mail.clone())
            .await
            .map_err(|err| MailError::Queue(err.to_string()))?;
        debug!(%mail_id, to = %mail.to, template = %mail.template, "mail queued");
        Ok(())
    }
}
