//! Mail transports for development.
//!
//! - RecordingMailer: 送信内容を記録する（テスト用）。特定の宛先を失敗させられる
//! - LogMailer: tracing にメールを書き出す（CLI 用）

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::domain::MailError;
use crate::ports::{MailTransport, OutboundMail};

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundMail>>,
    failing: Mutex<HashSet<String>>,
    /// 失敗も含めた send 呼び出し回数
    calls: Mutex<usize>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// この宛先への送信を Transport エラーにする
    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into());
    }

    pub fn recover(&self, address: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(address);
    }

    /// 成功した送信（送信順）
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        check_address(&mail.to)?;

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&mail.to);
        if failing {
            return Err(MailError::Transport(format!("{} is unreachable", mail.to)));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mail.clone());
        Ok(())
    }
}

/// `local@domain` の形をしていない宛先は送る前に拒否する
fn check_address(to: &str) -> Result<(), MailError> {
    let well_formed = to
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !to.contains(char::is_whitespace)
        });
    if well_formed {
        Ok(())
    } else {
        Err(MailError::Rejected {
            to: to.to_string(),
            reason: "malformed address".to_string(),
        })
    }
}

/// LogMailer はメールを送らずに構造化ログとして出す
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        check_address(&mail.to)?;
        info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            template = %mail.template,
            context = %mail.context,
            "mail sent"
        );
        Ok(())
    }
}
