//! MailTransport port - outbound mail collaborator
//!
//! テンプレートのレンダリングはこの crate の責務ではありません。
//! Handler は「宛先・件名・テンプレート名・context」だけを組み立てて渡します。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::MailError;

/// 送信 1 件分の payload。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub context: serde_json::Value,
}

impl OutboundMail {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        template: impl Into<String>,
        context: serde_json::Value,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            template: template.into(),
            context,
        }
    }
}

/// MailTransport はメールを外部に渡す
///
/// # 設計原則
/// - タイムアウトやリトライは実装側（transport / queue）の責務
/// - Handler からは 1 回呼ぶだけ
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError>;
}
