//! Errors - エラー型と分類
//!
//! # 分類
//! - DetectionSkipped: エラーではない（Observer が `None` を返すだけ）
//! - HandlerFailure: Handler 単位の失敗。Bus が集約して呼び出し元に報告する
//! - MissingContactInfo: Handler 内の no-op。エラーとして表に出さない

use thiserror::Error;

/// Handler が Bus に返すエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Mail transport が失敗した（1 件以上の宛先）
    #[error("delivery failed for {recipients:?}: {reason}")]
    Delivery {
        recipients: Vec<String>,
        reason: String,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Handler が panic した（Bus が捕まえて変換する）
    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

impl HandlerError {
    pub fn delivery(recipient: impl Into<String>, error: &MailError) -> Self {
        Self::Delivery {
            recipients: vec![recipient.into()],
            reason: error.to_string(),
        }
    }
}

/// Outbound mail collaborator のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail to {to} rejected: {reason}")]
    Rejected { to: String, reason: String },

    #[error("mail queue error: {0}")]
    Queue(String),
}

/// 派生レコード（achievement など）を保存するストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// wire 値から状態 enum への変換失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {domain} status '{value}' (allowed: {allowed})")]
pub struct StatusParseError {
    pub domain: &'static str,
    pub value: String,
    pub allowed: String,
}
