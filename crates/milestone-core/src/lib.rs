//! milestone-core
//!
//! 学習管理バックエンド向けの completion 通知。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, entity, events, errors）
//! - **detect**: Transition Detector（before/after から completion を検出）
//! - **bus**: Event Bus（静的登録、登録順の逐次配送、失敗の集約）
//! - **notify**: Completion Handlers（メール、achievement）
//! - **ports**: 抽象化レイヤー（MailTransport, UserDirectory, PreferenceGate など）
//! - **impls**: ports の in-memory 実装
//! - **queue** / **worker**: メール送信キュー（at-least-once）とワーカー
//! - **app**: NotifierBuilder / Notifier
//! - **config**: TOML 設定

pub mod app;
pub mod bus;
pub mod config;
pub mod detect;
pub mod domain;
pub mod impls;
pub mod notify;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod worker;

pub use app::{Notifier, NotifierBuildError, NotifierBuilder};
pub use config::{ConfigError, MilestoneConfig};
