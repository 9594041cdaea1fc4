//! Impls - ports の開発用・テスト用実装
//!
//! # 含まれる実装
//! - **InMemoryDirectory**: ユーザー・コース・受講者名簿
//! - **StaticPreferences**: デフォルト許可 + 明示的な opt-out
//! - **RecordingMailer** / **LogMailer**: 送信の記録 / tracing への書き出し
//! - **InMemoryAchievements**: event_id で冪等な achievement 保存
//!
//! 本番用の実装（DB、SMTP など）は利用側のクレートに置きます。

pub mod achievements;
pub mod directory;
pub mod mailer;
pub mod preferences;

pub use self::achievements::InMemoryAchievements;
pub use self::directory::InMemoryDirectory;
pub use self::mailer::{LogMailer, RecordingMailer};
pub use self::preferences::StaticPreferences;
