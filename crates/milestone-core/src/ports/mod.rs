//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 永続化・メール送信・通知設定はこの crate の外にあり、ここでは
//! 固定のインターフェースとしてだけ扱います。

pub mod achievement;
pub mod clock;
pub mod directory;
pub mod id_generator;
pub mod mail;
pub mod preference;

// 主要な trait を再エクスポート
pub use self::achievement::{Achievement, AchievementKind, AchievementStore};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::directory::{CourseCatalog, Roster, UserDirectory};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mail::{MailTransport, OutboundMail};
pub use self::preference::{AllowAll, Channel, NotificationCategory, PreferenceGate};
