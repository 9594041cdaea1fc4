//! Completion Handlers - Bus から呼ばれる副作用
//!
//! - AttemptCompletedMail: assessment 完了メール（受験者本人）
//! - CourseCompletedMail: コース修了メール（受講者本人）
//! - AssignmentPublishedMail: 課題公開メール（コースの受講者全員）
//! - AchievementRecorder: gamification の派生レコード
//!
//! # 冪等性（既知の制限）
//! メール系 Handler は同じイベントで 2 回呼ばれると 2 回送ります。
//! dedup ストアは持たず、「落ちない・状態を壊さない」ことだけを保証します。

mod achievement;
mod assignment;
mod attempt;
mod course;
mod mailroom;

pub use self::achievement::AchievementRecorder;
pub use self::assignment::AssignmentPublishedMail;
pub use self::attempt::AttemptCompletedMail;
pub use self::course::CourseCompletedMail;
pub use self::mailroom::{MailSettings, Mailroom, Recipient};
