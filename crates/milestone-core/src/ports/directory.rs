//! Directory ports - 通知先の解決に使う読み取り専用の参照
//!
//! - UserDirectory: ユーザー（宛先アドレス）
//! - CourseCatalog: コース（件名に使うタイトル）
//! - Roster: コースの受講者一覧

use async_trait::async_trait;

use crate::domain::{Course, CourseId, User, UserId};

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Option<User>;
}

#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn find_course(&self, course_id: CourseId) -> Option<Course>;
}

#[async_trait]
pub trait Roster: Send + Sync {
    /// 受講中（pending/active/completed）のユーザー。dropped は含めない。
    async fn enrolled_users(&self, course_id: CourseId) -> Vec<UserId>;
}
