//! PreferenceGate port - ユーザーごとの通知設定

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Assessment,
    Course,
    Assignment,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Assessment => "assessment",
            NotificationCategory::Course => "course",
            NotificationCategory::Assignment => "assignment",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Mail,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Mail => f.write_str("mail"),
        }
    }
}

/// PreferenceGate は送信前に参照される boolean gate
///
/// `false` の場合、Handler は何もせず成功として扱います。
#[async_trait]
pub trait PreferenceGate: Send + Sync {
    async fn should_notify(
        &self,
        user_id: UserId,
        category: NotificationCategory,
        channel: Channel,
    ) -> bool;
}

/// 常に送信を許可する gate（設定ストアを持たない環境向け）
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PreferenceGate for AllowAll {
    async fn should_notify(&self, _: UserId, _: NotificationCategory, _: Channel) -> bool {
        true
    }
}
