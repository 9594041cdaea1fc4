//! AchievementStore port - gamification の派生レコード

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;
use crate::domain::{CourseId, EventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AchievementKind {
    /// コース修了バッジ
    CourseCompleted,
    /// Assessment のスコアに応じたポイント
    Points(u32),
}

/// 付与 1 件。`source_event` が冪等性のキーになる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub kind: AchievementKind,
    pub source_event: EventId,
}

/// AchievementStore は付与を記録する
///
/// # 冪等性
/// - 同じ `source_event` の 2 回目以降は保存せず `Ok(false)` を返す
#[async_trait]
pub trait AchievementStore: Send + Sync {
    async fn award(&self, achievement: Achievement) -> Result<bool, StoreError>;
}
