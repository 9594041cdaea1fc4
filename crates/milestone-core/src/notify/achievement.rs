//! AchievementRecorder - 完了イベントから派生レコード（バッジ・ポイント）を作る
//!
//! 1 つの Handler で 2 種類のイベントを購読するので、
//! `Handler<E>` ではなく object-safe な `EventHandler` を直接実装しています。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::bus::EventHandler;
use crate::domain::{DomainEvent, EventKind, HandlerError};
use crate::ports::{Achievement, AchievementKind, AchievementStore};

pub struct AchievementRecorder {
    store: Arc<dyn AchievementStore>,
}

impl AchievementRecorder {
    pub const NAME: &'static str = "achievement_recorder";

    pub fn new(store: Arc<dyn AchievementStore>) -> Self {
        Self { store }
    }

    fn achievement_for(event: &DomainEvent) -> Option<Achievement> {
        match event {
            DomainEvent::AttemptCompleted(e) => {
                let points = e.attempt.score.filter(|score| *score > 0)?;
                Some(Achievement {
                    user_id: e.attempt.user_id,
                    course_id: e.attempt.course_id,
                    kind: AchievementKind::Points(points),
                    source_event: e.event_id,
                })
            }
            DomainEvent::CourseCompleted(e) => Some(Achievement {
                user_id: e.enrollment.user_id,
                course_id: e.enrollment.course_id,
                kind: AchievementKind::CourseCompleted,
                source_event: e.event_id,
            }),
            DomainEvent::AssignmentPublished(_) => None,
        }
    }
}

#[async_trait]
impl EventHandler for AchievementRecorder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn kinds(&self) -> Vec<EventKind> {
        vec![EventKind::AttemptCompleted, EventKind::CourseCompleted]
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let Some(achievement) = Self::achievement_for(event) else {
            return Ok(());
        };
        let user_id = achievement.user_id;
        let kind = achievement.kind;
        let stored = self.store.award(achievement).await?;
        debug!(event_id = %event.event_id(), user = %user_id, ?kind, stored, "achievement");
        Ok(())
    }
}
