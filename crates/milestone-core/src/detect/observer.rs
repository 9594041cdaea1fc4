//! Observer - エンティティごとの completion 検出
//!
//! 永続化層から `before`/`after` のスナップショットを受け取り、
//! 発火した場合だけ DomainEvent を作ります。

use std::sync::Arc;

use tracing::trace;

use super::transition::Transition;
use crate::domain::{
    Assignment, AssignmentPublished, Attempt, AttemptCompleted, CourseCompleted, DomainEvent,
    Enrollment, Tracked,
};
use crate::ports::{Clock, IdGenerator};

/// Observer は 1 回の保存（mutation）を見てイベントを作るか決める
///
/// `before` は保存前の値。新規作成時は `None`。
pub trait Observer<E: Tracked> {
    fn observe(&self, before: Option<&E>, after: &E) -> Option<DomainEvent>;
}

/// CompletionObserver は Attempt / Enrollment / Assignment の completion を検出
///
/// イベント ID と時刻は ports 経由で作るので、テストでは固定できます。
#[derive(Clone)]
pub struct CompletionObserver {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl CompletionObserver {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    fn edge<E: Tracked>(&self, before: Option<&E>, after: &E) -> bool {
        let transition = Transition::new(before.map(Tracked::status), after.status());
        let fires = transition.fires();
        if !fires {
            if transition.changed() {
                trace!(%transition, "not a completion edge");
            } else {
                trace!(%transition, "status unchanged");
            }
        }
        fires
    }
}

impl Observer<Attempt> for CompletionObserver {
    fn observe(&self, before: Option<&Attempt>, after: &Attempt) -> Option<DomainEvent> {
        if !self.edge(before, after) {
            return None;
        }
        Some(
            AttemptCompleted {
                event_id: self.ids.generate_event_id(),
                occurred_at: self.clock.now(),
                attempt: after.clone(),
            }
            .into(),
        )
    }
}

impl Observer<Enrollment> for CompletionObserver {
    fn observe(&self, before: Option<&Enrollment>, after: &Enrollment) -> Option<DomainEvent> {
        if !self.edge(before, after) {
            return None;
        }
        Some(
            CourseCompleted {
                event_id: self.ids.generate_event_id(),
                occurred_at: self.clock.now(),
                enrollment: after.clone(),
            }
            .into(),
        )
    }
}

impl Observer<Assignment> for CompletionObserver {
    fn observe(&self, before: Option<&Assignment>, after: &Assignment) -> Option<DomainEvent> {
        if !self.edge(before, after) {
            return None;
        }
        Some(
            AssignmentPublished {
                event_id: self.ids.generate_event_id(),
                occurred_at: self.clock.now(),
                assignment: after.clone(),
            }
            .into(),
        )
    }
}
