//! Events - completion 系のドメインイベント
//!
//! イベントは状態が終端に入った瞬間のスナップショットです。
//! - 本物の遷移 1 回につき 1 回だけ作られる
//! - 作成後は変更しない（Handler には `&DomainEvent` で渡す）
//! - 永続化しない（配送が終わったら捨てる）

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Assignment, Attempt, Enrollment};
use super::ids::{CourseId, EventId, UserId};

/// EventKind は Bus のルーティングキー（tagged dispatch）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "attempt.completed")]
    AttemptCompleted,
    #[serde(rename = "course.completed")]
    CourseCompleted,
    #[serde(rename = "assignment.published")]
    AssignmentPublished,
}

impl EventKind {
    pub const ALL: &'static [EventKind] = &[
        EventKind::AttemptCompleted,
        EventKind::CourseCompleted,
        EventKind::AssignmentPublished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AttemptCompleted => "attempt.completed",
            EventKind::CourseCompleted => "course.completed",
            EventKind::AssignmentPublished => "assignment.published",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assessment attempt reached `completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptCompleted {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub attempt: Attempt,
}

/// An enrollment reached `completed`, i.e. the learner finished the course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCompleted {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub enrollment: Enrollment,
}

/// An assignment was published to its course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPublished {
    pub event_id: EventId,
    pub occurred_at: DateTime<Utc>,
    pub assignment: Assignment,
}

/// DomainEvent は Bus に流れるイベントの閉じた集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DomainEvent {
    #[serde(rename = "attempt.completed")]
    AttemptCompleted(AttemptCompleted),
    #[serde(rename = "course.completed")]
    CourseCompleted(CourseCompleted),
    #[serde(rename = "assignment.published")]
    AssignmentPublished(AssignmentPublished),
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::AttemptCompleted(_) => EventKind::AttemptCompleted,
            DomainEvent::CourseCompleted(_) => EventKind::CourseCompleted,
            DomainEvent::AssignmentPublished(_) => EventKind::AssignmentPublished,
        }
    }

    pub fn event_id(&self) -> EventId {
        match self {
            DomainEvent::AttemptCompleted(e) => e.event_id,
            DomainEvent::CourseCompleted(e) => e.event_id,
            DomainEvent::AssignmentPublished(e) => e.event_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::AttemptCompleted(e) => e.occurred_at,
            DomainEvent::CourseCompleted(e) => e.occurred_at,
            DomainEvent::AssignmentPublished(e) => e.occurred_at,
        }
    }

    pub fn course_id(&self) -> CourseId {
        match self {
            DomainEvent::AttemptCompleted(e) => e.attempt.course_id,
            DomainEvent::CourseCompleted(e) => e.enrollment.course_id,
            DomainEvent::AssignmentPublished(e) => e.assignment.course_id,
        }
    }

    /// 通知対象のユーザー（1 人に決まる場合）。
    ///
    /// AssignmentPublished はコースの受講者全員が対象なので `None`。
    pub fn subject_user(&self) -> Option<UserId> {
        match self {
            DomainEvent::AttemptCompleted(e) => Some(e.attempt.user_id),
            DomainEvent::CourseCompleted(e) => Some(e.enrollment.user_id),
            DomainEvent::AssignmentPublished(_) => None,
        }
    }
}

impl From<AttemptCompleted> for DomainEvent {
    fn from(event: AttemptCompleted) -> Self {
        DomainEvent::AttemptCompleted(event)
    }
}

impl From<CourseCompleted> for DomainEvent {
    fn from(event: CourseCompleted) -> Self {
        DomainEvent::CourseCompleted(event)
    }
}

impl From<AssignmentPublished> for DomainEvent {
    fn from(event: AssignmentPublished) -> Self {
        DomainEvent::AssignmentPublished(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::AssessmentId;
    use crate::domain::status::AttemptStatus;

    fn attempt_completed() -> DomainEvent {
        let attempt = Attempt::new(AssessmentId::random(), UserId::random(), CourseId::random())
            .with_status(AttemptStatus::Completed)
            .with_score(87);
        AttemptCompleted {
            event_id: EventId::random(),
            occurred_at: Utc::now(),
            attempt,
        }
        .into()
    }

    #[test]
    fn accessors_follow_the_snapshot() {
        let event = attempt_completed();
        let DomainEvent::AttemptCompleted(inner) = &event else {
            panic!("expected AttemptCompleted");
        };

        assert_eq!(event.kind(), EventKind::AttemptCompleted);
        assert_eq!(event.event_id(), inner.event_id);
        assert_eq!(event.course_id(), inner.attempt.course_id);
        assert_eq!(event.subject_user(), Some(inner.attempt.user_id));
    }

    #[test]
    fn event_json_is_tagged_by_kind() {
        let event = attempt_completed();
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["kind"], "attempt.completed");
        assert_eq!(v["attempt"]["status"], "completed");
        assert_eq!(v["attempt"]["score"], 87);
    }

    #[test]
    fn kind_display_matches_serde_name() {
        for kind in EventKind::ALL {
            let s = serde_json::to_string(kind).unwrap();
            assert_eq!(s, format!("\"{kind}\""));
        }
    }
}
