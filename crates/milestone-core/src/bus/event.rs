//! Event trait - 型付きイベントの定義
//!
//! # 学習ポイント
//! - Associated Constants (`const KIND`)
//! - 閉じた enum（DomainEvent）から具体型への借用での取り出し

use crate::domain::{
    AssignmentPublished, AttemptCompleted, CourseCompleted, DomainEvent, EventKind,
};

/// Event は EventKind と具体型を対応付ける
///
/// `Handler<E>` はこの型しか受け取れないので、
/// AttemptCompleted 用の Handler を CourseCompleted に登録することはできません。
pub trait Event: Send + Sync + 'static {
    const KIND: EventKind;

    fn from_domain(event: &DomainEvent) -> Option<&Self>;
}

impl Event for AttemptCompleted {
    const KIND: EventKind = EventKind::AttemptCompleted;

    fn from_domain(event: &DomainEvent) -> Option<&Self> {
        match event {
            DomainEvent::AttemptCompleted(e) => Some(e),
            _ => None,
        }
    }
}

impl Event for CourseCompleted {
    const KIND: EventKind = EventKind::CourseCompleted;

    fn from_domain(event: &DomainEvent) -> Option<&Self> {
        match event {
            DomainEvent::CourseCompleted(e) => Some(e),
            _ => None,
        }
    }
}

impl Event for AssignmentPublished {
    const KIND: EventKind = EventKind::AssignmentPublished;

    fn from_domain(event: &DomainEvent) -> Option<&Self> {
        match event {
            DomainEvent::AssignmentPublished(e) => Some(e),
            _ => None,
        }
    }
}
