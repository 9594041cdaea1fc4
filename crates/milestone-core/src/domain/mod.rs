//! Domain model (IDs, statuses, entities, events, errors).
//!
//! - ids: ULID ベースの型付き ID
//! - status: ドメインごとの閉じた状態 enum
//! - entity: 状態を持つエンティティ（Attempt, Enrollment, Assignment, User, Course）
//! - events: completion 系のドメインイベント
//! - errors: Handler / Mail / Store のエラー

pub mod entity;
pub mod errors;
pub mod events;
pub mod ids;
pub mod status;

pub use entity::{Assignment, Attempt, Course, Enrollment, Tracked, User};
pub use errors::{HandlerError, MailError, StatusParseError, StoreError};
pub use events::{AssignmentPublished, AttemptCompleted, CourseCompleted, DomainEvent, EventKind};
pub use ids::{
    AssessmentId, AssignmentId, AttemptId, CourseId, EnrollmentId, EventId, MailId, UserId,
};
pub use status::{
    AssignmentStatus, AttemptStatus, EnrollmentStatus, Status, UserStatus, allowed_values,
};
