//! Domain identifiers (strongly-typed IDs).
//!
//! すべての ID は ULID ベースで、`Id<T>` という 1 つのジェネリック型に
//! マーカー型 `T` を組み合わせて作ります。
//!
//! ## Phantom Type パターン
//! `T` は実行時には使わない（PhantomData）マーカー型です。
//! `UserId` と `CourseId` は同じ 16 bytes ですが、型としては混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"user-", "course-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    /// 現在時刻ベースの新しい ID。
    ///
    /// イベント ID のように時刻を差し替えたい場合は `IdGenerator` を使ってください。
    pub fn random() -> Self {
        Self::from_ulid(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

macro_rules! id_marker {
    ($(#[$doc:meta])* $marker:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn prefix() -> &'static str {
                $prefix
            }
        }
    };
}

id_marker!(
    /// User のマーカー型
    User,
    "user-"
);
id_marker!(
    /// Course のマーカー型
    Course,
    "course-"
);
id_marker!(
    /// Assessment (quiz / exam) のマーカー型
    Assessment,
    "assessment-"
);
id_marker!(
    /// Attempt のマーカー型
    Attempt,
    "attempt-"
);
id_marker!(
    /// Enrollment のマーカー型
    Enrollment,
    "enrollment-"
);
id_marker!(
    /// Assignment のマーカー型
    Assignment,
    "assignment-"
);
id_marker!(
    /// DomainEvent のマーカー型
    Event,
    "event-"
);
id_marker!(
    /// 送信キューに積まれたメールのマーカー型
    Mail,
    "mail-"
);

// ========================================
// Type Alias（使いやすさのため）
// ========================================

/// Identifier of a learner / instructor account.
pub type UserId = Id<User>;

/// Identifier of a course.
pub type CourseId = Id<Course>;

/// Identifier of an assessment (the thing being attempted).
pub type AssessmentId = Id<Assessment>;

/// Identifier of one attempt at an assessment.
pub type AttemptId = Id<Attempt>;

/// Identifier of a user/course enrollment.
pub type EnrollmentId = Id<Enrollment>;

/// Identifier of an assignment.
pub type AssignmentId = Id<Assignment>;

/// Identity of a published completion event.
pub type EventId = Id<Event>;

/// Identifier of an outbound mail sitting in the delivery queue.
pub type MailId = Id<Mail>;
