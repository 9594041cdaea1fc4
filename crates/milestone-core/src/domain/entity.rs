//! Entities with status.
//!
//! These are plain records owned by the persistence layer. This crate never
//! loads or saves them; it only looks at `before`/`after` snapshots handed over
//! by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AssessmentId, AssignmentId, AttemptId, CourseId, EnrollmentId, UserId};
use super::status::{AssignmentStatus, AttemptStatus, EnrollmentStatus, Status, UserStatus};

/// Tracked は「状態フィールドを 1 つ持つ」エンティティ
///
/// Transition Detector が見るのは `status()` だけです。
/// 他のフィールドが同時に変わっていても判定には影響しません。
pub trait Tracked {
    type Status: Status;

    fn status(&self) -> Self::Status;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub status: UserStatus,
}

impl User {
    pub fn new(name: impl Into<String>, email: Option<&str>) -> Self {
        Self {
            id: UserId::random(),
            name: name.into(),
            email: email.map(str::to_string),
            status: UserStatus::Active,
        }
    }

    /// 送信先アドレス。未設定・空白のみの場合は `None`。
    pub fn contact_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }
}

impl Tracked for User {
    type Status = UserStatus;

    fn status(&self) -> UserStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: CourseId::random(),
            title: title.into(),
        }
    }
}

/// One learner's attempt at an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub assessment_id: AssessmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: AttemptStatus,
    pub score: Option<u32>,
}

impl Attempt {
    pub fn new(assessment_id: AssessmentId, user_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: AttemptId::random(),
            assessment_id,
            user_id,
            course_id,
            status: AttemptStatus::NotStarted,
            score: None,
        }
    }

    pub fn with_status(mut self, status: AttemptStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }
}

impl Tracked for Attempt {
    type Status = AttemptStatus;

    fn status(&self) -> AttemptStatus {
        self.status
    }
}

/// User × Course. `completed` になったらコース修了。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub progress_percent: u8,
}

impl Enrollment {
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: EnrollmentId::random(),
            user_id,
            course_id,
            status: EnrollmentStatus::Pending,
            progress_percent: 0,
        }
    }

    pub fn with_status(mut self, status: EnrollmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_progress(mut self, progress_percent: u8) -> Self {
        self.progress_percent = progress_percent.min(100);
        self
    }
}

impl Tracked for Enrollment {
    type Status = EnrollmentStatus;

    fn status(&self) -> EnrollmentStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub course_id: CourseId,
    pub title: String,
    pub status: AssignmentStatus,
    pub due_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(course_id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id: AssignmentId::random(),
            course_id,
            title: title.into(),
            status: AssignmentStatus::Draft,
            due_at: None,
        }
    }

    pub fn with_status(mut self, status: AssignmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }
}

impl Tracked for Assignment {
    type Status = AssignmentStatus;

    fn status(&self) -> AssignmentStatus {
        self.status
    }
}
