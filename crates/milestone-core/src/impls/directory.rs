//! InMemoryDirectory - 開発・テスト用のユーザー / コース / 受講者ストア
//!
//! UserDirectory, CourseCatalog, Roster の 3 つを 1 つの構造体で実装します。

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::{Course, CourseId, Enrollment, EnrollmentStatus, User, UserId};
use crate::ports::{CourseCatalog, Roster, UserDirectory};

#[derive(Default)]
struct DirectoryState {
    users: HashMap<UserId, User>,
    courses: HashMap<CourseId, Course>,
    /// course -> 登録順の enrollment
    enrollments: HashMap<CourseId, Vec<Enrollment>>,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.users.insert(user.id, user);
    }

    pub fn insert_course(&self, course: Course) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.courses.insert(course.id, course);
    }

    /// 同じ enrollment id がすでにあれば置き換える
    pub fn upsert_enrollment(&self, enrollment: Enrollment) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let list = state.enrollments.entry(enrollment.course_id).or_default();
        match list.iter_mut().find(|e| e.id == enrollment.id) {
            Some(existing) => *existing = enrollment,
            None => list.push(enrollment),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, user_id: UserId) -> Option<User> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.users.get(&user_id).cloned()
    }
}

#[async_trait]
impl CourseCatalog for InMemoryDirectory {
    async fn find_course(&self, course_id: CourseId) -> Option<Course> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.courses.get(&course_id).cloned()
    }
}

#[async_trait]
impl Roster for InMemoryDirectory {
    async fn enrolled_users(&self, course_id: CourseId) -> Vec<UserId> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .enrollments
            .get(&course_id)
            .map(|list| {
                list.iter()
                    .filter(|e| e.status != EnrollmentStatus::Dropped)
                    .map(|e| e.user_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}
