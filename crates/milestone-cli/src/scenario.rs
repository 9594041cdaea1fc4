//! デモ用のシナリオと seed データ

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use clap::ValueEnum;
use milestone_core::Notifier;
use milestone_core::bus::DispatchReport;
use milestone_core::domain::{
    AssessmentId, Assignment, AssignmentStatus, Attempt, AttemptStatus, Course, Enrollment,
    EnrollmentStatus, MailError, User,
};
use milestone_core::impls::InMemoryDirectory;
use milestone_core::ports::{MailTransport, OutboundMail};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// in_progress -> completed の attempt
    Attempt,
    /// メールアドレスのない受講者のコース修了
    Course,
    /// 課題の公開（受講者全員へ）
    Assignment,
    /// completed の attempt を再保存（何も起きない）
    Resave,
    All,
}

impl Scenario {
    fn expand(self) -> Vec<Scenario> {
        match self {
            Scenario::All => vec![
                Scenario::Attempt,
                Scenario::Course,
                Scenario::Assignment,
                Scenario::Resave,
            ],
            one => vec![one],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Scenario::Attempt => "attempt",
            Scenario::Course => "course",
            Scenario::Assignment => "assignment",
            Scenario::Resave => "resave",
            Scenario::All => "all",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub scenario: &'static str,
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DispatchReport>,
}

pub struct World {
    pub directory: Arc<InMemoryDirectory>,
    pub course: Course,
    pub ada: User,
    pub grace: User,
    pub quiet: User,
}

impl World {
    pub fn seed() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let course = Course::new("Intro to Rust");
        let ada = User::new("Ada", Some("ada@example.com"));
        let grace = User::new("Grace", Some("grace@example.com"));
        let quiet = User::new("Quiet Learner", None);

        directory.insert_course(course.clone());
        for user in [&ada, &grace, &quiet] {
            directory.insert_user(user.clone());
            directory.upsert_enrollment(
                Enrollment::new(user.id, course.id).with_status(EnrollmentStatus::Active),
            );
        }

        Self {
            directory,
            course,
            ada,
            grace,
            quiet,
        }
    }
}

pub async fn run(notifier: &Notifier, world: &World, scenario: Scenario) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    for scenario in scenario.expand() {
        let report = match scenario {
            Scenario::Attempt => {
                let before = Attempt::new(AssessmentId::random(), world.ada.id, world.course.id)
                    .with_status(AttemptStatus::InProgress);
                let after = before.clone().with_status(AttemptStatus::Completed).with_score(88);
                notifier.attempt_saved(Some(&before), &after).await
            }
            Scenario::Course => {
                let before = Enrollment::new(world.quiet.id, world.course.id)
                    .with_status(EnrollmentStatus::Active)
                    .with_progress(95);
                let after = before
                    .clone()
                    .with_status(EnrollmentStatus::Completed)
                    .with_progress(100);
                notifier.enrollment_saved(Some(&before), &after).await
            }
            Scenario::Assignment => {
                let draft = Assignment::new(world.course.id, "Lifetimes worksheet");
                let published = draft.clone().with_status(AssignmentStatus::Published);
                notifier.assignment_saved(Some(&draft), &published).await
            }
            Scenario::Resave => {
                let completed = Attempt::new(AssessmentId::random(), world.grace.id, world.course.id)
                    .with_status(AttemptStatus::Completed)
                    .with_score(70);
                let regraded = completed.clone().with_score(75);
                notifier.attempt_saved(Some(&completed), &regraded).await
            }
            Scenario::All => None,
        };
        outcomes.push(Outcome {
            scenario: scenario.name(),
            detected: report.is_some(),
            report,
        });
    }
    outcomes
}

/// 最初の N 回だけ失敗させる transport（リトライの様子を見る用）
pub struct FlakyTransport<T> {
    inner: T,
    remaining_failures: AtomicU32,
}

impl<T> FlakyTransport<T> {
    pub fn new(inner: T, failures: u32) -> Self {
        Self {
            inner,
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl<T: MailTransport> MailTransport for FlakyTransport<T> {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        let left = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if let Ok(left) = left {
            return Err(MailError::Transport(format!(
                "intentional failure (left={left})"
            )));
        }
        self.inner.send(mail).await
    }
}
