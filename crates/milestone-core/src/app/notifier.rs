//! Notifier - 永続化層から呼ばれる入口
//!
//! 保存のたびに `*_saved(before, after)` を呼んでもらい、
//! completion の遷移があったときだけ Bus に publish します。
//! Handler の失敗は呼び出し元（保存処理）には伝播させません。

use tracing::{info, warn};

use crate::bus::{DispatchReport, EventBus};
use crate::detect::{CompletionObserver, Observer};
use crate::domain::{Assignment, Attempt, DomainEvent, Enrollment};

pub struct Notifier {
    observer: CompletionObserver,
    bus: EventBus,
}

impl Notifier {
    pub(crate) fn new(observer: CompletionObserver, bus: EventBus) -> Self {
        Self { observer, bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Attempt の保存後に呼ぶ。`before` は新規作成なら `None`。
    ///
    /// 戻り値が `None` なら検出なし（何も起きていない）。
    pub async fn attempt_saved(
        &self,
        before: Option<&Attempt>,
        after: &Attempt,
    ) -> Option<DispatchReport> {
        let event = self.observer.observe(before, after)?;
        Some(self.publish(&event).await)
    }

    pub async fn enrollment_saved(
        &self,
        before: Option<&Enrollment>,
        after: &Enrollment,
    ) -> Option<DispatchReport> {
        let event = self.observer.observe(before, after)?;
        Some(self.publish(&event).await)
    }

    pub async fn assignment_saved(
        &self,
        before: Option<&Assignment>,
        after: &Assignment,
    ) -> Option<DispatchReport> {
        let event = self.observer.observe(before, after)?;
        Some(self.publish(&event).await)
    }

    /// 検出済みのイベントをそのまま配送する（再送や手動トリガー用）
    pub async fn publish(&self, event: &DomainEvent) -> DispatchReport {
        info!(
            event_id = %event.event_id(),
            kind = %event.kind(),
            course = %event.course_id(),
            "publishing event"
        );
        let report = self.bus.publish(event).await;
        if !report.is_clean() {
            warn!(
                event_id = %report.event_id,
                kind = %report.kind,
                failed = ?report.failed_handlers(),
                delivered = report.delivered.len(),
                "event delivered with handler failures"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::app::NotifierBuilder;
    use crate::domain::{
        AssessmentId, AssignmentStatus, AttemptStatus, Course, EnrollmentStatus, EventKind,
        HandlerError, User,
    };
    use crate::impls::{InMemoryAchievements, InMemoryDirectory, RecordingMailer};
    use crate::notify::{AchievementRecorder, AttemptCompletedMail, MailSettings};
    use crate::ports::{AchievementKind, SystemClock, UlidGenerator};
    use crate::queue::{InMemoryMailQueue, MailQueue, QueuedMailTransport, RetryPolicy};
    use crate::worker::MailWorkerGroup;

    struct World {
        directory: Arc<InMemoryDirectory>,
        mailer: Arc<RecordingMailer>,
        achievements: Arc<InMemoryAchievements>,
        course: Course,
        learner: User,
    }

    impl World {
        fn new() -> Self {
            let directory = Arc::new(InMemoryDirectory::new());
            let course = Course::new("Intro to Rust");
            directory.insert_course(course.clone());
            let learner = User::new("Ada", Some("ada@example.com"));
            directory.insert_user(learner.clone());
            Self {
                directory,
                mailer: Arc::new(RecordingMailer::new()),
                achievements: Arc::new(InMemoryAchievements::new()),
                course,
                learner,
            }
        }

        fn notifier(&self) -> Notifier {
            NotifierBuilder::new()
                .with_directory(self.directory.clone())
                .transport(self.mailer.clone())
                .achievements(self.achievements.clone())
                .mail_settings(MailSettings {
                    subject_prefix: "[LMS] ".to_string(),
                })
                .build()
                .unwrap()
        }

        fn attempt(&self, status: AttemptStatus) -> Attempt {
            Attempt::new(AssessmentId::random(), self.learner.id, self.course.id)
                .with_status(status)
        }
    }

    #[tokio::test]
    async fn attempt_completion_sends_exactly_one_mail_to_owner() {
        let world = World::new();
        let notifier = world.notifier();
        let before = world.attempt(AttemptStatus::InProgress);
        let after = before.clone().with_status(AttemptStatus::Completed).with_score(92);

        let report = notifier.attempt_saved(Some(&before), &after).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.kind, EventKind::AttemptCompleted);
        let sent = world.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].template, AttemptCompletedMail::TEMPLATE);
        assert_eq!(world.achievements.len(), 1);
    }

    #[tokio::test]
    async fn resaving_a_completed_attempt_does_nothing() {
        let world = World::new();
        let notifier = world.notifier();
        let completed = world.attempt(AttemptStatus::Completed).with_score(50);
        let edited = completed.clone().with_score(60);

        assert!(notifier.attempt_saved(Some(&completed), &edited).await.is_none());
        assert_eq!(world.mailer.calls(), 0);
        assert!(world.achievements.is_empty());
    }

    #[tokio::test]
    async fn created_already_completed_does_not_fire() {
        let world = World::new();
        let notifier = world.notifier();
        let created = world.attempt(AttemptStatus::Completed);

        assert!(notifier.attempt_saved(None, &created).await.is_none());
        assert_eq!(world.mailer.calls(), 0);
    }

    #[tokio::test]
    async fn course_completion_without_email_is_silent_success() {
        let world = World::new();
        let quiet = User::new("Quiet", None);
        world.directory.insert_user(quiet.clone());
        let notifier = world.notifier();

        let before = Enrollment::new(quiet.id, world.course.id)
            .with_status(EnrollmentStatus::Active)
            .with_progress(90);
        let after = before
            .clone()
            .with_status(EnrollmentStatus::Completed)
            .with_progress(100);

        let report = notifier.enrollment_saved(Some(&before), &after).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(world.mailer.calls(), 0);
        let awarded = world.achievements.for_user(quiet.id);
        assert_eq!(awarded.len(), 1);
        assert_eq!(awarded[0].kind, AchievementKind::CourseCompleted);
    }

    #[tokio::test]
    async fn mail_failure_is_reported_and_later_handlers_still_run() {
        let world = World::new();
        world.mailer.fail_for("ada@example.com");
        let notifier = world.notifier();
        let before = world.attempt(AttemptStatus::InProgress);
        let after = before.clone().with_status(AttemptStatus::Completed).with_score(10);

        let report = notifier.attempt_saved(Some(&before), &after).await.unwrap();

        assert_eq!(report.failed_handlers(), vec![AttemptCompletedMail::NAME]);
        assert_eq!(report.delivered, vec![AchievementRecorder::NAME]);
        assert!(matches!(
            report.failures[0].error,
            HandlerError::Delivery { .. }
        ));
        assert_eq!(world.achievements.len(), 1);
    }

    #[tokio::test]
    async fn assignment_publication_reaches_the_roster() {
        let world = World::new();
        world.directory.upsert_enrollment(
            Enrollment::new(world.learner.id, world.course.id).with_status(EnrollmentStatus::Active),
        );
        let notifier = world.notifier();
        let draft = Assignment::new(world.course.id, "Borrow checker drills");
        let published = draft.clone().with_status(AssignmentStatus::Published);

        let report = notifier.assignment_saved(Some(&draft), &published).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(world.mailer.sent().len(), 1);
        assert!(world.achievements.is_empty());
    }

    #[tokio::test]
    async fn queued_transport_delivers_through_workers() {
        let world = World::new();
        let queue = Arc::new(InMemoryMailQueue::new(
            RetryPolicy::new(Duration::from_millis(5), 1.0, 3),
            Arc::new(UlidGenerator::new(SystemClock)),
        ));
        let notifier = NotifierBuilder::new()
            .with_directory(world.directory.clone())
            .transport(Arc::new(QueuedMailTransport::new(queue.clone())))
            .build()
            .unwrap();
        let workers = MailWorkerGroup::spawn(2, queue.clone(), world.mailer.clone());

        let before = world.attempt(AttemptStatus::InProgress);
        let after = before.clone().with_status(AttemptStatus::Completed);
        let report = notifier.attempt_saved(Some(&before), &after).await.unwrap();
        assert!(report.is_clean());

        tokio::time::timeout(Duration::from_secs(2), async {
            while !queue.counts_by_state().await.is_settled() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        workers.shutdown_and_join().await;

        assert_eq!(queue.counts_by_state().await.succeeded, 1);
        assert_eq!(world.mailer.sent()[0].to, "ada@example.com");
    }
}
