//! CourseCompletedMail - コース修了を受講者に知らせる

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::Mailroom;
use crate::bus::Handler;
use crate::domain::{CourseCompleted, HandlerError};
use crate::ports::{NotificationCategory, OutboundMail};

pub struct CourseCompletedMail {
    mailroom: Arc<Mailroom>,
}

impl CourseCompletedMail {
    pub const NAME: &'static str = "course_completed_mail";
    pub const TEMPLATE: &'static str = "course_completed";

    pub fn new(mailroom: Arc<Mailroom>) -> Self {
        Self { mailroom }
    }
}

#[async_trait]
impl Handler<CourseCompleted> for CourseCompletedMail {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, event: &CourseCompleted) -> Result<(), HandlerError> {
        let enrollment = &event.enrollment;
        let Some(recipient) = self
            .mailroom
            .recipient(enrollment.user_id, NotificationCategory::Course)
            .await
        else {
            return Ok(());
        };

        let course_title = self.mailroom.course_title(enrollment.course_id).await;
        let mail = OutboundMail::new(
            recipient.address,
            self.mailroom
                .subject(&format!("Congratulations on completing {course_title}")),
            Self::TEMPLATE,
            json!({
                "user_name": recipient.user.name,
                "course_title": course_title,
                "enrollment_id": enrollment.id.to_string(),
                "completed_at": event.occurred_at.to_rfc3339(),
            }),
        );
        self.mailroom.send(mail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Enrollment, EnrollmentStatus, EventId, UserId};
    use crate::notify::mailroom::fixtures::Fixture;
    use chrono::Utc;

    fn event(user_id: UserId, fx: &Fixture) -> CourseCompleted {
        CourseCompleted {
            event_id: EventId::random(),
            occurred_at: Utc::now(),
            enrollment: Enrollment::new(user_id, fx.course.id)
                .with_status(EnrollmentStatus::Completed)
                .with_progress(100),
        }
    }

    #[tokio::test]
    async fn congratulates_the_learner() {
        let fx = Fixture::new();
        let user = fx.user("ivy", Some("ivy@example.com"));
        let handler = CourseCompletedMail::new(fx.mailroom());

        handler.handle(&event(user.id, &fx)).await.unwrap();

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ivy@example.com");
        assert_eq!(sent[0].template, "course_completed");
        assert_eq!(sent[0].context["course_title"], "Intro to Rust");
    }

    #[tokio::test]
    async fn null_email_completes_without_send() {
        let fx = Fixture::new();
        let user = fx.user("jack", None);
        let handler = CourseCompletedMail::new(fx.mailroom());

        assert!(handler.handle(&event(user.id, &fx)).await.is_ok());
        assert_eq!(fx.mailer.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_user_completes_without_send() {
        let fx = Fixture::new();
        let handler = CourseCompletedMail::new(fx.mailroom());

        assert!(handler.handle(&event(UserId::random(), &fx)).await.is_ok());
        assert_eq!(fx.mailer.calls(), 0);
    }
}
