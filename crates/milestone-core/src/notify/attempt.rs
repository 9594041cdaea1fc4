//! AttemptCompletedMail - assessment 完了を受験者に知らせる

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::Mailroom;
use crate::bus::Handler;
use crate::domain::{AttemptCompleted, HandlerError};
use crate::ports::{NotificationCategory, OutboundMail};

pub struct AttemptCompletedMail {
    mailroom: Arc<Mailroom>,
}

impl AttemptCompletedMail {
    pub const NAME: &'static str = "attempt_completed_mail";
    pub const TEMPLATE: &'static str = "assessment_completed";

    pub fn new(mailroom: Arc<Mailroom>) -> Self {
        Self { mailroom }
    }
}

#[async_trait]
impl Handler<AttemptCompleted> for AttemptCompletedMail {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, event: &AttemptCompleted) -> Result<(), HandlerError> {
        let attempt = &event.attempt;
        let Some(recipient) = self
            .mailroom
            .recipient(attempt.user_id, NotificationCategory::Assessment)
            .await
        else {
            return Ok(());
        };

        let course_title = self.mailroom.course_title(attempt.course_id).await;
        let mail = OutboundMail::new(
            recipient.address,
            self.mailroom
                .subject(&format!("Assessment completed in {course_title}")),
            Self::TEMPLATE,
            json!({
                "user_name": recipient.user.name,
                "course_title": course_title,
                "attempt_id": attempt.id.to_string(),
                "assessment_id": attempt.assessment_id.to_string(),
                "score": attempt.score,
                "completed_at": event.occurred_at.to_rfc3339(),
            }),
        );
        self.mailroom.send(mail).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssessmentId, Attempt, AttemptStatus, EventId};
    use crate::notify::mailroom::fixtures::Fixture;
    use crate::ports::Channel;
    use chrono::Utc;

    fn event(fx: &Fixture, user: &crate::domain::User) -> AttemptCompleted {
        AttemptCompleted {
            event_id: EventId::random(),
            occurred_at: Utc::now(),
            attempt: Attempt::new(AssessmentId::random(), user.id, fx.course.id)
                .with_status(AttemptStatus::Completed)
                .with_score(78),
        }
    }

    #[tokio::test]
    async fn sends_one_mail_to_the_attempt_owner() {
        let fx = Fixture::new();
        let user = fx.user("dana", Some("dana@example.com"));
        let handler = AttemptCompletedMail::new(fx.mailroom());

        handler.handle(&event(&fx, &user)).await.unwrap();

        let sent = fx.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "dana@example.com");
        assert_eq!(sent[0].template, AttemptCompletedMail::TEMPLATE);
        assert_eq!(sent[0].subject, "[LMS] Assessment completed in Intro to Rust");
        assert_eq!(sent[0].context["score"], 78);
        assert_eq!(sent[0].context["user_name"], "dana");
    }

    #[tokio::test]
    async fn missing_email_is_a_silent_noop() {
        let fx = Fixture::new();
        let user = fx.user("eve", None);
        let handler = AttemptCompletedMail::new(fx.mailroom());

        handler.handle(&event(&fx, &user)).await.unwrap();

        assert_eq!(fx.mailer.calls(), 0);
    }

    #[tokio::test]
    async fn opted_out_user_gets_nothing() {
        let fx = Fixture::new();
        let user = fx.user("frank", Some("frank@example.com"));
        fx.preferences
            .opt_out(user.id, NotificationCategory::Assessment, Channel::Mail);
        let handler = AttemptCompletedMail::new(fx.mailroom());

        handler.handle(&event(&fx, &user)).await.unwrap();

        assert_eq!(fx.mailer.calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_retried() {
        let fx = Fixture::new();
        let user = fx.user("gina", Some("gina@example.com"));
        fx.mailer.fail_for("gina@example.com");
        let handler = AttemptCompletedMail::new(fx.mailroom());

        let err = handler.handle(&event(&fx, &user)).await.unwrap_err();

        assert!(matches!(
            err,
            HandlerError::Delivery { ref recipients, .. } if recipients == &vec!["gina@example.com".to_string()]
        ));
        assert_eq!(fx.mailer.calls(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_sends_twice_without_error() {
        let fx = Fixture::new();
        let user = fx.user("hal", Some("hal@example.com"));
        let handler = AttemptCompletedMail::new(fx.mailroom());
        let event = event(&fx, &user);

        handler.handle(&event).await.unwrap();
        handler.handle(&event).await.unwrap();

        assert_eq!(fx.mailer.sent().len(), 2);
    }
}
