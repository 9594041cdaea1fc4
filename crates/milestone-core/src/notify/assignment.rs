//! AssignmentPublishedMail - 課題の公開をコースの受講者全員に知らせる
//!
//! 宛先ごとの失敗は全員に送り終わってからまとめて 1 つのエラーにします。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::Mailroom;
use crate::bus::Handler;
use crate::domain::{AssignmentPublished, HandlerError};
use crate::ports::{NotificationCategory, OutboundMail, Roster};

pub struct AssignmentPublishedMail {
    mailroom: Arc<Mailroom>,
    roster: Arc<dyn Roster>,
}

impl AssignmentPublishedMail {
    pub const NAME: &'static str = "assignment_published_mail";
    pub const TEMPLATE: &'static str = "assignment_published";

    pub fn new(mailroom: Arc<Mailroom>, roster: Arc<dyn Roster>) -> Self {
        Self { mailroom, roster }
    }
}

#[async_trait]
impl Handler<AssignmentPublished> for AssignmentPublishedMail {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn handle(&self, event: &AssignmentPublished) -> Result<(), HandlerError> {
        let assignment = &event.assignment;
        let learners = self.roster.enrolled_users(assignment.course_id).await;
        if learners.is_empty() {
            debug!(assignment = %assignment.id, "no learners enrolled");
            return Ok(());
        }

        let course_title = self.mailroom.course_title(assignment.course_id).await;
        let subject = self
            .mailroom
            .subject(&format!("New assignment in {course_title}: {}", assignment.title));
        let due_at = assignment.due_at.map(|at| at.to_rfc3339());

        let mut failed = Vec::new();
        let mut reasons = Vec::new();
        for user_id in learners {
            let Some(recipient) = self
                .mailroom
                .recipient(user_id, NotificationCategory::Assignment)
                .await
            else {
                continue;
            };

            let mail = OutboundMail::new(
                recipient.address,
                subject.clone(),
                Self::TEMPLATE,
                json!({
                    "user_name": recipient.user.name,
                    "course_title": course_title,
                    "assignment_id": assignment.id.to_string(),
                    "assignment_title": assignment.title,
                    "due_at": due_at,
                }),
            );
            match self.mailroom.send(mail).await {
                Ok(()) => {}
                Err(HandlerError::Delivery { recipients, reason }) => {
                    failed.extend(recipients);
                    reasons.push(reason);
                }
                Err(other) => {
                    failed.push(user_id.to_string());
                    reasons.push(other.to_string());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(HandlerError::Delivery {
                recipients: failed,
                reason: reasons.join("; "),
            })
        }
    }
}
