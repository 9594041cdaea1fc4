//! Mailroom - メール系 Handler が共有する宛先解決と送信

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CourseId, HandlerError, User, UserId};
use crate::ports::{
    Channel, CourseCatalog, MailTransport, NotificationCategory, OutboundMail, PreferenceGate,
    UserDirectory,
};

/// 件名などの見た目に関する設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    /// 件名の先頭に付ける文字列（例: "[Milestone] "）
    #[serde(default)]
    pub subject_prefix: String,
}

/// 送信先 1 人分
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user: User,
    pub address: String,
}

pub struct Mailroom {
    directory: Arc<dyn UserDirectory>,
    catalog: Arc<dyn CourseCatalog>,
    preferences: Arc<dyn PreferenceGate>,
    transport: Arc<dyn MailTransport>,
    settings: MailSettings,
}

impl Mailroom {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        catalog: Arc<dyn CourseCatalog>,
        preferences: Arc<dyn PreferenceGate>,
        transport: Arc<dyn MailTransport>,
        settings: MailSettings,
    ) -> Self {
        Self {
            directory,
            catalog,
            preferences,
            transport,
            settings,
        }
    }

    /// 宛先を解決する。送らない場合は `None`（エラーではない）。
    ///
    /// - ユーザーが見つからない
    /// - アドレスが未設定・空
    /// - 通知設定で opt-out している
    pub async fn recipient(
        &self,
        user_id: UserId,
        category: NotificationCategory,
    ) -> Option<Recipient> {
        let Some(user) = self.directory.find_user(user_id).await else {
            debug!(user = %user_id, "skip mail: unknown user");
            return None;
        };
        let Some(address) = user.contact_address().map(str::to_string) else {
            debug!(user = %user_id, "skip mail: no contact address");
            return None;
        };
        if !self
            .preferences
            .should_notify(user_id, category, Channel::Mail)
            .await
        {
            debug!(user = %user_id, %category, "skip mail: opted out");
            return None;
        }
        Some(Recipient { user, address })
    }

    /// 件名用のコース名。見つからなければ ID をそのまま使う。
    pub async fn course_title(&self, course_id: CourseId) -> String {
        match self.catalog.find_course(course_id).await {
            Some(course) => course.title,
            None => course_id.to_string(),
        }
    }

    pub fn subject(&self, text: &str) -> String {
        format!("{}{}", self.settings.subject_prefix, text)
    }

    pub async fn send(&self, mail: OutboundMail) -> Result<(), HandlerError> {
        self.transport
            .send(&mail)
            .await
            .map_err(|e| HandlerError::delivery(&mail.to, &e))?;
        debug!(to = %mail.to, template = %mail.template, "mail handed to transport");
        Ok(())
    }
}
