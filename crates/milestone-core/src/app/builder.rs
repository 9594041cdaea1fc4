//! NotifierBuilder - ports / Observer / Bus のワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 足りない port や Handler のない EventKind は build() で落とす

use std::sync::Arc;

use super::notifier::Notifier;
use crate::bus::{BuildError, EventBusBuilder, EventHandler};
use crate::detect::CompletionObserver;
use crate::domain::{AssignmentPublished, AttemptCompleted, CourseCompleted, EventKind};
use crate::notify::{
    AchievementRecorder, AssignmentPublishedMail, AttemptCompletedMail, CourseCompletedMail,
    MailSettings, Mailroom,
};
use crate::ports::{
    AchievementStore, AllowAll, Clock, CourseCatalog, IdGenerator, MailTransport, PreferenceGate,
    Roster, SystemClock, UlidGenerator, UserDirectory,
};

/// NotifierBuilder は Notifier を構築
///
/// # 使用例
/// ```ignore
/// let notifier = NotifierBuilder::new()
///     .with_directory(directory)
///     .transport(Arc::new(LogMailer::new("no-reply@lms.example")))
///     .achievements(Arc::new(InMemoryAchievements::new()))
///     .build()?;
/// ```
///
/// # 登録される Handler（この順番で実行）
/// 1. 組み込みのメール Handler（kind ごとに 1 つ）
/// 2. `achievements()` を渡した場合は AchievementRecorder
/// 3. `handler()` で追加したもの（追加順）
pub struct NotifierBuilder {
    directory: Option<Arc<dyn UserDirectory>>,
    catalog: Option<Arc<dyn CourseCatalog>>,
    roster: Option<Arc<dyn Roster>>,
    preferences: Arc<dyn PreferenceGate>,
    transport: Option<Arc<dyn MailTransport>>,
    achievements: Option<Arc<dyn AchievementStore>>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    settings: MailSettings,
    extra: Vec<Arc<dyn EventHandler>>,
}

/// Notifier 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum NotifierBuildError {
    #[error("missing port: {0}")]
    MissingPort(&'static str),

    #[error(transparent)]
    Bus(#[from] BuildError),
}

impl NotifierBuilder {
    pub fn new() -> Self {
        Self {
            directory: None,
            catalog: None,
            roster: None,
            preferences: Arc::new(AllowAll),
            transport: None,
            achievements: None,
            clock: Arc::new(SystemClock),
            ids: None,
            settings: MailSettings::default(),
            extra: Vec::new(),
        }
    }

    /// 1 つの実装が directory / catalog / roster を全部持っている場合の近道
    pub fn with_directory<D>(self, directory: Arc<D>) -> Self
    where
        D: UserDirectory + CourseCatalog + Roster + 'static,
    {
        self.directory(directory.clone())
            .catalog(directory.clone())
            .roster(directory)
    }

    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn catalog(mut self, catalog: Arc<dyn CourseCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn roster(mut self, roster: Arc<dyn Roster>) -> Self {
        self.roster = Some(roster);
        self
    }

    /// デフォルトは AllowAll
    pub fn preferences(mut self, preferences: Arc<dyn PreferenceGate>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn achievements(mut self, store: Arc<dyn AchievementStore>) -> Self {
        self.achievements = Some(store);
        self
    }

    /// デフォルトは SystemClock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// デフォルトは clock を使う UlidGenerator
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn mail_settings(mut self, settings: MailSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 組み込み Handler の後ろに追加で登録する
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.extra.push(handler);
        self
    }

    pub fn build(self) -> Result<Notifier, NotifierBuildError> {
        let directory = self
            .directory
            .ok_or(NotifierBuildError::MissingPort("user directory"))?;
        let catalog = self
            .catalog
            .ok_or(NotifierBuildError::MissingPort("course catalog"))?;
        let roster = self.roster.ok_or(NotifierBuildError::MissingPort("roster"))?;
        let transport = self
            .transport
            .ok_or(NotifierBuildError::MissingPort("mail transport"))?;

        let mailroom = Arc::new(Mailroom::new(
            directory,
            catalog,
            self.preferences,
            transport,
            self.settings,
        ));

        let mut bus = EventBusBuilder::new()
            .register_typed::<AttemptCompleted, _>(AttemptCompletedMail::new(mailroom.clone()))?
            .register_typed::<CourseCompleted, _>(CourseCompletedMail::new(mailroom.clone()))?
            .register_typed::<AssignmentPublished, _>(AssignmentPublishedMail::new(
                mailroom, roster,
            ))?;
        if let Some(store) = self.achievements {
            bus = bus.register(Arc::new(AchievementRecorder::new(store)))?;
        }
        for handler in self.extra {
            bus = bus.register(handler)?;
        }
        let bus = bus.expect_kinds(EventKind::ALL).build()?;

        let clock = self.clock;
        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(Arc::clone(&clock))),
        };
        Ok(Notifier::new(CompletionObserver::new(ids, clock), bus))
    }
}

impl Default for NotifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}
