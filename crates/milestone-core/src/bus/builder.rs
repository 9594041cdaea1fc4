//! EventBusBuilder - Handler の静的登録
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - HashMap<EventKind, Vec<_>> で登録順を保ったまま型消去された Handler を管理

use std::collections::HashMap;
use std::sync::Arc;

use super::dispatch::{EventBus, Route};
use super::event::Event;
use super::handler::{EventHandler, Handler, TypedHandler};
use crate::domain::EventKind;

/// EventBusBuilder は起動時に Handler を登録する
///
/// # 使用例
/// ```ignore
/// let bus = EventBusBuilder::new()
///     .register_typed::<AttemptCompleted, _>(AttemptCompletedMail::new(..))?
///     .register(Arc::new(AchievementRecorder::new(..)))?
///     .expect_kinds(EventKind::ALL)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 同じ kind に同じ名前の Handler を 2 回登録したら `DuplicateHandler`
/// - expect_kinds() に挙げた kind に Handler が 1 つもなければ build() が `MissingHandlers`
#[derive(Default)]
pub struct EventBusBuilder {
    routes: HashMap<EventKind, Vec<Route>>,
    expected_kinds: Option<Vec<EventKind>>,
}

/// BuildError は Bus 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Handler '{handler}' is already registered for {kind}")]
    DuplicateHandler { kind: EventKind, handler: String },

    #[error("Handler '{0}' does not subscribe to any event kind")]
    NoSubscriptions(String),

    #[error("Missing handlers for event kinds: {0:?}. These kinds were expected but have no handler.")]
    MissingHandlers(Vec<EventKind>),
}

impl EventBusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// object-safe な Handler を `kinds()` の全 kind に登録
    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Result<Self, BuildError> {
        let name = handler.name().to_string();
        let kinds = handler.kinds();
        if kinds.is_empty() {
            return Err(BuildError::NoSubscriptions(name));
        }

        for kind in &kinds {
            let exists = self
                .routes
                .get(kind)
                .is_some_and(|routes| routes.iter().any(|r| r.name == name));
            if exists {
                return Err(BuildError::DuplicateHandler {
                    kind: *kind,
                    handler: name,
                });
            }
        }

        for kind in kinds {
            self.routes.entry(kind).or_default().push(Route {
                name: name.clone(),
                handler: Arc::clone(&handler),
            });
        }
        Ok(self)
    }

    /// 型付き Handler を `E::KIND` に登録
    pub fn register_typed<E: Event, H: Handler<E> + 'static>(
        self,
        handler: H,
    ) -> Result<Self, BuildError> {
        self.register(Arc::new(TypedHandler::<E, H>::new(handler)))
    }

    /// 少なくとも 1 つの Handler を持つべき kind を設定
    pub fn expect_kinds(mut self, kinds: &[EventKind]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    pub fn build(self) -> Result<EventBus, BuildError> {
        if let Some(expected) = &self.expected_kinds {
            let missing: Vec<EventKind> = expected
                .iter()
                .filter(|kind| self.routes.get(kind).is_none_or(|routes| routes.is_empty()))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingHandlers(missing));
            }
        }
        Ok(EventBus::new(self.routes))
    }
}
