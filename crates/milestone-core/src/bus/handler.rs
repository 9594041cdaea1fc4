//! Handler traits - Bus から呼ばれる Handler の定義
//!
//! # 二層構造
//! - **表層（Typed）**: `Handler<E>` - 1 種類のイベントだけを受け取る
//! - **内部（Dyn）**: `EventHandler` - object-safe, 複数種類を受け取れる
//!
//! `TypedHandler<E, H>` が `Handler<E>` を `EventHandler` に変換します（type erasure）。

use std::marker::PhantomData;

use async_trait::async_trait;

use super::event::Event;
use crate::domain::{DomainEvent, EventKind, HandlerError};

/// EventHandler は object-safe な Handler
///
/// `Arc<dyn EventHandler>` として Bus のテーブルに格納されます。
/// Handler は元のエンティティを変更しません（イベントは借用で渡る）。
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 失敗レポートに載る名前。同じ kind の中で一意であること。
    fn name(&self) -> &str;

    /// 購読する EventKind
    fn kinds(&self) -> Vec<EventKind>;

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// Handler は 1 種類のイベントを処理する
///
/// # 使用例
/// ```ignore
/// struct Congratulate;
///
/// #[async_trait]
/// impl Handler<AttemptCompleted> for Congratulate {
///     fn name(&self) -> &str { "congratulate" }
///
///     async fn handle(&self, event: &AttemptCompleted) -> Result<(), HandlerError> {
///         println!("well done: {}", event.attempt.user_id);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<E: Event>: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

pub struct TypedHandler<E: Event, H: Handler<E>> {
    handler: H,
    _marker: PhantomData<fn(&E)>,
}

impl<E: Event, H: Handler<E>> TypedHandler<E, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Event, H: Handler<E>> EventHandler for TypedHandler<E, H> {
    fn name(&self) -> &str {
        self.handler.name()
    }

    fn kinds(&self) -> Vec<EventKind> {
        vec![E::KIND]
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let Some(typed) = E::from_domain(event) else {
            return Err(HandlerError::Other(format!(
                "{} cannot handle {}",
                self.handler.name(),
                event.kind()
            )));
        };
        self.handler.handle(typed).await
    }
}
