//! Event Bus - in-process の publish / subscribe
//!
//! このモジュールはイベントの種類（EventKind）と Handler の対応付けを
//! 起動時に静的に確定させます。リフレクションや自動探索はしません。
//!
//! # 二層構造
//! - **表層（Typed）**: `Event` trait, `Handler<E>` trait - 型安全
//! - **内部（Dyn）**: `EventHandler` trait - object-safe, type erasure

pub mod builder;
pub mod dispatch;
pub mod event;
pub mod handler;

// 主要な trait/型 を再エクスポート
pub use self::builder::{BuildError, EventBusBuilder};
pub use self::dispatch::{BusError, DispatchReport, EventBus, HandlerFailure};
pub use self::event::Event;
pub use self::handler::{EventHandler, Handler, TypedHandler};
