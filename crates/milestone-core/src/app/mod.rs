//! App - アプリケーション層
//!
//! ports・Observer・Bus を組み合わせて、永続化層から呼ばれる入口を作ります。
//!
//! # 主要コンポーネント
//! - **NotifierBuilder**: ワイヤリングと起動時検証
//! - **Notifier**: `*_saved(before, after)` フック

pub mod builder;
pub mod notifier;

pub use self::builder::{NotifierBuildError, NotifierBuilder};
pub use self::notifier::Notifier;
