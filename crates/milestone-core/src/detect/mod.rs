//! Transition Detector.
//!
//! - transition: `completion_fired` の純粋な判定
//! - observer: エンティティごとに判定して DomainEvent を作る

pub mod observer;
pub mod transition;

pub use self::observer::{CompletionObserver, Observer};
pub use self::transition::{Transition, completion_fired};
