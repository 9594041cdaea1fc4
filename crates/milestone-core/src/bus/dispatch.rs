//! EventBus - 登録順に Handler を呼び、失敗を集約する
//!
//! # 配送の保証
//! - 同じ EventKind の Handler は登録順に 1 つずつ実行（await）する
//! - ある Handler が失敗（Err / panic）しても残りの Handler は必ず実行する
//! - 全 Handler が終わってから `DispatchReport` を返す
//!
//! テーブルは build 後は読み取り専用なので、publish 中にロックは取りません。

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::handler::EventHandler;
use crate::domain::{DomainEvent, EventId, EventKind, HandlerError};

/// テーブルの 1 行（登録済み Handler）
#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) name: String,
    pub(crate) handler: Arc<dyn EventHandler>,
}

/// 失敗した Handler 1 つ分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerFailure {
    pub handler: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: HandlerError,
}

fn serialize_display<S: serde::Serializer>(
    error: &HandlerError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// publish 1 回分の結果
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub event_id: EventId,
    pub kind: EventKind,
    /// 成功した Handler（実行順）
    pub delivered: Vec<String>,
    /// 失敗した Handler（実行順）
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    fn new(event: &DomainEvent) -> Self {
        Self {
            event_id: event.event_id(),
            kind: event.kind(),
            delivered: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_handlers(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.handler.as_str()).collect()
    }

    /// 1 つでも失敗があれば `BusError` に変換する
    pub fn into_result(self) -> Result<(), BusError> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(BusError::HandlerFailures {
                event_id: self.event_id,
                failures: self.failures,
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("{} handler(s) failed for {event_id}", .failures.len())]
    HandlerFailures {
        event_id: EventId,
        failures: Vec<HandlerFailure>,
    },
}

/// EventBus は in-process の publish 機構
///
/// `EventBusBuilder::build()` でしか作れません（起動時の静的登録）。
/// Clone は Arc のコピーなので、複数の publish 元で共有できます。
#[derive(Clone)]
pub struct EventBus {
    routes: Arc<HashMap<EventKind, Vec<Route>>>,
}

impl EventBus {
    pub(crate) fn new(routes: HashMap<EventKind, Vec<Route>>) -> Self {
        Self {
            routes: Arc::new(routes),
        }
    }

    /// 登録順の Handler 名
    pub fn handler_names(&self, kind: EventKind) -> Vec<&str> {
        self.routes
            .get(&kind)
            .map(|routes| routes.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Handler が 1 つ以上ある EventKind
    pub fn kinds(&self) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = self.routes.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// イベントを購読中の全 Handler に配送する
    pub async fn publish(&self, event: &DomainEvent) -> DispatchReport {
        let mut report = DispatchReport::new(event);
        let Some(routes) = self.routes.get(&report.kind) else {
            debug!(event_id = %report.event_id, kind = %report.kind, "no handlers registered");
            return report;
        };

        for route in routes {
            let outcome = AssertUnwindSafe(route.handler.handle(event))
                .catch_unwind()
                .await;

            let error = match outcome {
                Ok(Ok(())) => {
                    debug!(event_id = %report.event_id, handler = %route.name, "handler done");
                    report.delivered.push(route.name.clone());
                    continue;
                }
                Ok(Err(error)) => error,
                Err(panic) => HandlerError::Panicked(panic_message(panic.as_ref())),
            };

            warn!(
                event_id = %report.event_id,
                kind = %report.kind,
                handler = %route.name,
                error = %error,
                "handler failed"
            );
            report.failures.push(HandlerFailure {
                handler: route.name.clone(),
                error,
            });
        }

        report
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
