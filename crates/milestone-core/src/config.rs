//! Configuration loaded from a TOML file.
//!
//! ```toml
//! log_filter = "info,milestone_core=debug"
//!
//! [mail]
//! from = "no-reply@lms.example"
//! subject_prefix = "[LMS] "
//!
//! [queue]
//! enabled = true
//! workers = 4
//! max_attempts = 5
//! base_delay_ms = 2000
//! multiplier = 2.0
//! max_delay_ms = 3600000
//! ```
//!
//! すべての項目にデフォルトがあるので、空ファイルでも読めます。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notify::MailSettings;
use crate::queue::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilestoneConfig {
    /// `RUST_LOG` が無いときの tracing filter
    pub log_filter: String,
    pub mail: MailConfig,
    pub queue: QueueConfig,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            mail: MailConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
    pub subject_prefix: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "no-reply@milestone.local".to_string(),
            subject_prefix: String::new(),
        }
    }
}

/// 送信をキュー経由にするかどうかと、そのリトライ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub enabled: bool,
    pub workers: usize,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    /// 1 回の backoff の上限
    pub max_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: 2,
            max_attempts: 5,
            base_delay_ms: 2_000,
            multiplier: 2.0,
            max_delay_ms: 3_600_000,
        }
    }
}

impl QueueConfig {
    pub const MAX_ATTEMPTS: u32 = 100;
    pub const MAX_MULTIPLIER: f64 = 100.0;
    /// 7 日
    pub const MAX_DELAY_MS: u64 = 7 * 24 * 60 * 60 * 1_000;

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            self.multiplier,
            self.max_attempts,
        )
        .with_max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

impl MilestoneConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MilestoneConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            subject_prefix: self.mail.subject_prefix.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mail.from.trim().is_empty() {
            return Err(ConfigError::Validation("mail.from must not be empty".into()));
        }
        if self.queue.enabled && self.queue.workers == 0 {
            return Err(ConfigError::Validation(
                "queue.workers must be at least 1 when the queue is enabled".into(),
            ));
        }
        let queue = &self.queue;
        if queue.max_attempts == 0 || queue.max_attempts > QueueConfig::MAX_ATTEMPTS {
            return Err(ConfigError::Validation(format!(
                "queue.max_attempts must be between 1 and {} (got {})",
                QueueConfig::MAX_ATTEMPTS,
                queue.max_attempts
            )));
        }
        if !queue.multiplier.is_finite()
            || queue.multiplier < 1.0
            || queue.multiplier > QueueConfig::MAX_MULTIPLIER
        {
            return Err(ConfigError::Validation(format!(
                "queue.multiplier must be between 1.0 and {} (got {})",
                QueueConfig::MAX_MULTIPLIER,
                queue.multiplier
            )));
        }
        if queue.max_delay_ms > QueueConfig::MAX_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "queue.max_delay_ms must be at most {} (got {})",
                QueueConfig::MAX_DELAY_MS,
                queue.max_delay_ms
            )));
        }
        if queue.base_delay_ms > queue.max_delay_ms {
            return Err(ConfigError::Validation(format!(
                "queue.base_delay_ms ({}) must not exceed queue.max_delay_ms ({})",
                queue.base_delay_ms, queue.max_delay_ms
            )));
        }
        Ok(())
    }
}
