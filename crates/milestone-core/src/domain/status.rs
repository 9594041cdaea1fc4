//! Status - ドメインごとの閉じた状態列挙
//!
//! 各ドメイン（Attempt / Enrollment / Assignment / User）は自分専用の enum を持ちます。
//! 文字列の比較ではなく enum で持つことで、存在しない状態を作れないようにしています。
//!
//! # wire 表現
//! serde / `as_str()` ともに snake_case（`not_started`, `in_progress`, ...）。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StatusParseError;

/// Status はドメイン状態 enum の共通インターフェース
///
/// # 終端状態
/// `terminal()` が `Some` を返すドメインだけが completion 通知の対象になります。
/// User のように終端を持たないドメインは `None` を返します。
pub trait Status: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// エラーメッセージやログで使うドメイン名（例: "attempt"）
    const DOMAIN: &'static str;

    /// 全 variant（宣言順）
    const ALL: &'static [Self];

    /// wire 上の値
    fn as_str(&self) -> &'static str;

    /// 人間向けのラベル
    fn label(&self) -> &'static str;

    /// このドメインの completion 状態
    fn terminal() -> Option<Self>;

    fn is_terminal(&self) -> bool {
        Self::terminal() == Some(*self)
    }

    /// wire 値から variant を引く
    fn parse(value: &str) -> Result<Self, StatusParseError> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| StatusParseError {
                domain: Self::DOMAIN,
                value: value.to_string(),
                allowed: allowed_values::<Self>(),
            })
    }
}

/// バリデーションルール用の許可値リスト（カンマ区切り）。
///
/// ```ignore
/// assert_eq!(allowed_values::<AttemptStatus>(), "not_started,in_progress,completed");
/// ```
pub fn allowed_values<S: Status>() -> String {
    S::ALL
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Assessment attempt lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl Status for AttemptStatus {
    const DOMAIN: &'static str = "attempt";
    const ALL: &'static [Self] = &[Self::NotStarted, Self::InProgress, Self::Completed];

    fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }

    fn terminal() -> Option<Self> {
        Some(Self::Completed)
    }
}

/// Enrollment lifecycle (user × course).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Completed,
    Dropped,
}

impl Status for EnrollmentStatus {
    const DOMAIN: &'static str = "enrollment";
    const ALL: &'static [Self] = &[Self::Pending, Self::Active, Self::Completed, Self::Dropped];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Dropped => "Dropped",
        }
    }

    fn terminal() -> Option<Self> {
        Some(Self::Completed)
    }
}

/// Assignment lifecycle. 公開（published）が通知の契機。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Draft,
    Published,
    Archived,
}

impl Status for AssignmentStatus {
    const DOMAIN: &'static str = "assignment";
    const ALL: &'static [Self] = &[Self::Draft, Self::Published, Self::Archived];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Published => "Published",
            Self::Archived => "Archived",
        }
    }

    fn terminal() -> Option<Self> {
        Some(Self::Published)
    }
}

/// Account status. 終端状態なし（通知の対象外）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Inactive,
    Banned,
}

impl Status for UserStatus {
    const DOMAIN: &'static str = "user";
    const ALL: &'static [Self] = &[Self::Pending, Self::Active, Self::Inactive, Self::Banned];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Banned => "banned",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Banned => "Banned",
        }
    }

    fn terminal() -> Option<Self> {
        None
    }
}

macro_rules! status_text {
    ($($status:ty),*) => {
        $(
            impl fmt::Display for $status {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $status {
                type Err = StatusParseError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$status as Status>::parse(s)
                }
            }
        )*
    };
}

status_text!(AttemptStatus, EnrollmentStatus, AssignmentStatus, UserStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn allowed_values_are_comma_joined_wire_values() {
        assert_eq!(
            allowed_values::<AttemptStatus>(),
            "not_started,in_progress,completed"
        );
        assert_eq!(
            allowed_values::<UserStatus>(),
            "pending,active,inactive,banned"
        );
    }

    #[rstest]
    #[case::not_started("not_started", AttemptStatus::NotStarted)]
    #[case::in_progress("in_progress", AttemptStatus::InProgress)]
    #[case::completed("completed", AttemptStatus::Completed)]
    fn attempt_status_parses_wire_value(#[case] raw: &str, #[case] expected: AttemptStatus) {
        assert_eq!(raw.parse::<AttemptStatus>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn unknown_value_reports_allowed_set() {
        let err = "finished".parse::<EnrollmentStatus>().unwrap_err();
        assert_eq!(err.domain, "enrollment");
        assert_eq!(err.value, "finished");
        assert_eq!(err.allowed, "pending,active,completed,dropped");
    }

    #[test]
    fn serde_uses_snake_case() {
        let s = serde_json::to_string(&AttemptStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");

        let back: AssignmentStatus = serde_json::from_str("\"published\"").unwrap();
        assert_eq!(back, AssignmentStatus::Published);
    }

    #[test]
    fn terminal_values_per_domain() {
        assert!(AttemptStatus::Completed.is_terminal());
        assert!(!AttemptStatus::InProgress.is_terminal());
        assert!(EnrollmentStatus::Completed.is_terminal());
        assert!(!EnrollmentStatus::Dropped.is_terminal());
        assert!(AssignmentStatus::Published.is_terminal());
        assert!(UserStatus::ALL.iter().all(|s| !s.is_terminal()));
    }
}
