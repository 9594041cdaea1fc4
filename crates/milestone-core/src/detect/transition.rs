//! Transition - before/after の状態ペアから completion の「辺」を判定する
//!
//! 純粋関数のみ（副作用なし）。

use std::fmt;

use crate::domain::Status;

/// completion が発火したか？
///
/// 発火条件（すべて満たす場合のみ）:
/// 1. 状態が実際に変わった
/// 2. 新しい状態がドメインの終端状態
/// 3. 古い状態はまだ終端ではない
///
/// `before == None`（最初から終端状態で作成された）は発火しない。
/// 終端状態のまま再保存された場合も発火しない。
pub fn completion_fired<S: Status>(before: Option<S>, after: S) -> bool {
    let Some(before) = before else {
        return false;
    };
    before != after && after.is_terminal() && !before.is_terminal()
}

/// 状態遷移 1 回分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S: Status> {
    pub from: Option<S>,
    pub to: S,
}

impl<S: Status> Transition<S> {
    pub fn new(from: Option<S>, to: S) -> Self {
        Self { from, to }
    }

    pub fn changed(&self) -> bool {
        self.from != Some(self.to)
    }

    pub fn fires(&self) -> bool {
        completion_fired(self.from, self.to)
    }
}

impl<S: Status> fmt::Display for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            Some(from) => write!(f, "{} -> {}", from.as_str(), self.to.as_str()),
            None => write!(f, "(new) -> {}", self.to.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentStatus, AttemptStatus, EnrollmentStatus, UserStatus};
    use rstest::rstest;

    #[rstest]
    #[case::not_started(AttemptStatus::NotStarted)]
    #[case::in_progress(AttemptStatus::InProgress)]
    #[case::completed(AttemptStatus::Completed)]
    fn same_status_never_fires(#[case] status: AttemptStatus) {
        assert!(!completion_fired(Some(status), status));
    }

    #[rstest]
    #[case::to_not_started(AttemptStatus::NotStarted)]
    #[case::to_in_progress(AttemptStatus::InProgress)]
    #[case::stays(AttemptStatus::Completed)]
    fn already_terminal_never_fires_again(#[case] after: AttemptStatus) {
        assert!(!completion_fired(Some(AttemptStatus::Completed), after));
    }

    #[rstest]
    #[case::attempt(completion_fired(None, AttemptStatus::Completed))]
    #[case::enrollment(completion_fired(None, EnrollmentStatus::Completed))]
    #[case::assignment(completion_fired(None, AssignmentStatus::Published))]
    fn created_terminal_does_not_fire(#[case] fired: bool) {
        assert!(!fired);
    }

    #[rstest]
    #[case::from_not_started(AttemptStatus::NotStarted)]
    #[case::from_in_progress(AttemptStatus::InProgress)]
    fn forward_edge_into_terminal_fires(#[case] before: AttemptStatus) {
        assert!(completion_fired(Some(before), AttemptStatus::Completed));
    }

    #[rstest]
    #[case::pending_to_active(EnrollmentStatus::Pending, EnrollmentStatus::Active, false)]
    #[case::active_to_completed(EnrollmentStatus::Active, EnrollmentStatus::Completed, true)]
    #[case::active_to_dropped(EnrollmentStatus::Active, EnrollmentStatus::Dropped, false)]
    #[case::dropped_to_completed(EnrollmentStatus::Dropped, EnrollmentStatus::Completed, true)]
    #[case::completed_to_dropped(EnrollmentStatus::Completed, EnrollmentStatus::Dropped, false)]
    fn enrollment_matrix(
        #[case] before: EnrollmentStatus,
        #[case] after: EnrollmentStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(completion_fired(Some(before), after), expected);
    }

    #[test]
    fn assignment_publication_is_the_edge() {
        assert!(completion_fired(
            Some(AssignmentStatus::Draft),
            AssignmentStatus::Published
        ));
        assert!(!completion_fired(
            Some(AssignmentStatus::Published),
            AssignmentStatus::Archived
        ));
    }

    #[test]
    fn domain_without_terminal_never_fires() {
        for &before in UserStatus::ALL {
            for &after in UserStatus::ALL {
                assert!(!completion_fired(Some(before), after));
            }
        }
    }

    #[test]
    fn transition_display() {
        let t = Transition::new(Some(AttemptStatus::InProgress), AttemptStatus::Completed);
        assert_eq!(t.to_string(), "in_progress -> completed");
        assert!(t.fires());
        assert!(t.changed());

        let created = Transition::new(None, AttemptStatus::Completed);
        assert_eq!(created.to_string(), "(new) -> completed");
        assert!(!created.fires());
        assert!(created.changed());

        let resaved = Transition::new(Some(AttemptStatus::Completed), AttemptStatus::Completed);
        assert!(!resaved.changed());
        assert!(!resaved.fires());
    }
}
