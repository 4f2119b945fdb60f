//! Overdue detection, restricted to the actively-worked lane.

use chrono::NaiveDate;

use crate::models::issue::IssueState;
use crate::report::classify::CanonicalStatus;

/// An issue is overdue only when it is still open, sits in
/// `Status::Progress`, and its due date parses and lies strictly in the past.
/// Any other lane is never flagged, past due date or not; unparseable dates
/// count as not overdue.
pub fn evaluate_overdue(
    due_date: Option<&str>,
    state: IssueState,
    status: &CanonicalStatus,
    today: NaiveDate,
) -> bool {
    if state != IssueState::Opened || *status != CanonicalStatus::Progress {
        return false;
    }

    due_date
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .is_some_and(|due| due < today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_progress_issue_past_due_is_overdue() {
        assert!(evaluate_overdue(
            Some("2024-06-01"),
            IssueState::Opened,
            &CanonicalStatus::Progress,
            day(2024, 6, 2),
        ));
    }

    #[test]
    fn test_merge_request_lane_is_never_overdue() {
        assert!(!evaluate_overdue(
            Some("2024-06-01"),
            IssueState::Opened,
            &CanonicalStatus::MergeRequest,
            day(2024, 6, 2),
        ));
    }

    #[test]
    fn test_closed_issue_is_never_overdue() {
        assert!(!evaluate_overdue(
            Some("2024-06-01"),
            IssueState::Closed,
            &CanonicalStatus::Progress,
            day(2024, 6, 2),
        ));
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        assert!(!evaluate_overdue(
            Some("2024-06-02"),
            IssueState::Opened,
            &CanonicalStatus::Progress,
            day(2024, 6, 2),
        ));
    }

    #[test]
    fn test_missing_due_date_is_not_overdue() {
        assert!(!evaluate_overdue(
            None,
            IssueState::Opened,
            &CanonicalStatus::Progress,
            day(2024, 6, 2),
        ));
    }

    #[test]
    fn test_unparseable_due_date_is_not_overdue() {
        assert!(!evaluate_overdue(
            Some("soon"),
            IssueState::Opened,
            &CanonicalStatus::Progress,
            day(2024, 6, 2),
        ));
    }
}
