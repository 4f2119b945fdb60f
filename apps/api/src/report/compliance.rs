//! Time-log compliance for issues in the progress lane.
//!
//! Only `Status::Progress` issues are inspected. Every other lane reports
//! clean so that dashboards do not raise alerts for work that is not
//! actively tracked.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::models::issue::Note;
use crate::report::classify::CanonicalStatus;

/// How many notes the scan inspects, newest first as delivered by the source.
pub const NOTE_SCAN_LIMIT: usize = 20;

/// Matches the date suffix of GitLab's system time-log notes,
/// e.g. "added 2h of time spent at 2024-06-01".
static TIME_LOG_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at (\d{4}-\d{2}-\d{2})").expect("time log pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceFlags {
    /// Any time at all has been logged on the issue.
    pub has_time_stats: bool,
    /// A time log landed within the compliance window (today or yesterday).
    pub is_daily_compliant: bool,
}

impl ComplianceFlags {
    /// Issues outside the progress lane are exempt: both checks pass without
    /// looking at the data.
    pub fn exempt() -> Self {
        Self {
            has_time_stats: true,
            is_daily_compliant: true,
        }
    }
}

/// Evaluates both compliance flags for one issue. `today` is the wall-clock
/// date at report-generation time, injected so the fold stays deterministic.
pub fn evaluate_compliance(
    status: &CanonicalStatus,
    total_time_spent: i64,
    notes: &[Note],
    today: NaiveDate,
) -> ComplianceFlags {
    if *status != CanonicalStatus::Progress {
        return ComplianceFlags::exempt();
    }

    ComplianceFlags {
        has_time_stats: total_time_spent > 0,
        is_daily_compliant: has_recent_time_log(notes, today),
    }
}

/// Scans the most recent notes for a system-generated "added ... of time
/// spent" entry dated today or yesterday. Stops at the first hit. Notes with
/// unparseable dates are skipped, not treated as violations.
fn has_recent_time_log(notes: &[Note], today: NaiveDate) -> bool {
    let yesterday = today - Duration::days(1);
    notes
        .iter()
        .take(NOTE_SCAN_LIMIT)
        .filter(|note| note.system)
        .filter(|note| note.body.contains("added") && note.body.contains("of time spent"))
        .filter_map(time_log_date)
        .any(|logged| logged == today || logged == yesterday)
}

/// The date a time log applies to: the explicit `at YYYY-MM-DD` suffix when
/// present and parseable, else the note's creation date.
fn time_log_date(note: &Note) -> Option<NaiveDate> {
    let explicit = TIME_LOG_DATE_RE
        .captures(&note.body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok());
    if explicit.is_some() {
        return explicit;
    }

    note.created_at
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}
