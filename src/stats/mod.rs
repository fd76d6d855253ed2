//! Progress and history figures derived from session records.
//!
//! Everything here is pure; the CLI renders these from daemon responses.

use chrono::NaiveDate;

use crate::types::{DailySession, DailyTarget};

/// Formats minutes as `H時間M分`, or `M分` under an hour.
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    if hours > 0 {
        format!("{}時間{}分", hours, mins)
    } else {
        format!("{}分", mins)
    }
}

/// Formats minutes as `H時間M分`, always including hours.
pub fn format_hours_minutes(minutes: u32) -> String {
    format!("{}時間{}分", minutes / 60, minutes % 60)
}

/// Formats seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

// ============================================================================
// TodayProgress
// ============================================================================

/// Today's completed work against the daily target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TodayProgress {
    pub completed: u32,
    pub target: u8,
    pub total_minutes: u32,
}

impl TodayProgress {
    /// Builds progress from today's record, if there is one.
    pub fn new(session: Option<&DailySession>, target: DailyTarget) -> Self {
        Self {
            completed: session.map_or(0, |s| s.completed_count),
            target: target.get(),
            total_minutes: session.map_or(0, |s| s.total_work_minutes),
        }
    }

    /// Share of the target reached, capped at 100.
    pub fn percent(&self) -> f64 {
        if self.target == 0 {
            return 100.0;
        }
        (f64::from(self.completed) / f64::from(self.target) * 100.0).min(100.0)
    }

    /// Work periods still needed, never negative.
    pub fn remaining(&self) -> u32 {
        u32::from(self.target).saturating_sub(self.completed)
    }

    pub fn formatted_time(&self) -> String {
        format_minutes(self.total_minutes)
    }
}

// ============================================================================
// HistorySummary
// ============================================================================

/// Totals over a list of daily records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub days: usize,
    pub total_pomodoros: u32,
    pub total_minutes: u32,
}

impl HistorySummary {
    pub fn from_sessions(sessions: &[DailySession]) -> Self {
        Self {
            days: sessions.len(),
            total_pomodoros: sessions.iter().map(|s| s.completed_count).sum(),
            total_minutes: sessions.iter().map(|s| s.total_work_minutes).sum(),
        }
    }

    /// Pomodoros per recorded day, rounded to one decimal; 0 when empty.
    pub fn average_per_day(&self) -> f64 {
        if self.days == 0 {
            return 0.0;
        }
        let average = f64::from(self.total_pomodoros) / self.days as f64;
        (average * 10.0).round() / 10.0
    }

    pub fn total_time(&self) -> String {
        format_hours_minutes(self.total_minutes)
    }
}

/// Returns true if `session` is the record for `today`.
pub fn is_today(session: &DailySession, today: NaiveDate) -> bool {
    session.date == today
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(day: u32, count: u32) -> DailySession {
        DailySession {
            id: format!("s{}", day),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            completed_count: count,
            total_work_minutes: count * 25,
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_minutes() {
            assert_eq!(format_minutes(0), "0分");
            assert_eq!(format_minutes(45), "45分");
            assert_eq!(format_minutes(60), "1時間0分");
            assert_eq!(format_minutes(125), "2時間5分");
        }

        #[test]
        fn test_format_hours_minutes() {
            assert_eq!(format_hours_minutes(45), "0時間45分");
            assert_eq!(format_hours_minutes(200), "3時間20分");
        }

        #[test]
        fn test_format_clock() {
            assert_eq!(format_clock(1500), "25:00");
            assert_eq!(format_clock(299), "04:59");
            assert_eq!(format_clock(0), "00:00");
        }
    }

    mod progress_tests {
        use super::*;

        #[test]
        fn test_no_session_is_zero() {
            let progress = TodayProgress::new(None, DailyTarget::default());
            assert_eq!(progress.completed, 0);
            assert_eq!(progress.percent(), 0.0);
            assert_eq!(progress.remaining(), 8);
            assert_eq!(progress.formatted_time(), "0分");
        }

        #[test]
        fn test_partial_progress() {
            let s = session(1, 3);
            let progress = TodayProgress::new(Some(&s), DailyTarget::new(4).unwrap());
            assert_eq!(progress.percent(), 75.0);
            assert_eq!(progress.remaining(), 1);
            assert_eq!(progress.formatted_time(), "1時間15分");
        }

        #[test]
        fn test_over_target_is_capped() {
            let s = session(1, 10);
            let progress = TodayProgress::new(Some(&s), DailyTarget::default());
            assert_eq!(progress.percent(), 100.0);
            assert_eq!(progress.remaining(), 0);
        }
    }

    mod summary_tests {
        use super::*;

        #[test]
        fn test_empty_history() {
            let summary = HistorySummary::from_sessions(&[]);
            assert_eq!(summary.total_pomodoros, 0);
            assert_eq!(summary.average_per_day(), 0.0);
            assert_eq!(summary.total_time(), "0時間0分");
        }

        #[test]
        fn test_totals_and_average() {
            let summary =
                HistorySummary::from_sessions(&[session(3, 4), session(2, 3), session(1, 3)]);
            assert_eq!(summary.total_pomodoros, 10);
            assert_eq!(summary.total_time(), "4時間10分");
            assert_eq!(summary.average_per_day(), 3.3);
        }

        #[test]
        fn test_is_today() {
            let s = session(5, 1);
            assert!(is_today(&s, NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()));
            assert!(!is_today(&s, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap()));
        }
    }
}
