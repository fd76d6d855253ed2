//! Display utilities for the Pomodoro timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Timer status
//! - Today's progress and the history table
//!
//! Each `show_*` prints what the matching `render_*` returns.

use chrono::{Local, NaiveDate};

use crate::stats::{format_clock, is_today, HistorySummary, TodayProgress};
use crate::types::{
    DailySession, DailyTarget, IpcResponse, TimerMode, TimerSnapshot, Toast, ToastLevel,
};

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message and the timer line, if any.
    pub fn show_control(response: &IpcResponse) {
        print!("{}", Self::render_control(response));
    }

    pub fn render_control(response: &IpcResponse) -> String {
        let mut out = format!("* {}\n", response.message);
        if let Some(timer) = response.data.as_ref().and_then(|d| d.timer.as_ref()) {
            out.push_str(&format!("  {}\n", Self::timer_line(timer)));
        }
        out
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        print!("{}", Self::render_status(response));
    }

    pub fn render_status(response: &IpcResponse) -> String {
        let mut out = String::from("ポモドーロタイマー ステータス\n");
        out.push_str("─────────────────────────────\n");

        let Some(data) = &response.data else {
            out.push_str("タイマーは起動していません\n");
            return out;
        };

        if let Some(timer) = &data.timer {
            let state = if timer.is_running {
                "実行中"
            } else {
                "停止中"
            };
            out.push_str(&format!("モード: {} ({})\n", timer.mode.label(), state));
            out.push_str(&format!("残り時間: {}\n", format_clock(timer.remaining_seconds)));
            out.push_str(&format!(
                "進捗: {} {:.0}%\n",
                Self::bar(timer.progress_percent),
                timer.progress_percent
            ));
            out.push_str(&format!("今日のポモドーロ: {}\n", timer.completed_pomodoros));
            if !timer.signed_in {
                out.push_str("(サインインしていないため記録されません)\n");
            }
        }

        if let Some(notices) = data.notices.as_ref().filter(|n| !n.is_empty()) {
            out.push_str("\n最近の通知:\n");
            for notice in notices {
                out.push_str(&format!("  {}\n", Self::notice_line(notice)));
            }
        }
        out
    }

    /// Shows today's progress against the daily target.
    pub fn show_today(response: &IpcResponse) {
        print!("{}", Self::render_today(response));
    }

    pub fn render_today(response: &IpcResponse) -> String {
        let data = response.data.as_ref();
        let session = data.and_then(|d| d.today_session.as_ref());
        let target = data
            .and_then(|d| d.daily_target)
            .and_then(|t| DailyTarget::new(t).ok())
            .unwrap_or_default();
        let signed_in = data
            .and_then(|d| d.timer.as_ref())
            .is_some_and(|t| t.signed_in);

        let progress = TodayProgress::new(session, target);

        let mut out = String::from("今日の進捗\n");
        out.push_str("─────────────────────────────\n");
        out.push_str(&format!(
            "完了: {} / {} ポモドーロ\n",
            progress.completed, progress.target
        ));
        out.push_str(&format!(
            "{} {:.0}%\n",
            Self::bar(progress.percent()),
            progress.percent()
        ));
        out.push_str(&format!("作業時間: {}\n", progress.formatted_time()));
        if progress.remaining() == 0 {
            out.push_str("今日の目標を達成しました！\n");
        } else {
            out.push_str(&format!("目標まであと {} ポモドーロ\n", progress.remaining()));
        }
        if !signed_in {
            out.push_str("(サインインしていません)\n");
        }
        out
    }

    /// Shows the history table with totals.
    pub fn show_history(response: &IpcResponse) {
        let today = Local::now().date_naive();
        print!("{}", Self::render_history(response, today));
    }

    pub fn render_history(response: &IpcResponse, today: NaiveDate) -> String {
        let sessions: &[DailySession] = response
            .data
            .as_ref()
            .and_then(|d| d.history.as_deref())
            .unwrap_or(&[]);

        let mut out = String::from("履歴\n");
        out.push_str("─────────────────────────────\n");
        if sessions.is_empty() {
            out.push_str("記録がありません\n");
            return out;
        }

        for session in sessions {
            let marker = if is_today(session, today) {
                " 今日"
            } else {
                ""
            };
            out.push_str(&format!(
                "{}  {:>2} ポモドーロ  {:>4}分{}\n",
                session.date, session.completed_count, session.total_work_minutes, marker
            ));
        }

        let summary = HistorySummary::from_sessions(sessions);
        out.push_str("─────────────────────────────\n");
        out.push_str(&format!("合計: {} ポモドーロ\n", summary.total_pomodoros));
        out.push_str(&format!("合計時間: {}\n", summary.total_time()));
        out.push_str(&format!("1日平均: {:.1} ポモドーロ\n", summary.average_per_day()));
        out
    }

    /// Shows the daily target.
    pub fn show_target(response: &IpcResponse) {
        let target = response
            .data
            .as_ref()
            .and_then(|d| d.daily_target)
            .unwrap_or_else(|| DailyTarget::default().get());
        println!("1日の目標: {} ポモドーロ", target);
    }

    /// Shows a plain success message.
    pub fn show_message(response: &IpcResponse) {
        println!("* {}", response.message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn timer_line(timer: &TimerSnapshot) -> String {
        let icon = match (timer.mode, timer.is_running) {
            (_, false) => "||",
            (TimerMode::Work, true) => ">",
            (TimerMode::Break, true) => "~",
        };
        format!(
            "{} {} {}",
            icon,
            timer.mode.label(),
            format_clock(timer.remaining_seconds)
        )
    }

    fn notice_line(toast: &Toast) -> String {
        let prefix = match toast.level {
            ToastLevel::Info => "i",
            ToastLevel::Error => "!",
        };
        if toast.body.is_empty() {
            format!("[{}] {}", prefix, toast.title)
        } else {
            format!("[{}] {}: {}", prefix, toast.title, toast.body)
        }
    }

    fn bar(percent: f64) -> String {
        let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
        format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
    }
}

// ============================================================================
// Tests
// ============================================================================
