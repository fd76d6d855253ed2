//! End-to-End Tests for Pomodoro Sync.
//!
//! These tests run the daemon's event loop on a paused clock and verify
//! complete user workflows:
//! - A full work period recorded as (1, 25)
//! - Two completions on one date aggregated into one record
//! - A new date starting an independent record
//! - A failing store leaving the timer usable
//! - Break completions not recorded

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::Duration;

use pomodoro_sync::context::{CurrentUser, FixedClock};
use pomodoro_sync::daemon::{Daemon, NoticeBoard, TimerController};
use pomodoro_sync::store::MemoryStore;
use pomodoro_sync::types::{ToastLevel, UserId, BREAK_DURATION_SECS, WORK_DURATION_SECS};
use pomodoro_sync::TimerMode;

// ============================================================================
// Test Helpers
// ============================================================================

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn alice() -> UserId {
    UserId::new("alice").unwrap()
}

struct Scenario {
    _dir: tempfile::TempDir,
    daemon: Daemon<MemoryStore>,
    controller: Arc<Mutex<TimerController<MemoryStore>>>,
    notices: NoticeBoard,
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
}

fn create_scenario() -> Scenario {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(day(10)));
    let daemon = Daemon::new(
        &dir.path().join("e2e_test.sock"),
        Arc::clone(&store),
        CurrentUser::new(Some(alice())),
        clock.clone(),
    )
    .unwrap();
    Scenario {
        _dir: dir,
        controller: daemon.controller(),
        notices: daemon.notices(),
        daemon,
        store,
        clock,
    }
}

/// Runs `steps` while the daemon loop handles events.
async fn drive(daemon: Daemon<MemoryStore>, steps: impl Future<Output = ()>) {
    tokio::select! {
        _ = daemon.run(std::future::pending()) => panic!("daemon stopped early"),
        () = steps => {}
    }
}

/// Starts the countdown and waits past the end of a full `mode` period.
async fn run_period(controller: &Mutex<TimerController<MemoryStore>>, mode: TimerMode) {
    {
        let mut controller = controller.lock().await;
        controller.switch_mode(mode).await;
        assert!(controller.start().await);
    }
    let seconds = u64::from(mode.duration_seconds());
    tokio::time::sleep(Duration::from_millis(seconds * 1000 + 500)).await;
    // Let the dispatched store write finish
    tokio::time::sleep(Duration::from_millis(10)).await;
}

// ============================================================================
// Complete work period
// ============================================================================

/// 作業時間の完了
///
/// 前提条件: 作業モード・停止中・残り1500秒、今日の記録なし
/// テスト手順: 開始して1500秒経過
/// 期待結果: 休憩モード・停止中・残り300秒、記録 (1, 25)
#[tokio::test(start_paused = true)]
async fn test_complete_work_period() {
    let s = create_scenario();
    let controller = Arc::clone(&s.controller);

    drive(s.daemon, async {
        {
            let state = controller.lock().await.state().await;
            assert_eq!(state.mode, TimerMode::Work);
            assert_eq!(state.remaining_seconds, WORK_DURATION_SECS);
            assert!(!state.is_running);
        }
        run_period(&controller, TimerMode::Work).await;
    })
    .await;

    let mut controller = s.controller.lock().await;
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.mode, TimerMode::Break);
    assert_eq!(snapshot.remaining_seconds, BREAK_DURATION_SECS);
    assert!(!snapshot.is_running);
    assert_eq!(snapshot.completed_pomodoros, 1);

    let sessions = s.store.sessions_for(&alice()).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].date, day(10));
    assert_eq!(
        (sessions[0].completed_count, sessions[0].total_work_minutes),
        (1, 25)
    );

    assert!(s
        .notices
        .recent()
        .iter()
        .any(|t| t.title == "作業時間完了！"));
}

// ============================================================================
// Aggregation per date
// ============================================================================

/// 同じ日の2回の完了は1件の記録 (2, 50) にまとめられる
#[tokio::test(start_paused = true)]
async fn test_two_completions_same_date() {
    let s = create_scenario();
    let controller = Arc::clone(&s.controller);

    drive(s.daemon, async {
        run_period(&controller, TimerMode::Work).await;
        run_period(&controller, TimerMode::Work).await;
    })
    .await;

    let sessions = s.store.sessions_for(&alice()).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(
        (sessions[0].completed_count, sessions[0].total_work_minutes),
        (2, 50)
    );
    assert_eq!(s.controller.lock().await.completed_pomodoros(), 2);
}

/// 日付が変わると新しい独立した記録が作られる
#[tokio::test(start_paused = true)]
async fn test_next_date_starts_new_record() {
    let s = create_scenario();
    let controller = Arc::clone(&s.controller);
    let clock = Arc::clone(&s.clock);

    drive(s.daemon, async {
        run_period(&controller, TimerMode::Work).await;
        clock.advance_day();
        run_period(&controller, TimerMode::Work).await;
    })
    .await;

    let sessions = s.store.sessions_for(&alice()).await;
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].date, day(10));
    assert_eq!(sessions[1].date, day(11));
    assert_eq!(sessions[0].completed_count, 1);
    assert_eq!(sessions[1].completed_count, 1);
}

// ============================================================================
// Store failures
// ============================================================================

/// 保存に失敗してもタイマーは動き続け、エラー通知が残る
#[tokio::test(start_paused = true)]
async fn test_store_failure_does_not_block_timer() {
    let s = create_scenario();
    s.store.set_should_fail(true);
    let controller = Arc::clone(&s.controller);

    drive(s.daemon, async {
        run_period(&controller, TimerMode::Work).await;

        let mut controller = controller.lock().await;
        assert!(controller.start().await);
        let snapshot = controller.snapshot().await;
        assert!(snapshot.is_running);
        assert_eq!(snapshot.mode, TimerMode::Break);
        assert_eq!(snapshot.completed_pomodoros, 1);
        drop(controller);

        // Let the loop move the failure toast onto the notice board
        tokio::time::sleep(Duration::from_millis(10)).await;
    })
    .await;

    let notices = s.notices.recent();
    assert!(notices
        .iter()
        .any(|t| t.level == ToastLevel::Error && t.body == "セッションの保存に失敗しました。"));
    assert_eq!(s.store.write_count(), 0);
}

/// 休憩の完了は記録されない
#[tokio::test(start_paused = true)]
async fn test_break_completion_not_recorded() {
    let s = create_scenario();
    let controller = Arc::clone(&s.controller);

    drive(s.daemon, async {
        run_period(&controller, TimerMode::Break).await;
    })
    .await;

    assert_eq!(s.store.write_count(), 0);
    let state = s.controller.lock().await.state().await;
    assert_eq!(state.mode, TimerMode::Work);
    assert_eq!(state.remaining_seconds, WORK_DURATION_SECS);
    assert!(s
        .notices
        .recent()
        .iter()
        .any(|t| t.title == "休憩時間完了！"));
}
