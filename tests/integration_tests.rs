//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests run a real daemon on a temporary socket and drive it through
//! the CLI's `IpcClient`:
//! - Timer control via IPC
//! - Status and today's progress queries
//! - Daily target get/set, including rejected values
//! - Sign-in/sign-out
//! - Connection error handling

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::time::{timeout, Duration};

use pomodoro_sync::cli::client::IpcClient;
use pomodoro_sync::context::{CurrentUser, FixedClock};
use pomodoro_sync::daemon::Daemon;
use pomodoro_sync::store::{MemoryStore, SessionStore};
use pomodoro_sync::types::{DailyTarget, IpcRequest, TimerMode, UserId};

// ============================================================================
// Test Helpers
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

struct Harness {
    _dir: tempfile::TempDir,
    socket_path: PathBuf,
    daemon: Daemon<MemoryStore>,
    store: Arc<MemoryStore>,
}

/// Creates a daemon on a temporary socket.
fn create_harness(user: Option<&str>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("integration_test.sock");
    let store = Arc::new(MemoryStore::new());
    let current = CurrentUser::new(user.map(|u| UserId::new(u).unwrap()));
    let clock = Arc::new(FixedClock::new(today()));
    let daemon = Daemon::new(&socket_path, Arc::clone(&store), current, clock).unwrap();
    Harness {
        _dir: dir,
        socket_path,
        daemon,
        store,
    }
}

/// Runs `client` against the daemon and returns its output.
async fn with_daemon<T>(daemon: Daemon<MemoryStore>, client: impl Future<Output = T>) -> T {
    let run = daemon.run(std::future::pending());
    let guarded = timeout(Duration::from_secs(10), client);
    tokio::select! {
        result = run => panic!("daemon stopped early: {:?}", result.err()),
        output = guarded => output.expect("client timed out"),
    }
}

// ============================================================================
// Timer Control via IPC
// ============================================================================

/// タイマー開始（IPC経由）
///
/// 前提条件: Daemon起動中
/// 期待結果: タイマーが開始され、2回目の開始は状態を変えない
#[tokio::test]
async fn test_timer_start_via_ipc() {
    let harness = create_harness(Some("alice"));
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let (first, second) = with_daemon(harness.daemon, async {
        (client.start().await.unwrap(), client.start().await.unwrap())
    })
    .await;

    assert_eq!(first.message, "タイマーを開始しました");
    let timer = first.data.unwrap().timer.unwrap();
    assert!(timer.is_running);
    assert_eq!(timer.mode, TimerMode::Work);

    assert_eq!(second.message, "タイマーは既に実行中です");
}

/// 一時停止・切り替え・リセット（IPC経由）
#[tokio::test]
async fn test_pause_switch_reset_via_ipc() {
    let harness = create_harness(None);
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let (paused, switched, reset) = with_daemon(harness.daemon, async {
        client.toggle().await.unwrap();
        let paused = client.pause().await.unwrap();
        let switched = client.switch(TimerMode::Break).await.unwrap();
        client.start().await.unwrap();
        let reset = client.reset().await.unwrap();
        (paused, switched, reset)
    })
    .await;

    assert!(!paused.data.unwrap().timer.unwrap().is_running);
    assert_eq!(switched.message, "休憩モードに切り替えました");

    let timer = reset.data.unwrap().timer.unwrap();
    assert_eq!(timer.mode, TimerMode::Break);
    assert_eq!(timer.remaining_seconds, 300);
    assert!(!timer.is_running);
}

// ============================================================================
// Queries
// ============================================================================

/// ステータス・今日の進捗の取得
///
/// 前提条件: 今日の記録 (3, 75) と目標 4 が保存済み
/// 期待結果: 記録と目標がレスポンスに含まれる
#[tokio::test]
async fn test_status_and_today_via_ipc() {
    let harness = create_harness(Some("alice"));
    let alice = UserId::new("alice").unwrap();
    harness
        .store
        .create_session(&alice, today(), 3, 75)
        .await
        .unwrap();
    harness.store.set_daily_target(&alice, 4).await.unwrap();
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let (status, today_response) = with_daemon(harness.daemon, async {
        // Startup load runs in the background; refetch makes it deterministic
        client.refetch().await.unwrap();
        (client.status().await.unwrap(), client.today().await.unwrap())
    })
    .await;

    let timer = status.data.unwrap().timer.unwrap();
    assert_eq!(timer.completed_pomodoros, 3);
    assert!(timer.signed_in);

    let data = today_response.data.unwrap();
    assert_eq!(data.daily_target, Some(4));
    let session = data.today_session.unwrap();
    assert_eq!(
        (session.completed_count, session.total_work_minutes),
        (3, 75)
    );
}

/// 履歴の取得（新しい順、件数制限）
#[tokio::test]
async fn test_history_via_ipc() {
    let harness = create_harness(Some("alice"));
    let alice = UserId::new("alice").unwrap();
    for day in 1..=5 {
        harness
            .store
            .create_session(
                &alice,
                NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                day,
                day * 25,
            )
            .await
            .unwrap();
    }
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let response = with_daemon(harness.daemon, client.history(3)).await.unwrap();

    let history = response.data.unwrap().history.unwrap();
    let days: Vec<u32> = history.iter().map(|s| s.completed_count).collect();
    assert_eq!(days, vec![5, 4, 3]);
}

// ============================================================================
// Daily Target
// ============================================================================

/// 目標の設定と取得
#[tokio::test]
async fn test_target_set_and_get_via_ipc() {
    let harness = create_harness(Some("alice"));
    let store = Arc::clone(&harness.store);
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let (before, set, after) = with_daemon(harness.daemon, async {
        let before = client.get_target().await.unwrap();
        let set = client
            .set_target(DailyTarget::new(12).unwrap())
            .await
            .unwrap();
        let after = client.get_target().await.unwrap();
        (before, set, after)
    })
    .await;

    assert_eq!(before.data.unwrap().daily_target, Some(8));
    assert_eq!(set.message, "1日の目標を12ポモドーロに設定しました");
    assert_eq!(after.data.unwrap().daily_target, Some(12));
    assert_eq!(
        store
            .get_daily_target(&UserId::new("alice").unwrap())
            .await
            .unwrap(),
        Some(12)
    );
}

/// 範囲外の目標はDaemon側でも拒否される
#[tokio::test]
async fn test_out_of_range_target_rejected_by_daemon() {
    let harness = create_harness(Some("alice"));
    let store = Arc::clone(&harness.store);
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let result = with_daemon(
        harness.daemon,
        client.send(&IpcRequest::SetTarget { target: 0 }),
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "目標は1〜20の範囲で設定してください");
    assert_eq!(
        store
            .get_daily_target(&UserId::new("alice").unwrap())
            .await
            .unwrap(),
        None
    );
}

// ============================================================================
// Sign-in / Sign-out
// ============================================================================

/// サインインで今日の記録が読み込まれ、サインアウトで消える
#[tokio::test]
async fn test_sign_in_and_out_via_ipc() {
    let harness = create_harness(None);
    harness
        .store
        .create_session(&UserId::new("bob").unwrap(), today(), 2, 50)
        .await
        .unwrap();
    let client = IpcClient::with_socket_path(harness.socket_path.clone());

    let (signed_in, signed_out) = with_daemon(harness.daemon, async {
        let signed_in = client.sign_in("bob").await.unwrap();
        client.sign_out().await.unwrap();
        (signed_in, client.today().await.unwrap())
    })
    .await;

    let data = signed_in.data.unwrap();
    assert_eq!(data.today_session.map(|s| s.completed_count), Some(2));

    let data = signed_out.data.unwrap();
    assert!(data.today_session.is_none());
    assert!(!data.timer.unwrap().signed_in);
}

// ============================================================================
// Connection Errors
// ============================================================================

/// 接続エラーハンドリング
///
/// 前提条件: Daemon未起動
/// 期待結果: 接続エラーが返る
#[tokio::test(start_paused = true)]
async fn test_connection_error_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock"));

    let err = client.status().await.unwrap_err();

    assert!(err.to_string().contains("Daemonに接続できません"));
}
