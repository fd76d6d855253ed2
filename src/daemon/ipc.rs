//! IPC server for the Pomodoro timer daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - One JSON request and one JSON response per connection
//! - Request dispatch to the timer controller, reconciler and settings

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::settings::{SettingsError, SettingsService};
use crate::store::SessionStore;
use crate::types::{IpcRequest, IpcResponse, ResponseData, TimerMode, Toast, UserId};

use super::controller::TimerController;
use super::reconciler::SessionReconciler;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Number of recent toasts kept for `status`
pub const NOTICE_CAPACITY: usize = 10;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// The client closed the connection without sending anything
    #[error("Connection closed by client")]
    EmptyRequest,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Binds the server to `socket_path`.
    ///
    /// A stale socket file is removed first and the parent directory is
    /// created if needed.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one request, up to end of stream or [`MAX_REQUEST_SIZE`].
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(512);
        let mut limited = (&mut *stream).take(MAX_REQUEST_SIZE as u64 + 1);

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            read_request(&mut limited, &mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            return Err(IpcError::EmptyRequest.into());
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;
        stream
            .shutdown()
            .await
            .context("Failed to close response stream")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

/// Reads until a complete JSON value arrives or the client closes its side.
async fn read_request<R>(reader: &mut R, buffer: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncReadExt + Unpin,
{
    let mut chunk = [0u8; 1024];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);
        if serde_json::from_slice::<serde_json::Value>(buffer).is_ok() {
            return Ok(());
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// NoticeBoard
// ============================================================================

/// The most recent in-app toasts, oldest first.
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Arc<StdMutex<VecDeque<Toast>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a toast, dropping the oldest beyond [`NOTICE_CAPACITY`].
    pub fn push(&self, toast: Toast) {
        if let Ok(mut notices) = self.notices.lock() {
            if notices.len() == NOTICE_CAPACITY {
                notices.pop_front();
            }
            notices.push_back(toast);
        }
    }

    pub fn recent(&self) -> Vec<Toast> {
        self.notices
            .lock()
            .map(|notices| notices.iter().cloned().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests against the daemon's components.
pub struct RequestHandler<S: SessionStore> {
    controller: Arc<Mutex<TimerController<S>>>,
    reconciler: SessionReconciler<S>,
    settings: SettingsService<S>,
    notices: NoticeBoard,
}

impl<S: SessionStore> RequestHandler<S> {
    pub fn new(
        controller: Arc<Mutex<TimerController<S>>>,
        reconciler: SessionReconciler<S>,
        settings: SettingsService<S>,
        notices: NoticeBoard,
    ) -> Self {
        Self {
            controller,
            reconciler,
            settings,
            notices,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        debug!("Handling request: {:?}", request);
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Toggle => self.handle_toggle().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Switch { mode } => self.handle_switch(mode).await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Today => self.handle_today().await,
            IpcRequest::Refetch => self.handle_refetch().await,
            IpcRequest::History { limit } => self.handle_history(limit).await,
            IpcRequest::GetTarget => self.handle_get_target().await,
            IpcRequest::SetTarget { target } => self.handle_set_target(target).await,
            IpcRequest::SignIn { user_id } => self.handle_sign_in(user_id).await,
            IpcRequest::SignOut => self.handle_sign_out().await,
        }
    }

    async fn timer_data(&self) -> ResponseData {
        let mut controller = self.controller.lock().await;
        ResponseData {
            timer: Some(controller.snapshot().await),
            today_session: self.reconciler.today_session(),
            ..Default::default()
        }
    }

    async fn handle_start(&self) -> IpcResponse {
        let started = self.controller.lock().await.start().await;
        let message = if started {
            "タイマーを開始しました"
        } else {
            "タイマーは既に実行中です"
        };
        IpcResponse::success(message, Some(self.timer_data().await))
    }

    async fn handle_pause(&self) -> IpcResponse {
        let paused = self.controller.lock().await.pause().await;
        let message = if paused {
            "タイマーを一時停止しました"
        } else {
            "タイマーは既に停止しています"
        };
        IpcResponse::success(message, Some(self.timer_data().await))
    }

    async fn handle_toggle(&self) -> IpcResponse {
        let running = self.controller.lock().await.toggle().await;
        let message = if running {
            "タイマーを開始しました"
        } else {
            "タイマーを一時停止しました"
        };
        IpcResponse::success(message, Some(self.timer_data().await))
    }

    async fn handle_reset(&self) -> IpcResponse {
        self.controller.lock().await.reset().await;
        IpcResponse::success("タイマーをリセットしました", Some(self.timer_data().await))
    }

    async fn handle_switch(&self, mode: TimerMode) -> IpcResponse {
        self.controller.lock().await.switch_mode(mode).await;
        IpcResponse::success(
            format!("{}モードに切り替えました", mode.label()),
            Some(self.timer_data().await),
        )
    }

    async fn handle_status(&self) -> IpcResponse {
        let mut data = self.timer_data().await;
        data.notices = Some(self.notices.recent());
        IpcResponse::success("", Some(data))
    }

    async fn handle_today(&self) -> IpcResponse {
        let target = match self.settings.load().await {
            Ok(target) => target,
            Err(e) => return IpcResponse::error(format!("目標の取得に失敗しました: {}", e)),
        };
        let mut data = self.timer_data().await;
        data.daily_target = Some(target.get());
        IpcResponse::success("", Some(data))
    }

    async fn handle_refetch(&self) -> IpcResponse {
        match self.reconciler.refetch_today_session().await {
            Ok(_) => IpcResponse::success(
                "今日のセッションを再読み込みしました",
                Some(self.timer_data().await),
            ),
            Err(e) => IpcResponse::error(format!("今日のセッションの取得に失敗しました: {}", e)),
        }
    }

    async fn handle_history(&self, limit: u32) -> IpcResponse {
        match self.reconciler.list_history(limit).await {
            Ok(history) => IpcResponse::success(
                "",
                Some(ResponseData {
                    history: Some(history),
                    ..Default::default()
                }),
            ),
            Err(e) => IpcResponse::error(format!("履歴の取得に失敗しました: {}", e)),
        }
    }

    async fn handle_get_target(&self) -> IpcResponse {
        match self.settings.load().await {
            Ok(target) => IpcResponse::success(
                "",
                Some(ResponseData {
                    daily_target: Some(target.get()),
                    ..Default::default()
                }),
            ),
            Err(e) => IpcResponse::error(format!("目標の取得に失敗しました: {}", e)),
        }
    }

    async fn handle_set_target(&self, value: u8) -> IpcResponse {
        match self.settings.update_value(value).await {
            Ok(target) => IpcResponse::success(
                format!("1日の目標を{}ポモドーロに設定しました", target),
                Some(ResponseData {
                    daily_target: Some(target.get()),
                    ..Default::default()
                }),
            ),
            Err(SettingsError::Validation(e)) => IpcResponse::error(e.to_string()),
            Err(SettingsError::Store(e)) => {
                IpcResponse::error(format!("設定の保存に失敗しました: {}", e))
            }
        }
    }

    async fn handle_sign_in(&self, user_id: String) -> IpcResponse {
        let user = match UserId::new(user_id) {
            Ok(user) => user,
            Err(e) => return IpcResponse::error(e.to_string()),
        };

        info!("Signing in as {}", user);
        self.controller.lock().await.clear_completed();
        if let Err(e) = self.reconciler.set_user(Some(user.clone())).await {
            warn!("Signed in, but today's session could not be loaded: {}", e);
        }
        IpcResponse::success(
            format!("{} としてサインインしました", user),
            Some(self.timer_data().await),
        )
    }

    async fn handle_sign_out(&self) -> IpcResponse {
        info!("Signing out");
        self.controller.lock().await.clear_completed();
        if let Err(e) = self.reconciler.set_user(None).await {
            warn!("Sign-out refetch failed: {}", e);
        }
        IpcResponse::success("サインアウトしました", Some(self.timer_data().await))
    }
}

// ============================================================================
// Tests
// ============================================================================
