//! IPC Client for communicating with the Pomodoro timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::types::{DailyTarget, IpcRequest, IpcResponse, TimerMode};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 15;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    pub async fn start(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Start).await
    }

    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Pause).await
    }

    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Toggle).await
    }

    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Reset).await
    }

    pub async fn switch(&self, mode: TimerMode) -> Result<IpcResponse> {
        self.send(&IpcRequest::Switch { mode }).await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Status).await
    }

    pub async fn today(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Today).await
    }

    pub async fn refetch(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::Refetch).await
    }

    pub async fn history(&self, limit: u32) -> Result<IpcResponse> {
        self.send(&IpcRequest::History { limit }).await
    }

    pub async fn get_target(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::GetTarget).await
    }

    /// Sends an already validated target.
    pub async fn set_target(&self, target: DailyTarget) -> Result<IpcResponse> {
        self.send(&IpcRequest::SetTarget {
            target: target.get(),
        })
        .await
    }

    pub async fn sign_in(&self, user_id: &str) -> Result<IpcResponse> {
        self.send(&IpcRequest::SignIn {
            user_id: user_id.to_string(),
        })
        .await
    }

    pub async fn sign_out(&self) -> Result<IpcResponse> {
        self.send(&IpcRequest::SignOut).await
    }

    /// Sends `request` and fails on an error response.
    ///
    /// Only the connection is retried; a request that reached the daemon is
    /// never sent twice.
    pub async fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = self.connect_with_retry().await?;
        let response = exchange(&mut stream, request).await?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }

    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!("接続失敗 (試行 {}/{}): {}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'pomodoro daemon' を起動してください")
    }
}

/// Writes one request and reads the whole response.
async fn exchange(stream: &mut UnixStream, request: &IpcRequest) -> Result<IpcResponse> {
    let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

    let request_json =
        serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;

    timeout(io_timeout, stream.write_all(&request_json))
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;

    // Shutdown write side to signal end of request
    stream
        .shutdown()
        .await
        .context("シャットダウンに失敗しました")?;

    let mut buffer = Vec::new();
    let mut limited = (&mut *stream).take(MAX_RESPONSE_SIZE);
    timeout(io_timeout, limited.read_to_end(&mut buffer))
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

    if buffer.is_empty() {
        anyhow::bail!("Daemonからの応答がありませんでした");
    }

    serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")
}

// ============================================================================
// Tests
// ============================================================================
