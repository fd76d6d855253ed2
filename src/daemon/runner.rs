//! Daemon event loop.
//!
//! Owns every long-lived component and multiplexes three inputs on the
//! current task:
//!
//! ```text
//!  engine events ──┐
//!  toasts ─────────┼──▶ Daemon::run ──▶ Notifier / NoticeBoard
//!  IPC connections ┘                    RequestHandler (spawned per connection)
//! ```
//!
//! The notifier stays on this task because an audio player is bound to the
//! thread that opened the output device.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::context::{Clock, CurrentUser, LocalClock};
use crate::notification::{AlertChannel, Notifier};
use crate::settings::SettingsService;
use crate::sound::{completion_cue, try_create_player, SoundPlayer, SoundSource};
use crate::store::{ConfiguredStore, SessionStore};
use crate::types::{IpcResponse, Toast};

use super::controller::TimerController;
use super::ipc::{IpcError, IpcServer, NoticeBoard, RequestHandler};
use super::reconciler::SessionReconciler;
use super::timer::TimerEvent;

/// The running daemon.
pub struct Daemon<S: SessionStore> {
    server: IpcServer,
    handler: Arc<RequestHandler<S>>,
    controller: Arc<Mutex<TimerController<S>>>,
    reconciler: SessionReconciler<S>,
    notifier: Notifier,
    notices: NoticeBoard,
    event_rx: mpsc::UnboundedReceiver<TimerEvent>,
    toast_rx: mpsc::UnboundedReceiver<Toast>,
}

impl<S: SessionStore> Daemon<S> {
    /// Wires the components together and binds the IPC socket.
    ///
    /// The notifier starts with toasts only; see [`with_alerts`](Self::with_alerts)
    /// and [`with_sound`](Self::with_sound).
    pub fn new(
        socket_path: &Path,
        store: Arc<S>,
        user: CurrentUser,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (toast_tx, toast_rx) = mpsc::unbounded_channel();

        let reconciler = SessionReconciler::new(Arc::clone(&store), user.clone(), clock)
            .with_toasts(toast_tx.clone());
        let settings = SettingsService::new(store, user).with_toasts(toast_tx.clone());
        let controller = Arc::new(Mutex::new(TimerController::new(
            event_tx,
            reconciler.clone(),
        )));
        let notices = NoticeBoard::new();
        let handler = Arc::new(RequestHandler::new(
            Arc::clone(&controller),
            reconciler.clone(),
            settings,
            notices.clone(),
        ));

        let server = IpcServer::new(socket_path)?;

        Ok(Self {
            server,
            handler,
            controller,
            reconciler,
            notifier: Notifier::new(toast_tx),
            notices,
            event_rx,
            toast_rx,
        })
    }

    /// Shows desktop alerts on `alerts`.
    #[must_use]
    pub fn with_alerts(mut self, alerts: Arc<dyn AlertChannel>) -> Self {
        self.notifier = self.notifier.with_alerts(alerts);
        self
    }

    /// Plays `cue` on `player` when a period ends.
    #[must_use]
    pub fn with_sound(mut self, player: Arc<dyn SoundPlayer>, cue: SoundSource) -> Self {
        self.notifier = self.notifier.with_sound(player, cue);
        self
    }

    pub fn socket_path(&self) -> &Path {
        self.server.socket_path()
    }

    pub fn controller(&self) -> Arc<Mutex<TimerController<S>>> {
        Arc::clone(&self.controller)
    }

    pub fn notices(&self) -> NoticeBoard {
        self.notices.clone()
    }

    /// Serves requests until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Daemon listening on {:?}", self.socket_path());
        self.notifier.request_permission();
        self.load_today();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                Some(event) = self.event_rx.recv() => {
                    self.on_timer_event(event).await;
                }
                Some(toast) = self.toast_rx.recv() => {
                    debug!("Toast: {} / {}", toast.title, toast.body);
                    self.notices.push(toast);
                }
                accepted = self.server.accept() => match accepted {
                    Ok(stream) => {
                        let handler = Arc::clone(&self.handler);
                        tokio::spawn(serve_connection(handler, stream));
                    }
                    Err(e) => warn!("{:#}", e),
                },
            }
        }

        self.controller.lock().await.pause().await;
        info!("Daemon stopped");
        Ok(())
    }

    async fn on_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::PeriodCompleted { mode } => {
                info!("{} period completed", mode);
                self.notifier.notify_completion(mode);
                self.controller.lock().await.on_period_completed(mode);
            }
            TimerEvent::Tick { .. } => {}
            other => debug!("Timer event: {:?}", other),
        }
    }

    /// Loads today's record for the configured user in the background.
    fn load_today(&self) {
        if !self.reconciler.current_user().is_signed_in() {
            return;
        }
        let reconciler = self.reconciler.clone();
        tokio::spawn(async move {
            if let Err(e) = reconciler.refetch_today_session().await {
                warn!("Initial load of today's session failed: {}", e);
            }
        });
    }
}

/// Reads one request, handles it and writes the response.
async fn serve_connection<S: SessionStore>(handler: Arc<RequestHandler<S>>, mut stream: UnixStream) {
    let response = match IpcServer::receive_request(&mut stream).await {
        Ok(request) => handler.handle(request).await,
        Err(e) => {
            if matches!(e.downcast_ref::<IpcError>(), Some(IpcError::EmptyRequest)) {
                debug!("Client closed without a request");
                return;
            }
            warn!("Invalid request: {:#}", e);
            IpcResponse::error(format!("不正なリクエストです: {}", e))
        }
    };

    if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
        warn!("Failed to send response: {:#}", e);
    }
}

// ============================================================================
// Startup from configuration
// ============================================================================

/// Builds the daemon described by `config` and runs it until Ctrl+C.
pub async fn run_from_config(config: &AppConfig) -> Result<()> {
    let socket_path: PathBuf = config.socket_path()?;
    let store = ConfiguredStore::open(&config.store).context("Failed to open session store")?;
    info!("Session store: {}", store.kind());

    let user = CurrentUser::new(config.user());
    let mut daemon = Daemon::new(&socket_path, Arc::new(store), user, Arc::new(LocalClock))?;

    if let Some(alerts) = desktop_alerts(config) {
        daemon = daemon.with_alerts(alerts);
    }
    let open_player = || try_create_player().map(|p| p as Arc<dyn SoundPlayer>);
    if let Some((player, cue)) = completion_sound(config, open_player) {
        daemon = daemon.with_sound(player, cue);
    }

    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}

/// Player and cue for completed periods.
///
/// Returns `None` without opening a device when sound is off in `config`,
/// or when `open_player` finds no device.
fn completion_sound<F>(
    config: &AppConfig,
    open_player: F,
) -> Option<(Arc<dyn SoundPlayer>, SoundSource)>
where
    F: FnOnce() -> Option<Arc<dyn SoundPlayer>>,
{
    if !config.sound {
        debug!("Completion sound disabled in config");
        return None;
    }
    let player = open_player()?;
    Some((player, completion_cue(config.sound_file.as_deref())))
}

#[cfg(target_os = "macos")]
fn desktop_alerts(config: &AppConfig) -> Option<Arc<dyn AlertChannel>> {
    use crate::notification::MacAlertChannel;

    if !config.desktop_notifications {
        return None;
    }
    match MacAlertChannel::new(!config.sound) {
        Ok(channel) => Some(Arc::new(channel)),
        Err(e) => {
            warn!("Desktop notifications unavailable: {} ({})", e, e.suggestion());
            None
        }
    }
}

#[cfg(not(target_os = "macos"))]
fn desktop_alerts(config: &AppConfig) -> Option<Arc<dyn AlertChannel>> {
    if config.desktop_notifications {
        debug!("Desktop notifications are not supported on this platform");
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
