//! Completion notifications.
//!
//! Every finished period (work or break) produces:
//!
//! - an in-app toast, pushed to the daemon's notice buffer
//! - a desktop alert, if an [`AlertChannel`] is installed and permitted
//! - an audio cue, if a [`SoundPlayer`] is installed
//!
//! All three are fire-and-forget. A failing channel is logged at debug
//! level and never reaches the timer.
//!
//! # macOS
//!
//! Desktop alerts use `UNUserNotificationCenter`, which only works for a
//! signed binary with a bundle identity. For development, use ad-hoc
//! signing:
//! ```bash
//! codesign --force --deep --sign - target/release/pomodoro
//! ```

pub mod error;

#[cfg(target_os = "macos")]
mod center;
#[cfg(target_os = "macos")]
mod content;
#[cfg(target_os = "macos")]
mod mac;
#[cfg(target_os = "macos")]
mod request;

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::sound::{completion_cue, SoundPlayer, SoundSource};
use crate::types::{TimerMode, Toast};

pub use self::error::NotificationError;
#[cfg(target_os = "macos")]
pub use self::mac::MacAlertChannel;

// ============================================================================
// Messages
// ============================================================================

/// Title and body announcing the end of a `mode` period.
#[must_use]
pub fn completion_message(mode: TimerMode) -> (&'static str, &'static str) {
    match mode {
        TimerMode::Work => (
            "作業時間完了！",
            "お疲れ様でした。5分間の休憩を取りましょう。",
        ),
        TimerMode::Break => ("休憩時間完了！", "次のポモドーロを始めましょう。"),
    }
}

// ============================================================================
// AlertChannel
// ============================================================================

/// Whether desktop alerts may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Permission {
    /// The user has not answered yet
    NotDetermined = 0,
    Granted = 1,
    Denied = 2,
    /// The platform has no alert service
    Unavailable = 3,
}

impl Permission {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Granted,
            2 => Self::Denied,
            3 => Self::Unavailable,
            _ => Self::NotDetermined,
        }
    }
}

/// A platform alert service.
pub trait AlertChannel: Send + Sync {
    /// Starts the permission prompt. The answer arrives later.
    fn request_permission(&self);

    fn permission(&self) -> Permission;

    /// Shows an alert. Only called when permission is granted.
    fn show(&self, title: &str, body: &str) -> Result<(), NotificationError>;
}

/// Alert channel for platforms without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAlertChannel;

impl AlertChannel for NoopAlertChannel {
    fn request_permission(&self) {}

    fn permission(&self) -> Permission {
        Permission::Unavailable
    }

    fn show(&self, _title: &str, _body: &str) -> Result<(), NotificationError> {
        Err(NotificationError::NotAvailable)
    }
}

/// Records alerts instead of showing them.
#[derive(Debug)]
pub struct MockAlertChannel {
    shown: Mutex<Vec<(String, String)>>,
    permission: AtomicU8,
    permission_requests: AtomicUsize,
    grant_on_request: bool,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockAlertChannel {
    /// Creates a mock with permission already `permission`.
    #[must_use]
    pub fn new(permission: Permission) -> Self {
        Self {
            shown: Mutex::new(Vec::new()),
            permission: AtomicU8::new(permission as u8),
            permission_requests: AtomicUsize::new(0),
            grant_on_request: false,
            should_fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Creates an undetermined mock that grants permission when asked.
    #[must_use]
    pub fn granting() -> Self {
        Self {
            grant_on_request: true,
            ..Self::new(Permission::NotDetermined)
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }
}

impl AlertChannel for MockAlertChannel {
    fn request_permission(&self) {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request {
            self.permission
                .store(Permission::Granted as u8, Ordering::SeqCst);
        }
    }

    fn permission(&self) -> Permission {
        Permission::from_u8(self.permission.load(Ordering::SeqCst))
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::SendFailed("Mock failure".to_string()));
        }
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((title.to_string(), body.to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// Announces completed periods on every configured channel.
pub struct Notifier {
    toast_tx: mpsc::UnboundedSender<Toast>,
    alerts: Arc<dyn AlertChannel>,
    sound: Option<Arc<dyn SoundPlayer>>,
    cue: SoundSource,
}

impl Notifier {
    /// Creates a notifier with toasts only.
    pub fn new(toast_tx: mpsc::UnboundedSender<Toast>) -> Self {
        Self {
            toast_tx,
            alerts: Arc::new(NoopAlertChannel),
            sound: None,
            cue: completion_cue(None),
        }
    }

    #[must_use]
    pub fn with_alerts(mut self, alerts: Arc<dyn AlertChannel>) -> Self {
        self.alerts = alerts;
        self
    }

    #[must_use]
    pub fn with_sound(mut self, player: Arc<dyn SoundPlayer>, cue: SoundSource) -> Self {
        self.sound = Some(player);
        self.cue = cue;
        self
    }

    /// Asks for alert permission if the user has not answered yet.
    pub fn request_permission(&self) {
        if self.alerts.permission() == Permission::NotDetermined {
            self.alerts.request_permission();
        }
    }

    /// Announces the end of a `mode` period.
    pub fn notify_completion(&self, mode: TimerMode) {
        let (title, body) = completion_message(mode);

        if self.toast_tx.send(Toast::info(title, body)).is_err() {
            debug!("Toast dropped: receiver closed");
        }

        if self.alerts.permission() == Permission::Granted {
            if let Err(e) = self.alerts.show(title, body) {
                debug!("Desktop alert failed: {}", e);
            }
        }

        if let Some(player) = &self.sound {
            if let Err(e) = player.play(&self.cue) {
                debug!("Completion cue failed: {}", e);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
