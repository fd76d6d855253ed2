//! Notification error types.
//!
//! Alerts are optional, so callers log these and continue.

use thiserror::Error;

/// Errors that can occur while showing a desktop alert.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The authorization request itself failed.
    #[error("通知許可の取得に失敗しました: {0}")]
    AuthorizationFailed(String),

    /// The system rejected the alert.
    #[error("通知の送信に失敗しました: {0}")]
    SendFailed(String),

    /// The user has not granted permission.
    #[error("通知許可が拒否されています")]
    PermissionDenied,

    /// The process has no bundle identity, which the system requires.
    #[error("バイナリが署名されていません。codesignで署名してください")]
    UnsignedBinary,

    /// No desktop notification service on this platform.
    #[error("通知センターが利用できません")]
    NotAvailable,
}

impl NotificationError {
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::AuthorizationFailed(_))
    }

    /// Returns a hint for the daemon log.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AuthorizationFailed(_) | Self::PermissionDenied => {
                "システム環境設定 > 通知 でアプリの通知を許可してください"
            }
            Self::UnsignedBinary => "codesign --force --deep --sign - target/release/pomodoro",
            Self::SendFailed(_) => "通知センターを確認してください",
            Self::NotAvailable => "desktop_notifications を false に設定してください",
        }
    }
}
