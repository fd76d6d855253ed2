//! Desktop alerts through the macOS notification center.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::center::NotificationCenter;
use super::content::NotificationContentBuilder;
use super::error::NotificationError;
use super::request::create_notification_request;
use super::{AlertChannel, Permission};

/// Alert channel backed by `UNUserNotificationCenter`.
#[derive(Debug)]
pub struct MacAlertChannel {
    permission: Arc<AtomicU8>,
    with_sound: bool,
}

impl MacAlertChannel {
    /// Creates the channel.
    ///
    /// `with_sound` adds the system alert sound, for setups where the app
    /// plays no cue of its own.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::UnsignedBinary` when the process has no
    /// bundle identity.
    pub fn new(with_sound: bool) -> Result<Self, NotificationError> {
        if !NotificationCenter::has_bundle_identity() {
            return Err(NotificationError::UnsignedBinary);
        }
        Ok(Self {
            permission: Arc::new(AtomicU8::new(Permission::NotDetermined as u8)),
            with_sound,
        })
    }
}

impl AlertChannel for MacAlertChannel {
    fn request_permission(&self) {
        let permission = Arc::clone(&self.permission);
        tokio::spawn(async move {
            let result = match NotificationCenter::request_authorization().await {
                Ok(true) => {
                    info!("Desktop notifications authorized");
                    Permission::Granted
                }
                Ok(false) => {
                    warn!("{}", NotificationError::PermissionDenied.suggestion());
                    Permission::Denied
                }
                Err(e) if e.is_permission_error() => {
                    warn!("{} ({})", e, e.suggestion());
                    Permission::Denied
                }
                Err(e) => {
                    warn!("{} ({})", e, e.suggestion());
                    Permission::Unavailable
                }
            };
            permission.store(result as u8, Ordering::SeqCst);
        });
    }

    fn permission(&self) -> Permission {
        Permission::from_u8(self.permission.load(Ordering::SeqCst))
    }

    fn show(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        if self.permission() != Permission::Granted {
            return Err(NotificationError::PermissionDenied);
        }

        let mut builder = NotificationContentBuilder::new().title(title).body(body);
        if self.with_sound {
            builder = builder.default_sound();
        }
        let request = create_notification_request(&builder.build());
        NotificationCenter::post(&request);
        debug!("Desktop alert queued: {}", title);
        Ok(())
    }
}
