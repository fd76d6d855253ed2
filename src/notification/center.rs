//! UNUserNotificationCenter wrapper (macOS).

use std::cell::RefCell;

use block2::RcBlock;
use objc2::rc::Retained;
use objc2::runtime::Bool;
use objc2_foundation::{NSBundle, NSError};
use objc2_user_notifications::{
    UNAuthorizationOptions, UNNotificationRequest, UNUserNotificationCenter,
};
use tokio::sync::oneshot;
use tracing::debug;

use super::error::NotificationError;

pub struct NotificationCenter;

impl NotificationCenter {
    /// Returns true if the process has a bundle identifier.
    ///
    /// `currentNotificationCenter` raises for processes without one.
    #[must_use]
    pub fn has_bundle_identity() -> bool {
        NSBundle::mainBundle().bundleIdentifier().is_some()
    }

    #[must_use]
    pub fn current() -> Retained<UNUserNotificationCenter> {
        UNUserNotificationCenter::currentNotificationCenter()
    }

    /// Asks the user for alert and sound permission.
    pub async fn request_authorization() -> Result<bool, NotificationError> {
        let (tx, rx) = oneshot::channel::<Result<bool, NotificationError>>();

        {
            let options = UNAuthorizationOptions::Alert | UNAuthorizationOptions::Sound;

            let cb = RefCell::new(Some(tx));
            let block = RcBlock::new(move |granted: Bool, error: *mut NSError| {
                if let Some(sender) = cb.borrow_mut().take() {
                    let result = match unsafe { error.as_ref() } {
                        Some(err) => Err(NotificationError::AuthorizationFailed(
                            err.localizedDescription().to_string(),
                        )),
                        None => Ok(granted.as_bool()),
                    };
                    let _ = sender.send(result);
                }
            });

            Self::current().requestAuthorizationWithOptions_completionHandler(options, &block);
        }

        rx.await.map_err(|_| {
            NotificationError::AuthorizationFailed("completion handler dropped".to_string())
        })?
    }

    /// Queues `request` without waiting for delivery.
    pub fn post(request: &UNNotificationRequest) {
        let block = RcBlock::new(|error: *mut NSError| {
            if let Some(err) = unsafe { error.as_ref() } {
                debug!("Alert delivery failed: {}", err.localizedDescription());
            }
        });

        Self::current().addNotificationRequest_withCompletionHandler(request, Some(&block));
    }
}
