//! Daily target settings.
//!
//! The target lives only in the store; there is no local copy that could
//! drift from it. Input is validated before any store call.

pub mod dialog;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::context::CurrentUser;
use crate::store::{SessionStore, StoreError};
use crate::types::{DailyTarget, Toast, ValidationError};

pub use dialog::{transition, DialogAction, DialogState};

/// Errors from changing the daily target.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Toast shown after a target was saved.
pub fn saved_toast(target: DailyTarget) -> Toast {
    Toast::info(
        "設定を保存しました",
        format!("1日の目標を{}ポモドーロに設定しました", target),
    )
}

/// Reads and writes the signed-in user's daily target.
pub struct SettingsService<S: SessionStore> {
    store: Arc<S>,
    user: CurrentUser,
    toast_tx: Option<mpsc::UnboundedSender<Toast>>,
}

impl<S: SessionStore> Clone for SettingsService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            user: self.user.clone(),
            toast_tx: self.toast_tx.clone(),
        }
    }
}

impl<S: SessionStore> SettingsService<S> {
    pub fn new(store: Arc<S>, user: CurrentUser) -> Self {
        Self {
            store,
            user,
            toast_tx: None,
        }
    }

    /// Sends save results to `toast_tx`.
    #[must_use]
    pub fn with_toasts(mut self, toast_tx: mpsc::UnboundedSender<Toast>) -> Self {
        self.toast_tx = Some(toast_tx);
        self
    }

    /// Loads the target, falling back to the default when none was saved
    /// or nobody is signed in.
    pub async fn load(&self) -> Result<DailyTarget, StoreError> {
        let Some(user) = self.user.get() else {
            return Ok(DailyTarget::default());
        };

        match self.store.get_daily_target(&user).await? {
            Some(value) => DailyTarget::new(value).map_err(|_| {
                StoreError::InvalidData(format!("daily_target = {}", value))
            }),
            None => Ok(DailyTarget::default()),
        }
    }

    /// Saves a validated target for the signed-in user.
    pub async fn update(&self, target: DailyTarget) -> Result<(), StoreError> {
        let user = self.user.get().ok_or(StoreError::SignedOut)?;

        match self.store.set_daily_target(&user, target.get()).await {
            Ok(()) => {
                info!("Daily target set to {}", target);
                self.send(saved_toast(target));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save daily target: {}", e);
                self.send(Toast::error("エラー", "データベースへの保存に失敗しました"));
                Err(e)
            }
        }
    }

    /// Validates `value` and saves it.
    pub async fn update_value(&self, value: u8) -> Result<DailyTarget, SettingsError> {
        let target = DailyTarget::new(value)?;
        self.update(target).await?;
        Ok(target)
    }

    fn send(&self, toast: Toast) {
        if let Some(tx) = &self.toast_tx {
            let _ = tx.send(toast);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{ToastLevel, UserId};

    fn create_service(
        signed_in: bool,
    ) -> (
        SettingsService<MemoryStore>,
        Arc<MemoryStore>,
        mpsc::UnboundedReceiver<Toast>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let user = CurrentUser::new(signed_in.then(|| UserId::new("alice").unwrap()));
        let (tx, rx) = mpsc::unbounded_channel();
        let service = SettingsService::new(Arc::clone(&store), user).with_toasts(tx);
        (service, store, rx)
    }

    #[tokio::test]
    async fn test_load_defaults_to_eight() {
        let (service, _store, _rx) = create_service(true);
        assert_eq!(service.load().await.unwrap().get(), 8);

        let (service, _store, _rx) = create_service(false);
        assert_eq!(service.load().await.unwrap().get(), 8);
    }

    #[tokio::test]
    async fn test_update_then_load() {
        let (service, _store, mut rx) = create_service(true);

        service.update(DailyTarget::new(12).unwrap()).await.unwrap();

        assert_eq!(service.load().await.unwrap().get(), 12);
        let toast = rx.try_recv().unwrap();
        assert_eq!(toast.title, "設定を保存しました");
        assert_eq!(toast.body, "1日の目標を12ポモドーロに設定しました");
    }

    #[tokio::test]
    async fn test_update_value_rejects_out_of_range_without_store_call() {
        let (service, store, _rx) = create_service(true);
        store.set_should_fail(true);

        for value in [0, 21] {
            let err = service.update_value(value).await.unwrap_err();
            assert!(matches!(err, SettingsError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_update_signed_out() {
        let (service, _store, _rx) = create_service(false);
        let err = service.update(DailyTarget::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::SignedOut));
    }

    #[tokio::test]
    async fn test_update_failure_sends_error_toast() {
        let (service, store, mut rx) = create_service(true);
        store.set_should_fail(true);

        assert!(service.update(DailyTarget::new(5).unwrap()).await.is_err());
        assert_eq!(rx.try_recv().unwrap().level, ToastLevel::Error);
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_value() {
        let (service, store, _rx) = create_service(true);
        store
            .set_daily_target(&UserId::new("alice").unwrap(), 99)
            .await
            .unwrap();

        assert!(matches!(
            service.load().await,
            Err(StoreError::InvalidData(_))
        ));
    }
}
