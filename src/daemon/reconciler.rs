//! Session reconciler.
//!
//! Keeps the per-day aggregate (completed count, total work minutes) in the
//! store in step with completed work periods, and publishes today's record
//! so the rest of the daemon can show it.
//!
//! Store failures never reach the timer: they are logged and reported as an
//! error toast, and the previously published record is kept.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::{Clock, CurrentUser};
use crate::store::{SessionStore, StoreError};
use crate::types::{DailySession, Toast, UserId, WORK_PERIOD_MINUTES};

const ERROR_TITLE: &str = "エラー";
const SAVE_FAILED: &str = "セッションの保存に失敗しました。";
const FETCH_FAILED: &str = "今日のセッションの取得に失敗しました。";
const HISTORY_FAILED: &str = "履歴の取得に失敗しました。";

/// Synchronizes today's session record with the store.
pub struct SessionReconciler<S: SessionStore> {
    store: Arc<S>,
    user: CurrentUser,
    clock: Arc<dyn Clock>,
    today: Arc<watch::Sender<Option<DailySession>>>,
    toast_tx: Option<mpsc::UnboundedSender<Toast>>,
}

impl<S: SessionStore> Clone for SessionReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            user: self.user.clone(),
            clock: Arc::clone(&self.clock),
            today: Arc::clone(&self.today),
            toast_tx: self.toast_tx.clone(),
        }
    }
}

impl<S: SessionStore> SessionReconciler<S> {
    pub fn new(store: Arc<S>, user: CurrentUser, clock: Arc<dyn Clock>) -> Self {
        let (today, _rx) = watch::channel(None);
        Self {
            store,
            user,
            clock,
            today: Arc::new(today),
            toast_tx: None,
        }
    }

    /// Sends failure toasts to `toast_tx`.
    #[must_use]
    pub fn with_toasts(mut self, toast_tx: mpsc::UnboundedSender<Toast>) -> Self {
        self.toast_tx = Some(toast_tx);
        self
    }

    /// Returns the last published record, or `None` once its date has
    /// passed.
    pub fn today_session(&self) -> Option<DailySession> {
        self.today
            .borrow()
            .as_ref()
            .filter(|session| session.date == self.clock.today())
            .cloned()
    }

    /// Today's local date as the reconciler sees it.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Watches today's published record.
    pub fn subscribe(&self) -> watch::Receiver<Option<DailySession>> {
        self.today.subscribe()
    }

    pub fn current_user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Counts one completed work period against today's record.
    ///
    /// Creates the record as (1, 25) when absent, otherwise increments it in
    /// place. Returns `Ok(None)` without touching the store when nobody is
    /// signed in.
    pub async fn record_completion(&self) -> Result<Option<DailySession>, StoreError> {
        let Some(user) = self.user.get() else {
            debug!("No user signed in, completion not recorded");
            return Ok(None);
        };
        let date = self.clock.today();

        let saved = match self.store.get_today_session(&user, date).await? {
            None => {
                self.store
                    .create_session(&user, date, 1, WORK_PERIOD_MINUTES)
                    .await?
            }
            Some(existing) => {
                let (count, minutes) = existing.next_counts();
                self.store
                    .update_session(&existing.id, count, minutes)
                    .await?
            }
        };

        info!(
            "Session recorded: date={}, completed={}, minutes={}",
            saved.date, saved.completed_count, saved.total_work_minutes
        );
        self.publish(&user, saved.clone());
        Ok(Some(saved))
    }

    /// Runs [`record_completion`](Self::record_completion) in the background.
    ///
    /// Failures are logged and reported as an error toast.
    pub fn dispatch_completion(&self) -> JoinHandle<()> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            if let Err(e) = reconciler.record_completion().await {
                if e.is_transient() {
                    warn!("Failed to record completed session, store unreachable: {}", e);
                } else {
                    error!("Failed to record completed session: {}", e);
                }
                reconciler.report(SAVE_FAILED);
            }
        })
    }

    /// Loads today's record from the store and publishes it.
    pub async fn refetch_today_session(&self) -> Result<Option<DailySession>, StoreError> {
        let Some(user) = self.user.get() else {
            return Ok(None);
        };

        match self.store.get_today_session(&user, self.clock.today()).await {
            Ok(Some(session)) => {
                self.publish(&user, session.clone());
                Ok(Some(session))
            }
            Ok(None) => {
                if self.user.get().as_ref() == Some(&user) {
                    self.today.send_replace(None);
                }
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to fetch today's session: {}", e);
                self.report(FETCH_FAILED);
                Err(e)
            }
        }
    }

    /// Replaces the signed-in user and reloads today's record for them.
    ///
    /// The published record is cleared first so a previous user's numbers
    /// are never shown under the new identity.
    pub async fn set_user(&self, user: Option<UserId>) -> Result<Option<DailySession>, StoreError> {
        if self.user.set(user) {
            self.today.send_replace(None);
        }
        self.refetch_today_session().await
    }

    /// Lists up to `limit` records for the signed-in user, newest first.
    pub async fn list_history(&self, limit: u32) -> Result<Vec<DailySession>, StoreError> {
        let Some(user) = self.user.get() else {
            return Ok(Vec::new());
        };

        self.store
            .list_sessions(&user, limit, true)
            .await
            .inspect_err(|e| {
                warn!("Failed to list session history: {}", e);
                self.report(HISTORY_FAILED);
            })
    }

    /// Publishes `session` unless the user or the date changed meanwhile.
    fn publish(&self, user: &UserId, session: DailySession) {
        if self.user.get().as_ref() != Some(user) {
            debug!("Discarding session result for signed-out user {}", user);
            return;
        }
        if session.date != self.clock.today() {
            debug!("Discarding session result for past date {}", session.date);
            return;
        }
        self.today.send_replace(Some(session));
    }

    fn report(&self, body: &str) {
        if let Some(tx) = &self.toast_tx {
            let _ = tx.send(Toast::error(ERROR_TITLE, body));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
