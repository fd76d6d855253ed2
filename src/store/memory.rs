//! In-memory session store.
//!
//! Keeps everything in a `tokio::sync::Mutex`. Supports injected failures
//! and latency so callers can be tested against a slow or broken backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::Duration;
use uuid::Uuid;

use super::{SessionStore, StoreError};
use crate::types::{DailySession, UserId};

#[derive(Debug, Default)]
struct MemoryData {
    sessions: Vec<(UserId, DailySession)>,
    targets: HashMap<UserId, u8>,
}

/// Session store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    should_fail: AtomicBool,
    latency_ms: AtomicU64,
    write_count: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Delays every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of successful create/update calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Returns every stored session for `user`, oldest first.
    pub async fn sessions_for(&self, user: &UserId) -> Vec<DailySession> {
        let data = self.data.lock().await;
        let mut sessions: Vec<DailySession> = data
            .sessions
            .iter()
            .filter(|(owner, _)| owner == user)
            .map(|(_, session)| session.clone())
            .collect();
        sessions.sort_by_key(|s| s.date);
        sessions
    }

    async fn before_call(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    async fn get_today_session(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<Option<DailySession>, StoreError> {
        self.before_call().await?;
        let data = self.data.lock().await;
        Ok(data
            .sessions
            .iter()
            .find(|(owner, session)| owner == user && session.date == date)
            .map(|(_, session)| session.clone()))
    }

    async fn create_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        self.before_call().await?;
        let mut data = self.data.lock().await;

        if data
            .sessions
            .iter()
            .any(|(owner, session)| owner == user && session.date == date)
        {
            return Err(StoreError::Rejected {
                status: 409,
                body: format!("session for {} on {} already exists", user, date),
            });
        }

        let session = DailySession {
            id: Uuid::new_v4().to_string(),
            date,
            completed_count,
            total_work_minutes,
        };
        data.sessions.push((user.clone(), session.clone()));
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(session)
    }

    async fn update_session(
        &self,
        session_id: &str,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        self.before_call().await?;
        let mut data = self.data.lock().await;

        let (_, session) = data
            .sessions
            .iter_mut()
            .find(|(_, session)| session.id == session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        session.completed_count = completed_count;
        session.total_work_minutes = total_work_minutes;
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(session.clone())
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
        order_by_date_desc: bool,
    ) -> Result<Vec<DailySession>, StoreError> {
        self.before_call().await?;
        let mut sessions = self.sessions_for(user).await;
        if order_by_date_desc {
            sessions.reverse();
        }
        sessions.truncate(limit as usize);
        Ok(sessions)
    }

    async fn get_daily_target(&self, user: &UserId) -> Result<Option<u8>, StoreError> {
        self.before_call().await?;
        Ok(self.data.lock().await.targets.get(user).copied())
    }

    async fn set_daily_target(&self, user: &UserId, target: u8) -> Result<(), StoreError> {
        self.before_call().await?;
        self.data.lock().await.targets.insert(user.clone(), target);
        Ok(())
    }
}
