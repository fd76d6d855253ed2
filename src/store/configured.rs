//! Store selected by the daemon configuration.

use chrono::NaiveDate;
use tracing::info;

use super::{MemoryStore, RestStore, SessionStore, SqliteStore, StoreError};
use crate::config::StoreConfig;
use crate::types::{DailySession, UserId};

/// One of the built-in backends, chosen at startup.
#[derive(Debug)]
pub enum ConfiguredStore {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
    Rest(RestStore),
}

impl ConfiguredStore {
    /// Opens the backend described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        match config {
            StoreConfig::Memory => {
                info!("Using in-memory session store");
                Ok(Self::Memory(MemoryStore::new()))
            }
            StoreConfig::Sqlite { path } => {
                info!("Using SQLite session store at {:?}", path);
                Ok(Self::Sqlite(SqliteStore::open(path)?))
            }
            StoreConfig::Rest(rest) => {
                info!("Using hosted session store at {}", rest.url);
                Ok(Self::Rest(RestStore::new(rest.clone())?))
            }
        }
    }

    /// Short backend name for logs and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
            Self::Rest(_) => "rest",
        }
    }
}

impl SessionStore for ConfiguredStore {
    async fn get_today_session(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<Option<DailySession>, StoreError> {
        match self {
            Self::Memory(s) => s.get_today_session(user, date).await,
            Self::Sqlite(s) => s.get_today_session(user, date).await,
            Self::Rest(s) => s.get_today_session(user, date).await,
        }
    }

    async fn create_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        match self {
            Self::Memory(s) => {
                s.create_session(user, date, completed_count, total_work_minutes)
                    .await
            }
            Self::Sqlite(s) => {
                s.create_session(user, date, completed_count, total_work_minutes)
                    .await
            }
            Self::Rest(s) => {
                s.create_session(user, date, completed_count, total_work_minutes)
                    .await
            }
        }
    }

    async fn update_session(
        &self,
        session_id: &str,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        match self {
            Self::Memory(s) => {
                s.update_session(session_id, completed_count, total_work_minutes)
                    .await
            }
            Self::Sqlite(s) => {
                s.update_session(session_id, completed_count, total_work_minutes)
                    .await
            }
            Self::Rest(s) => {
                s.update_session(session_id, completed_count, total_work_minutes)
                    .await
            }
        }
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
        order_by_date_desc: bool,
    ) -> Result<Vec<DailySession>, StoreError> {
        match self {
            Self::Memory(s) => s.list_sessions(user, limit, order_by_date_desc).await,
            Self::Sqlite(s) => s.list_sessions(user, limit, order_by_date_desc).await,
            Self::Rest(s) => s.list_sessions(user, limit, order_by_date_desc).await,
        }
    }

    async fn get_daily_target(&self, user: &UserId) -> Result<Option<u8>, StoreError> {
        match self {
            Self::Memory(s) => s.get_daily_target(user).await,
            Self::Sqlite(s) => s.get_daily_target(user).await,
            Self::Rest(s) => s.get_daily_target(user).await,
        }
    }

    async fn set_daily_target(&self, user: &UserId, target: u8) -> Result<(), StoreError> {
        match self {
            Self::Memory(s) => s.set_daily_target(user, target).await,
            Self::Sqlite(s) => s.set_daily_target(user, target).await,
            Self::Rest(s) => s.set_daily_target(user, target).await,
        }
    }
}
