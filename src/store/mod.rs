//! Session persistence for the Pomodoro timer.
//!
//! This module defines the [`SessionStore`] interface the reconciler and
//! settings talk to, plus three backends:
//!
//! - [`MemoryStore`]: in-process, for tests and `store = "memory"`
//! - [`SqliteStore`]: a local SQLite file (rusqlite)
//! - [`RestStore`]: a hosted PostgREST/Supabase project (reqwest)
//!
//! [`ConfiguredStore`] picks one of them from the config file.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐      ┌──────────────────┐
//! │ SessionReconciler│      │ SettingsService  │
//! └────────┬─────────┘      └────────┬─────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌────────────────────────────────────────────┐
//! │              SessionStore                  │
//! └──────┬──────────────┬──────────────┬───────┘
//!        ▼              ▼              ▼
//!   MemoryStore    SqliteStore     RestStore
//! ```

mod configured;
mod error;
mod memory;
mod rest;
mod sqlite;

use std::future::Future;

use chrono::NaiveDate;

use crate::types::{DailySession, UserId};

pub use configured::ConfiguredStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use rest::{RestStore, RestStoreConfig};
pub use sqlite::SqliteStore;

/// Number of days the history view loads by default.
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;

/// Persistence collaborator for per-day sessions and the daily target.
///
/// Every method returns a `Send` future so callers can dispatch store work
/// onto the runtime without waiting for it.
pub trait SessionStore: Send + Sync + 'static {
    /// Fetches the record for `user` on `date`, if one exists.
    fn get_today_session(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailySession>, StoreError>> + Send;

    /// Creates the record for `user` on `date`.
    fn create_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> impl Future<Output = Result<DailySession, StoreError>> + Send;

    /// Overwrites the counters of an existing record.
    fn update_session(
        &self,
        session_id: &str,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> impl Future<Output = Result<DailySession, StoreError>> + Send;

    /// Lists up to `limit` records for `user`, ordered by date.
    fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
        order_by_date_desc: bool,
    ) -> impl Future<Output = Result<Vec<DailySession>, StoreError>> + Send;

    /// Reads the user's daily target, if one was saved.
    fn get_daily_target(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<u8>, StoreError>> + Send;

    /// Saves the user's daily target, replacing any previous value.
    fn set_daily_target(
        &self,
        user: &UserId,
        target: u8,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
