//! SQLite-backed session store.
//!
//! One connection behind a `std::sync::Mutex`; every call runs on the
//! blocking thread pool so the timer's runtime never waits on disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{SessionStore, StoreError};
use crate::types::{DailySession, UserId};

/// Current schema version (`PRAGMA user_version`).
const SCHEMA_VERSION: i32 = 1;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Session store persisted in a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path` and applies migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!("{}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Failed to enable WAL mode: {}. Continuing.", e);
        }
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock_conn(&conn)?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {}", e)))?
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|e| StoreError::Unavailable(format!("connection mutex poisoned: {}", e)))
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    if current < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pomodoro_sessions (
                 id                 TEXT PRIMARY KEY,
                 user_id            TEXT NOT NULL,
                 date               TEXT NOT NULL,
                 completed_count    INTEGER NOT NULL DEFAULT 0,
                 total_work_minutes INTEGER NOT NULL DEFAULT 0,
                 created_at         TEXT NOT NULL,
                 updated_at         TEXT NOT NULL,
                 UNIQUE (user_id, date)
             );
             CREATE INDEX IF NOT EXISTS idx_sessions_user_date
                 ON pomodoro_sessions (user_id, date DESC);
             CREATE TABLE IF NOT EXISTS daily_targets (
                 user_id      TEXT PRIMARY KEY,
                 daily_target INTEGER NOT NULL CHECK (daily_target BETWEEN 1 AND 20),
                 updated_at   TEXT NOT NULL
             );",
        )?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    debug!("Session schema migrated {} -> {}", current, SCHEMA_VERSION);
    Ok(())
}

fn map_session(row: &Row) -> rusqlite::Result<DailySession> {
    let date_str: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(StoreError::InvalidData(format!("date: {}", date_str))),
        )
    })?;

    Ok(DailySession {
        id: row.get("id")?,
        date,
        completed_count: row.get("completed_count")?,
        total_work_minutes: row.get("total_work_minutes")?,
    })
}

fn load_session(conn: &Connection, id: &str) -> Result<Option<DailySession>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id, date, completed_count, total_work_minutes
             FROM pomodoro_sessions WHERE id = ?1",
            [id],
            map_session,
        )
        .optional()?)
}

impl SessionStore for SqliteStore {
    async fn get_today_session(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<Option<DailySession>, StoreError> {
        let user = user.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, date, completed_count, total_work_minutes
                     FROM pomodoro_sessions WHERE user_id = ?1 AND date = ?2",
                    params![user, date.format(DATE_FORMAT).to_string()],
                    map_session,
                )
                .optional()?)
        })
        .await
    }

    async fn create_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        let user = user.to_string();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4().to_string();
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO pomodoro_sessions
                     (id, user_id, date, completed_count, total_work_minutes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    id,
                    user,
                    date.format(DATE_FORMAT).to_string(),
                    completed_count,
                    total_work_minutes,
                    now
                ],
            )?;
            load_session(conn, &id)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn update_session(
        &self,
        session_id: &str,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        let id = session_id.to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE pomodoro_sessions
                 SET completed_count = ?1, total_work_minutes = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![completed_count, total_work_minutes, Utc::now().to_rfc3339(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            load_session(conn, &id)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
        order_by_date_desc: bool,
    ) -> Result<Vec<DailySession>, StoreError> {
        let user = user.to_string();
        self.with_conn(move |conn| {
            let sql = if order_by_date_desc {
                "SELECT id, date, completed_count, total_work_minutes
                 FROM pomodoro_sessions WHERE user_id = ?1
                 ORDER BY date DESC LIMIT ?2"
            } else {
                "SELECT id, date, completed_count, total_work_minutes
                 FROM pomodoro_sessions WHERE user_id = ?1
                 ORDER BY date ASC LIMIT ?2"
            };
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![user, limit], map_session)?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
        .await
    }

    async fn get_daily_target(&self, user: &UserId) -> Result<Option<u8>, StoreError> {
        let user = user.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT daily_target FROM daily_targets WHERE user_id = ?1",
                    [user],
                    |r| r.get::<_, u8>(0),
                )
                .optional()?)
        })
        .await
    }

    async fn set_daily_target(&self, user: &UserId, target: u8) -> Result<(), StoreError> {
        let user = user.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO daily_targets (user_id, daily_target, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (user_id) DO UPDATE
                 SET daily_target = excluded.daily_target, updated_at = excluded.updated_at",
                params![user, target, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .await
    }
}
