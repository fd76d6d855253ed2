//! Hosted session store speaking the PostgREST dialect (Supabase).
//!
//! Rows live in `pomodoro_sessions` and `daily_targets`; every request
//! carries the project's `apikey` and a bearer token.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{SessionStore, StoreError};
use crate::types::{DailySession, UserId};

const SESSIONS_TABLE: &str = "pomodoro_sessions";
const TARGETS_TABLE: &str = "daily_targets";
const SESSION_COLUMNS: &str = "id,date,completed_count,total_work_minutes";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a hosted project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key
    pub api_key: String,
    /// User access token; the API key is used as bearer when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    id: String,
    date: NaiveDate,
    completed_count: u32,
    total_work_minutes: u32,
}

impl From<SessionRow> for DailySession {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            completed_count: row.completed_count,
            total_work_minutes: row.total_work_minutes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TargetRow {
    daily_target: u8,
}

/// Session store backed by a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    config: RestStoreConfig,
}

impl RestStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        table_url(&self.config.url, table)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
    }

    async fn fetch_sessions(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<DailySession>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url(SESSIONS_TABLE)))
            .query(query)
            .send()
            .await?;
        let rows: Vec<SessionRow> = check_status(response).await?.json().await?;
        Ok(rows.into_iter().map(DailySession::from).collect())
    }
}

fn table_url(base: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base.trim_end_matches('/'), table)
}

fn eq_filter(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn order_clause(order_by_date_desc: bool) -> String {
    if order_by_date_desc {
        "date.desc".to_string()
    } else {
        "date.asc".to_string()
    }
}

/// Turns a non-success response into `StoreError::Rejected`.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("Store request rejected: {} {}", status, body);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Takes the single row a `return=representation` write echoes back.
fn single_row(rows: Vec<SessionRow>, what: &str) -> Result<DailySession, StoreError> {
    rows.into_iter()
        .next()
        .map(DailySession::from)
        .ok_or_else(|| StoreError::NotFound(what.to_string()))
}

impl SessionStore for RestStore {
    async fn get_today_session(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<Option<DailySession>, StoreError> {
        let rows = self
            .fetch_sessions(&[
                ("select", SESSION_COLUMNS.to_string()),
                ("user_id", eq_filter(user)),
                ("date", eq_filter(date)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        let response = self
            .authorize(self.client.post(self.table_url(SESSIONS_TABLE)))
            .header("Prefer", "return=representation")
            .query(&[("select", SESSION_COLUMNS)])
            .json(&json!({
                "user_id": user.as_str(),
                "date": date,
                "completed_count": completed_count,
                "total_work_minutes": total_work_minutes,
            }))
            .send()
            .await?;
        let rows: Vec<SessionRow> = check_status(response).await?.json().await?;
        single_row(rows, &format!("{} {}", user, date))
    }

    async fn update_session(
        &self,
        session_id: &str,
        completed_count: u32,
        total_work_minutes: u32,
    ) -> Result<DailySession, StoreError> {
        let response = self
            .authorize(self.client.patch(self.table_url(SESSIONS_TABLE)))
            .header("Prefer", "return=representation")
            .query(&[
                ("id", eq_filter(session_id)),
                ("select", SESSION_COLUMNS.to_string()),
            ])
            .json(&json!({
                "completed_count": completed_count,
                "total_work_minutes": total_work_minutes,
            }))
            .send()
            .await?;
        let rows: Vec<SessionRow> = check_status(response).await?.json().await?;
        single_row(rows, session_id)
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
        order_by_date_desc: bool,
    ) -> Result<Vec<DailySession>, StoreError> {
        self.fetch_sessions(&[
            ("select", SESSION_COLUMNS.to_string()),
            ("user_id", eq_filter(user)),
            ("order", order_clause(order_by_date_desc)),
            ("limit", limit.to_string()),
        ])
        .await
    }

    async fn get_daily_target(&self, user: &UserId) -> Result<Option<u8>, StoreError> {
        let response = self
            .authorize(self.client.get(self.table_url(TARGETS_TABLE)))
            .query(&[
                ("select", "daily_target".to_string()),
                ("user_id", eq_filter(user)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<TargetRow> = check_status(response).await?.json().await?;
        Ok(rows.first().map(|row| row.daily_target))
    }

    async fn set_daily_target(&self, user: &UserId, target: u8) -> Result<(), StoreError> {
        let response = self
            .authorize(self.client.post(self.table_url(TARGETS_TABLE)))
            .header("Prefer", "resolution=merge-duplicates")
            .query(&[("on_conflict", "user_id")])
            .json(&json!({
                "user_id": user.as_str(),
                "daily_target": target,
            }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
