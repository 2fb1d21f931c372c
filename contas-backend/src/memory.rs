//! In-process backend.
//!
//! Emulates what the hosted service does on its side: integer ids, `created_at` /
//! `updated_at` stamping, filtering, ordering and password sign-in. Failures can be
//! injected per operation so callers can exercise their error paths.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{BackendError, Result};
use crate::traits::{AuthClient, DataClient};
use crate::types::{compare_values, format_timestamp, AuthUser, Filter, Row, SelectQuery, Session};

const ID_COLUMN: &str = "id";
const CREATED_AT_COLUMN: &str = "created_at";
const UPDATED_AT_COLUMN: &str = "updated_at";

/// Session lifetime handed out by [`InMemoryBackend::sign_in_with_password`].
const SESSION_TTL_SECS: i64 = 3600;

/// Operations that can be made to fail with [`InMemoryBackend::set_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    Insert,
    Select,
    Update,
    Delete,
    SignIn,
    SignOut,
    GetUser,
}

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: Vec<Row>,
}

struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Table>,
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, AuthUser>,
    failures: HashMap<BackendOperation, BackendError>,
    last_stamp: Option<DateTime<Utc>>,
}

impl State {
    fn check(&self, op: BackendOperation) -> Result<()> {
        match self.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Strictly increasing timestamp, truncated to what the store keeps.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now
    }
}

/// Backend that keeps every table and session in memory.
#[derive(Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user that can sign in with `email` / `password`.
    ///
    /// Returns the generated user.
    pub async fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.state.write().await.accounts.insert(
            email.to_lowercase(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Make every later call of `op` fail with `error` (`None` restores normal behavior).
    pub async fn set_failure(&self, op: BackendOperation, error: Option<BackendError>) {
        let mut state = self.state.write().await;
        match error {
            Some(err) => {
                state.failures.insert(op, err);
            }
            None => {
                state.failures.remove(&op);
            }
        }
    }

    /// Store a row exactly as given, bypassing id assignment and stamping.
    pub async fn insert_raw_row(&self, table: &str, row: Row) {
        self.state
            .write()
            .await
            .tables
            .entry(table.to_string())
            .or_default()
            .rows
            .push(row);
    }

    pub async fn row_count(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

fn matches_all(filters: &[Filter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

fn reject_unfiltered(table: &str, filters: &[Filter]) -> Result<()> {
    if filters.is_empty() {
        return Err(BackendError::InvalidRequest {
            raw_code: None,
            raw_message: format!("refusing unfiltered write on {table}"),
        });
    }
    Ok(())
}

fn id_column_error(action: &str) -> BackendError {
    BackendError::InvalidRequest {
        raw_code: Some("428C9".to_string()),
        raw_message: format!("cannot {action} column \"{ID_COLUMN}\""),
    }
}

#[async_trait]
impl DataClient for InMemoryBackend {
    async fn insert_row(&self, table: &str, mut row: Row) -> Result<Row> {
        let mut state = self.state.write().await;
        state.check(BackendOperation::Insert)?;
        if row.get(ID_COLUMN).is_some_and(|v| !v.is_null()) {
            return Err(id_column_error("insert into"));
        }

        let stamp = format_timestamp(&state.next_stamp());
        let table = state.tables.entry(table.to_string()).or_default();
        table.last_id += 1;
        row.insert(ID_COLUMN.to_string(), Value::from(table.last_id));
        row.insert(CREATED_AT_COLUMN.to_string(), Value::String(stamp));
        row.entry(UPDATED_AT_COLUMN.to_string())
            .or_insert(Value::Null);
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn select_rows(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>> {
        let state = self.state.read().await;
        state.check(BackendOperation::Select)?;
        let Some(table) = state.tables.get(table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(usize, &Row)> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(&query.filters, row))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by(|(ia, a), (ib, b)| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column))
                    .then_with(|| ia.cmp(ib));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn update_rows(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>> {
        reject_unfiltered(table, filters)?;
        let mut state = self.state.write().await;
        state.check(BackendOperation::Update)?;
        if changes.contains_key(ID_COLUMN) {
            return Err(id_column_error("update"));
        }

        let matched = state
            .tables
            .get(table)
            .is_some_and(|t| t.rows.iter().any(|row| matches_all(filters, row)));
        if !matched {
            return Ok(Vec::new());
        }

        let stamp = Value::String(format_timestamp(&state.next_stamp()));
        let mut updated = Vec::new();
        if let Some(table) = state.tables.get_mut(table) {
            for row in table.rows.iter_mut().filter(|row| matches_all(filters, row)) {
                for (column, value) in &changes {
                    row.insert(column.clone(), value.clone());
                }
                row.insert(UPDATED_AT_COLUMN.to_string(), stamp.clone());
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete_rows(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>> {
        reject_unfiltered(table, filters)?;
        let mut state = self.state.write().await;
        state.check(BackendOperation::Delete)?;
        let Some(table) = state.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (deleted, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut table.rows)
            .into_iter()
            .partition(|row| matches_all(filters, row));
        table.rows = kept;
        Ok(deleted)
    }
}

#[async_trait]
impl AuthClient for InMemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.state.write().await;
        state.check(BackendOperation::SignIn)?;
        let user = match state.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => {
                return Err(BackendError::Unauthorized {
                    raw_message: Some("Invalid login credentials".to_string()),
                })
            }
        };

        let access_token = uuid::Uuid::new_v4().to_string();
        state.sessions.insert(access_token.clone(), user.clone());
        Ok(Session {
            access_token,
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            expires_at: Some(Utc::now() + Duration::seconds(SESSION_TTL_SECS)),
            user,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.check(BackendOperation::SignOut)?;
        state.sessions.remove(access_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let state = self.state.read().await;
        state.check(BackendOperation::GetUser)?;
        state
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(BackendError::Unauthorized {
                raw_message: Some("invalid JWT".to_string()),
            })
    }
}
