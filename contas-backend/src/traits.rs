use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AuthUser, Filter, Row, SelectQuery, Session};

/// Relational data service: authenticated row operations over named tables.
///
/// Implementations:
/// - [`RestClient`](crate::RestClient): hosted service over HTTP
/// - [`InMemoryBackend`](crate::InMemoryBackend): in-process store for tests and demos
#[async_trait]
pub trait DataClient: Send + Sync {
    /// Insert one row and return it as stored, server-assigned columns included.
    async fn insert_row(&self, table: &str, row: Row) -> Result<Row>;

    /// Select rows matching every filter, in the requested order.
    async fn select_rows(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>>;

    /// Apply `changes` to every row matching the filters.
    ///
    /// Returns the changed rows; an empty vec means nothing matched.
    async fn update_rows(&self, table: &str, filters: &[Filter], changes: Row)
        -> Result<Vec<Row>>;

    /// Delete every row matching the filters.
    ///
    /// Returns the deleted rows; an empty vec means nothing matched.
    async fn delete_rows(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>>;
}

/// Authentication service.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Revoke the session identified by `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Resolve the user behind `access_token`.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser>;
}
