//! Bank account persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{BankAccount, BankAccountPatch, NewBankAccount};

/// Bank account repository Trait
///
/// Every call goes to the backend; nothing is cached and nothing is retried.
///
/// Implementations:
/// - `RemoteAccountRepository` (contas-app): hosted data service
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account
    ///
    /// Returns the stored record with its server-assigned id and timestamps.
    /// Fails with `CoreError::RemoteWrite` when the backend rejects the insert.
    async fn create(&self, account: NewBankAccount) -> CoreResult<BankAccount>;

    /// All accounts owned by `owner_id`, newest first
    ///
    /// # Arguments
    /// * `owner_id` - Row-scoping key (the signed-in user's id)
    async fn list(&self, owner_id: &str) -> CoreResult<Vec<BankAccount>>;

    /// Get account based on ID
    async fn find_by_id(&self, id: i64) -> CoreResult<Option<BankAccount>>;

    /// Apply the fields set in `patch` and refresh `updated_at`
    ///
    /// Fails with `CoreError::RemoteWrite` when `id` does not exist, the
    /// precondition no longer holds, or the write is rejected.
    async fn update(&self, id: i64, patch: BankAccountPatch) -> CoreResult<BankAccount>;

    /// Delete account
    ///
    /// Fails with `CoreError::RemoteWrite` when `id` does not exist.
    async fn delete(&self, id: i64) -> CoreResult<()>;
}
