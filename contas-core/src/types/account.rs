//! Bank account types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 40;
/// Longest accepted account number, in characters.
pub const MAX_ACCOUNT_NUMBER_CHARS: usize = 20;

/// A stored bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    /// Assigned by the backend on creation
    pub id: Option<i64>,
    /// Internal account/bank linkage code
    pub account_bank_code: i64,
    /// Owning user's id
    pub owner_id: String,
    pub bank_code: i64,
    pub branch_code: i64,
    /// User-facing label
    pub description: String,
    /// Raw account number; mask it before display
    pub account_number: String,
    #[serde(default, with = "crate::utils::datetime::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::utils::datetime::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create request. The backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBankAccount {
    pub account_bank_code: i64,
    pub owner_id: String,
    pub bank_code: i64,
    pub branch_code: i64,
    pub description: String,
    pub account_number: String,
}

/// Guard attached to an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Apply whatever the row currently holds.
    #[default]
    None,
    /// Apply only while the row's `updated_at` still equals this value
    /// (`None` meaning the row was never updated).
    UpdatedAt(Option<DateTime<Utc>>),
}

/// Partial update. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankAccountPatch {
    pub account_bank_code: Option<i64>,
    pub bank_code: Option<i64>,
    pub branch_code: Option<i64>,
    pub description: Option<String>,
    pub account_number: Option<String>,
    pub precondition: Precondition,
}

impl BankAccountPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account_bank_code(mut self, value: i64) -> Self {
        self.account_bank_code = Some(value);
        self
    }

    #[must_use]
    pub fn bank_code(mut self, value: i64) -> Self {
        self.bank_code = Some(value);
        self
    }

    #[must_use]
    pub fn branch_code(mut self, value: i64) -> Self {
        self.branch_code = Some(value);
        self
    }

    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    #[must_use]
    pub fn account_number(mut self, value: impl Into<String>) -> Self {
        self.account_number = Some(value.into());
        self
    }

    /// Only apply while the row still carries `updated_at`.
    #[must_use]
    pub fn expect_updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.precondition = Precondition::UpdatedAt(updated_at);
        self
    }

    /// No field is set (the update would only refresh `updated_at`).
    pub fn is_empty(&self) -> bool {
        self.account_bank_code.is_none()
            && self.bank_code.is_none()
            && self.branch_code.is_none()
            && self.description.is_none()
            && self.account_number.is_none()
    }
}
