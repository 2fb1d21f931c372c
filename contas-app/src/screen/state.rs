//! Account screen state

use serde::Serialize;

use contas_core::types::BankAccount;
use contas_core::CoreError;

use super::form::{AccountForm, AccountField, FieldErrors};

/// Screen lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// First load not finished yet
    #[default]
    Loading,
    Ready,
}

/// What the form modal is doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FormMode {
    Add,
    /// Editing a stored account; `original` is the record the form was opened from.
    Edit { id: i64, original: BankAccount },
}

/// Open add/edit modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalState {
    pub mode: FormMode,
    pub form: AccountForm,
    /// Per-field validation messages
    pub field_errors: FieldErrors,
    /// Save failure shown at the top of the modal
    pub error: Option<String>,
}

impl ModalState {
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            form: AccountForm::default(),
            field_errors: FieldErrors::new(),
            error: None,
        }
    }

    pub fn edit(id: i64, account: &BankAccount) -> Self {
        Self {
            mode: FormMode::Edit {
                id,
                original: account.clone(),
            },
            form: AccountForm::from_account(account),
            field_errors: FieldErrors::new(),
            error: None,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn field_error(&self, field: AccountField) -> Option<&str> {
        self.field_errors.get(&field).map(String::as_str)
    }
}

/// Account awaiting delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDelete {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Loading the list failed
    LoadFailed,
    /// A delete failed
    DeleteFailed,
    /// A save finished after its modal was closed
    SaveFailed,
    NotSignedIn,
}

/// One-shot message for the presentation to show and dismiss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_signed_in() -> Self {
        Self::new(AlertKind::NotSignedIn, "Sign in to see your accounts")
    }
}

/// User-facing text for an error.
pub fn describe_error(err: &CoreError) -> String {
    if err.is_conflict() {
        return "This account was changed elsewhere. Reopen it and try again.".to_string();
    }
    err.to_string()
}

/// Snapshot of everything the presentation renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountsState {
    pub phase: Phase,
    /// Accounts of `owner_id`, newest first
    pub accounts: Vec<BankAccount>,
    /// User the collection belongs to
    pub owner_id: Option<String>,
    /// A list call is in flight
    pub loading: bool,
    /// A save is in flight
    pub submitting: bool,
    /// A confirmed delete is in flight
    pub deleting: bool,
    pub modal: Option<ModalState>,
    pub pending_delete: Option<PendingDelete>,
    pub alert: Option<Alert>,
}

impl AccountsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal.is_some()
    }

    pub fn find(&self, id: i64) -> Option<&BankAccount> {
        self.accounts.iter().find(|a| a.id == Some(id))
    }

    /// Forget everything tied to the signed-in user.
    pub(crate) fn reset_for_sign_out(&mut self) {
        self.accounts.clear();
        self.owner_id = None;
        self.modal = None;
        self.pending_delete = None;
        self.phase = Phase::Ready;
        self.loading = false;
        self.alert = Some(Alert::not_signed_in());
    }
}
