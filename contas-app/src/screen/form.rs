//! Account form: editable text fields and their validation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use contas_core::error::ValidationErrors;
use contas_core::types::{
    BankAccount, BankAccountPatch, NewBankAccount, MAX_ACCOUNT_NUMBER_CHARS, MAX_DESCRIPTION_CHARS,
};

/// Editable field of the account form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountField {
    AccountBankCode,
    BankCode,
    BranchCode,
    Description,
    AccountNumber,
}

impl AccountField {
    /// Every field, in display order.
    pub const ALL: [Self; 5] = [
        Self::Description,
        Self::BankCode,
        Self::BranchCode,
        Self::AccountNumber,
        Self::AccountBankCode,
    ];

    /// Machine-readable key.
    pub fn key(self) -> &'static str {
        match self {
            Self::AccountBankCode => "account_bank_code",
            Self::BankCode => "bank_code",
            Self::BranchCode => "branch_code",
            Self::Description => "description",
            Self::AccountNumber => "account_number",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AccountBankCode => "Account code",
            Self::BankCode => "Bank code",
            Self::BranchCode => "Branch",
            Self::Description => "Description",
            Self::AccountNumber => "Account number",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::AccountBankCode | Self::BankCode | Self::BranchCode
        )
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AccountField {
    type Err = String;

    /// Accepts the key or a short alias (`code`, `bank`, `branch`, `number`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account_bank_code" | "code" => Ok(Self::AccountBankCode),
            "bank_code" | "bank" => Ok(Self::BankCode),
            "branch_code" | "branch" => Ok(Self::BranchCode),
            "description" | "desc" => Ok(Self::Description),
            "account_number" | "number" => Ok(Self::AccountNumber),
            other => Err(format!("unknown field {other:?}")),
        }
    }
}

/// Field errors keyed by field.
pub type FieldErrors = BTreeMap<AccountField, String>;

/// Raw text of every form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountForm {
    pub account_bank_code: String,
    pub bank_code: String,
    pub branch_code: String,
    pub description: String,
    pub account_number: String,
}

/// Form contents that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub account_bank_code: i64,
    pub bank_code: i64,
    pub branch_code: i64,
    pub description: String,
    pub account_number: String,
}

impl AccountForm {
    /// Form pre-filled from a stored account (numbers as text).
    pub fn from_account(account: &BankAccount) -> Self {
        Self {
            account_bank_code: account.account_bank_code.to_string(),
            bank_code: account.bank_code.to_string(),
            branch_code: account.branch_code.to_string(),
            description: account.description.clone(),
            account_number: account.account_number.clone(),
        }
    }

    pub fn get(&self, field: AccountField) -> &str {
        match field {
            AccountField::AccountBankCode => &self.account_bank_code,
            AccountField::BankCode => &self.bank_code,
            AccountField::BranchCode => &self.branch_code,
            AccountField::Description => &self.description,
            AccountField::AccountNumber => &self.account_number,
        }
    }

    pub fn set(&mut self, field: AccountField, value: impl Into<String>) {
        let slot = match field {
            AccountField::AccountBankCode => &mut self.account_bank_code,
            AccountField::BankCode => &mut self.bank_code,
            AccountField::BranchCode => &mut self.branch_code,
            AccountField::Description => &mut self.description,
            AccountField::AccountNumber => &mut self.account_number,
        };
        *slot = value.into();
    }

    /// Check every field.
    ///
    /// Values are trimmed; lengths count characters. On failure every offending
    /// field gets one message.
    pub fn validate(&self) -> Result<ValidatedForm, FieldErrors> {
        let mut errors = FieldErrors::new();

        for field in AccountField::ALL {
            let value = self.get(field).trim();
            if value.is_empty() {
                errors.insert(field, format!("{} is required", field.label()));
            } else if field.is_numeric() && value.parse::<i64>().is_err() {
                errors.insert(field, format!("{} must be a whole number", field.label()));
            }
        }

        let description = self.description.trim();
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.entry(AccountField::Description).or_insert_with(|| {
                format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters")
            });
        }
        let account_number = self.account_number.trim();
        if account_number.chars().count() > MAX_ACCOUNT_NUMBER_CHARS {
            errors.entry(AccountField::AccountNumber).or_insert_with(|| {
                format!("Account number must be at most {MAX_ACCOUNT_NUMBER_CHARS} characters")
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let number = |field: AccountField| self.get(field).trim().parse::<i64>().unwrap_or_default();
        Ok(ValidatedForm {
            account_bank_code: number(AccountField::AccountBankCode),
            bank_code: number(AccountField::BankCode),
            branch_code: number(AccountField::BranchCode),
            description: description.to_string(),
            account_number: account_number.to_string(),
        })
    }
}

impl ValidatedForm {
    pub fn into_new(self, owner_id: impl Into<String>) -> NewBankAccount {
        NewBankAccount {
            account_bank_code: self.account_bank_code,
            owner_id: owner_id.into(),
            bank_code: self.bank_code,
            branch_code: self.branch_code,
            description: self.description,
            account_number: self.account_number,
        }
    }

    /// Patch holding only the fields that differ from `original`, guarded by
    /// the `updated_at` the form was opened with.
    pub fn patch_against(self, original: &BankAccount) -> BankAccountPatch {
        let mut patch = BankAccountPatch::new().expect_updated_at(original.updated_at);
        if self.account_bank_code != original.account_bank_code {
            patch = patch.account_bank_code(self.account_bank_code);
        }
        if self.bank_code != original.bank_code {
            patch = patch.bank_code(self.bank_code);
        }
        if self.branch_code != original.branch_code {
            patch = patch.branch_code(self.branch_code);
        }
        if self.description != original.description {
            patch = patch.description(self.description);
        }
        if self.account_number != original.account_number {
            patch = patch.account_number(self.account_number);
        }
        patch
    }
}

/// Core-level view of field errors, for logging and transport.
pub fn to_validation_errors(errors: &FieldErrors) -> ValidationErrors {
    let mut out = ValidationErrors::new();
    for (field, message) in errors {
        out.add(field.key(), message.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use contas_core::types::Precondition;

    fn filled() -> AccountForm {
        AccountForm {
            account_bank_code: "10".to_string(),
            bank_code: "1".to_string(),
            branch_code: "1234".to_string(),
            description: "Conta Teste".to_string(),
            account_number: "12345-6".to_string(),
        }
    }

    fn stored() -> BankAccount {
        BankAccount {
            id: Some(7),
            account_bank_code: 10,
            owner_id: "u-1".to_string(),
            bank_code: 1,
            branch_code: 1234,
            description: "Conta Teste".to_string(),
            account_number: "12345-6".to_string(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn valid_form_parses_numbers() {
        let valid = filled().validate().unwrap();
        assert_eq!(valid.branch_code, 1234);
        let new = valid.into_new("u-1");
        assert_eq!(new.owner_id, "u-1");
        assert_eq!(new.description, "Conta Teste");
    }

    #[test]
    fn blank_fields_are_required() {
        let mut form = filled();
        form.set(AccountField::Description, "   ");
        form.set(AccountField::BankCode, "");
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[&AccountField::Description], "Description is required");
        assert_eq!(errors[&AccountField::BankCode], "Bank code is required");
    }

    #[test]
    fn length_limits_count_characters() {
        let mut form = filled();
        form.set(AccountField::Description, "ç".repeat(40));
        form.set(AccountField::AccountNumber, "9".repeat(20));
        assert!(form.validate().is_ok());

        form.set(AccountField::Description, "a".repeat(41));
        form.set(AccountField::AccountNumber, "9".repeat(21));
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key(&AccountField::Description));
        assert!(errors.contains_key(&AccountField::AccountNumber));
    }

    #[test]
    fn non_numeric_codes_are_rejected() {
        let mut form = filled();
        form.set(AccountField::BranchCode, "12a");
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(&AccountField::BranchCode).map(String::as_str),
            Some("Branch must be a whole number")
        );
    }

    #[test]
    fn form_round_trips_stored_account() {
        let form = AccountForm::from_account(&stored());
        assert_eq!(form, filled());
    }

    #[test]
    fn patch_contains_only_changes() {
        let mut form = AccountForm::from_account(&stored());
        form.set(AccountField::Description, "Conta Nova");
        let patch = form.validate().unwrap().patch_against(&stored());
        assert_eq!(patch.description.as_deref(), Some("Conta Nova"));
        assert!(patch.bank_code.is_none());
        assert!(patch.account_number.is_none());
        assert_eq!(patch.precondition, Precondition::UpdatedAt(None));
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("bank".parse::<AccountField>(), Ok(AccountField::BankCode));
        assert_eq!(
            "Account_Number".parse::<AccountField>(),
            Ok(AccountField::AccountNumber)
        );
        assert!("iban".parse::<AccountField>().is_err());
    }

    #[test]
    fn field_errors_convert_to_core_errors() {
        let mut errors = FieldErrors::new();
        errors.insert(AccountField::Description, "Description is required".to_string());
        let core = to_validation_errors(&errors);
        assert_eq!(core.get("description"), Some("Description is required"));
    }
}
