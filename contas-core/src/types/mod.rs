//! Type definitions

mod account;

pub use account::{
    BankAccount, BankAccountPatch, NewBankAccount, Precondition, MAX_ACCOUNT_NUMBER_CHARS,
    MAX_DESCRIPTION_CHARS,
};

pub use contas_backend::{AuthUser, Session};
