//! Storage adapters for the core traits.

mod remote_account_repo;

pub use remote_account_repo::{columns, decode_row, RemoteAccountRepository, TABLE};
