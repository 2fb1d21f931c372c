//! Storage layer abstraction trait definition

mod account_repository;

pub use account_repository::AccountRepository;

pub use contas_backend::{AuthClient, DataClient};
