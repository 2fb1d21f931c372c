//! Contas Core Library
//!
//! Platform-independent business logic for tracking bank accounts:
//! - Bank account model and the `AccountRepository` abstraction
//! - Session context with change notifications
//! - Authentication service
//! - Display helpers (account-number masking)
//!
//! Storage and transport are reached only through traits, so the same core runs
//! against the hosted backend or an in-memory one.

pub mod error;
pub mod services;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::AuthService;
pub use session::{SessionContext, SessionEvent, SessionSubscription};
pub use traits::AccountRepository;
