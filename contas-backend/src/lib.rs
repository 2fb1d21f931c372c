//! # contas-backend
//!
//! Client for the hosted backend-as-a-service behind Contas: authenticated row
//! operations over named tables plus email/password authentication.
//!
//! ## Implementations
//!
//! | Type | Transport | Use |
//! |------|-----------|-----|
//! | [`RestClient`] | HTTP (PostgREST data API, GoTrue auth API) | production |
//! | [`InMemoryBackend`] | in process | tests, `--demo` mode |
//!
//! Both implement [`DataClient`] and [`AuthClient`], so callers hold an
//! `Arc<dyn DataClient>` and never care which one is behind it.
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)*: use rustls for TLS.
//! - **`native-tls`**: use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use contas_backend::{
//!     AuthClient, DataClient, Filter, Order, RestClient, RestClientConfig, SelectQuery,
//! };
//!
//! # async fn example() -> contas_backend::Result<()> {
//! let client = RestClient::new(RestClientConfig::new(
//!     "https://xyzcompany.supabase.co",
//!     "public-anon-key",
//! ))?;
//! let session = client.sign_in_with_password("ana@example.com", "secret").await?;
//!
//! let query = SelectQuery::new()
//!     .filter(Filter::eq("codigo_empresa", session.user.id.as_str()))
//!     .order(Order::desc("created_at"));
//! let rows = client.select_rows("contas_bancarias", &query).await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every call returns [`Result<T, BackendError>`](BackendError). Service error
//! codes and HTTP statuses are folded into the variants, e.g.
//! [`BackendError::NotFound`] for a missing row and [`BackendError::Unauthorized`]
//! for bad credentials or an expired token. Nothing is retried.

mod error;
mod http_client;
mod memory;
mod rest;
mod traits;
mod types;
mod utils;

// Re-export error types
pub use error::{BackendError, Result};

pub use traits::{AuthClient, DataClient};

pub use types::{
    compare_values, format_timestamp, AuthUser, Filter, Order, Row, SelectQuery, Session,
};

pub use memory::{BackendOperation, InMemoryBackend};
pub use rest::{
    RestClient, RestClientConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};

pub use utils::log_sanitizer;
