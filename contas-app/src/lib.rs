//! Platform-agnostic application bootstrap for Contas.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter injection),
//! file/env configuration and the accounts screen controller.

pub mod adapters;
pub mod config;
pub mod screen;

use std::sync::Arc;

use contas_backend::{AuthClient, DataClient};
use contas_core::error::{CoreError, CoreResult, ValidationErrors};
use contas_core::services::AuthService;
use contas_core::traits::AccountRepository;
use contas_core::SessionContext;

use adapters::RemoteAccountRepository;
use screen::AccountsScreen;

/// Platform-agnostic application state.
///
/// Every frontend constructs this once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Shared session; screens subscribe to it
    pub session: SessionContext,
    pub auth_service: Arc<AuthService>,
    pub account_repository: Arc<dyn AccountRepository>,
}

impl AppState {
    /// New accounts screen bound to this state's repository and session.
    ///
    /// The screen does nothing until [`AccountsScreen::mount`] is called.
    pub fn accounts_screen(&self) -> AccountsScreen {
        AccountsScreen::new(Arc::clone(&self.account_repository), self.session.clone())
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `auth_client`
/// - `account_repository`, or a `data_client` to build the remote one from
///
/// # Optional
/// - `session`: defaults to a fresh signed-out context
#[derive(Default)]
pub struct AppStateBuilder {
    auth_client: Option<Arc<dyn AuthClient>>,
    data_client: Option<Arc<dyn DataClient>>,
    account_repository: Option<Arc<dyn AccountRepository>>,
    session: Option<SessionContext>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one backend for both auth and data.
    #[must_use]
    pub fn backend<B>(self, backend: Arc<B>) -> Self
    where
        B: AuthClient + DataClient + 'static,
    {
        let data: Arc<dyn DataClient> = backend.clone();
        self.auth_client(backend).data_client(data)
    }

    #[must_use]
    pub fn auth_client(mut self, client: Arc<dyn AuthClient>) -> Self {
        self.auth_client = Some(client);
        self
    }

    #[must_use]
    pub fn data_client(mut self, client: Arc<dyn DataClient>) -> Self {
        self.data_client = Some(client);
        self
    }

    /// Override the repository; takes precedence over `data_client`.
    #[must_use]
    pub fn account_repository(mut self, repo: Arc<dyn AccountRepository>) -> Self {
        self.account_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn session(mut self, session: SessionContext) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::Validation` if required adapters are missing.
    pub fn build(self) -> CoreResult<AppState> {
        let auth_client = self.auth_client.ok_or_else(|| {
            CoreError::Validation(ValidationErrors::single("auth_client", "is required"))
        })?;
        let account_repository = match (self.account_repository, self.data_client) {
            (Some(repo), _) => repo,
            (None, Some(client)) => Arc::new(RemoteAccountRepository::new(client)),
            (None, None) => {
                return Err(CoreError::Validation(ValidationErrors::single(
                    "account_repository",
                    "is required (or provide a data_client)",
                )));
            }
        };
        let session = self.session.unwrap_or_default();
        let auth_service = Arc::new(AuthService::new(auth_client, session.clone()));

        Ok(AppState {
            session,
            auth_service,
            account_repository,
        })
    }
}
