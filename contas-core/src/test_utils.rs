//! Test helpers
//!
//! Mock implementations with call counters and error injection.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contas_backend::BackendError;
use tokio::sync::RwLock;

use crate::traits::AuthClient;
use crate::types::{AuthUser, Session};

pub fn make_session(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: None,
        expires_at: None,
        user: AuthUser {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
        },
    }
}

// ===== MockAuthClient =====

/// Accepts any credentials; the user id is the part of the email before `@`.
pub struct MockAuthClient {
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
    last_email: RwLock<Option<String>>,
    sign_in_error: RwLock<Option<BackendError>>,
    sign_out_error: RwLock<Option<BackendError>>,
    get_user_error: RwLock<Option<BackendError>>,
}

impl MockAuthClient {
    pub fn new() -> Self {
        Self {
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            last_email: RwLock::new(None),
            sign_in_error: RwLock::new(None),
            sign_out_error: RwLock::new(None),
            get_user_error: RwLock::new(None),
        }
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub async fn last_email(&self) -> Option<String> {
        self.last_email.read().await.clone()
    }

    pub async fn set_sign_in_error(&self, err: Option<BackendError>) {
        *self.sign_in_error.write().await = err;
    }

    pub async fn set_sign_out_error(&self, err: Option<BackendError>) {
        *self.sign_out_error.write().await = err;
    }

    pub async fn set_get_user_error(&self, err: Option<BackendError>) {
        *self.get_user_error.write().await = err;
    }
}

#[async_trait]
impl AuthClient for MockAuthClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> contas_backend::Result<Session> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_email.write().await = Some(email.to_string());
        if let Some(ref err) = *self.sign_in_error.read().await {
            return Err(err.clone());
        }
        let user_id = email.split('@').next().unwrap_or(email);
        let mut session = make_session(user_id);
        session.user.email = Some(email.to_string());
        Ok(session)
    }

    async fn sign_out(&self, _access_token: &str) -> contas_backend::Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref err) = *self.sign_out_error.read().await {
            return Err(err.clone());
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> contas_backend::Result<AuthUser> {
        if let Some(ref err) = *self.get_user_error.read().await {
            return Err(err.clone());
        }
        let user_id = access_token.trim_start_matches("token-");
        Ok(make_session(user_id).user)
    }
}
