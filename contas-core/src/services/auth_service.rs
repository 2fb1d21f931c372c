//! Authentication service
//!
//! Password sign-in and sign-out against the backend, keeping the
//! [`SessionContext`] in step.

use std::sync::Arc;

use chrono::Utc;
use contas_backend::BackendError;

use crate::error::{CoreError, CoreResult, ValidationErrors};
use crate::session::SessionContext;
use crate::traits::AuthClient;
use crate::types::AuthUser;

pub struct AuthService {
    client: Arc<dyn AuthClient>,
    session: SessionContext,
}

impl AuthService {
    #[must_use]
    pub fn new(client: Arc<dyn AuthClient>, session: SessionContext) -> Self {
        Self { client, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.current_user()
    }

    /// Sign in with email and password.
    ///
    /// The email is trimmed; blank email or password fails with
    /// `CoreError::Validation` before anything is sent.
    pub async fn sign_in(&self, email: &str, password: &str) -> CoreResult<AuthUser> {
        let email = email.trim();
        let mut errors = ValidationErrors::new();
        if email.is_empty() {
            errors.add("email", "Email is required");
        }
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        let session = match self.client.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => {
                let err = CoreError::Auth(e);
                if err.is_expected() {
                    log::warn!("Sign-in failed for {email}: {err}");
                } else {
                    log::error!("Sign-in failed for {email}: {err}");
                }
                return Err(err);
            }
        };

        let user = session.user.clone();
        log::info!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id));
        self.session.set_session(session);
        Ok(user)
    }

    /// Sign out.
    ///
    /// The local session is cleared even when the backend call fails; the
    /// failure is still returned.
    pub async fn sign_out(&self) -> CoreResult<()> {
        let Some(token) = self.session.access_token() else {
            return Ok(());
        };

        let result = self.client.sign_out(&token).await;
        self.session.clear();
        result.map_err(|e| {
            log::warn!("Backend sign-out failed, local session cleared anyway: {e}");
            CoreError::Auth(e)
        })
    }

    /// Check the stored session against the backend.
    ///
    /// Returns the user when the session is still good. An expired or rejected
    /// session is cleared and `Ok(None)` returned; transport failures leave the
    /// session in place and are returned as errors.
    pub async fn verify_session(&self) -> CoreResult<Option<AuthUser>> {
        let Some(session) = self.session.current_session() else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            log::info!("Stored session expired");
            self.session.clear();
            return Ok(None);
        }

        match self.client.get_user(&session.access_token).await {
            Ok(user) => Ok(Some(user)),
            Err(e @ (BackendError::Unauthorized { .. } | BackendError::NotFound { .. })) => {
                log::warn!("Stored session rejected: {e}");
                self.session.clear();
                Ok(None)
            }
            Err(e) => Err(CoreError::Auth(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_session, MockAuthClient};
    use chrono::Duration;

    fn service() -> (AuthService, Arc<MockAuthClient>) {
        let client = Arc::new(MockAuthClient::new());
        let svc = AuthService::new(client.clone(), SessionContext::new());
        (svc, client)
    }

    #[tokio::test]
    async fn sign_in_trims_email_and_stores_session() {
        let (svc, client) = service();
        let user = svc.sign_in("  ana@example.com ", "secret").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(client.last_email().await.as_deref(), Some("ana@example.com"));
        assert_eq!(svc.current_user(), Some(user));
        assert!(svc.session().access_token().is_some());
    }

    #[tokio::test]
    async fn blank_credentials_never_reach_backend() {
        let (svc, client) = service();
        for (email, password) in [("", "secret"), ("   ", "secret"), ("ana@example.com", "")] {
            let err = svc.sign_in(email, password).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{err:?}");
        }
        let err = svc.sign_in(" ", "").await.unwrap_err();
        let CoreError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(client.sign_in_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_credentials_leave_session_empty() {
        let (svc, client) = service();
        client
            .set_sign_in_error(Some(BackendError::Unauthorized {
                raw_message: Some("Invalid login credentials".to_string()),
            }))
            .await;
        let err = svc.sign_in("ana@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(BackendError::Unauthorized { .. })));
        assert!(svc.current_user().is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_even_on_failure() {
        let (svc, client) = service();
        svc.sign_in("ana@example.com", "secret").await.unwrap();
        client
            .set_sign_out_error(Some(BackendError::Network {
                detail: "offline".to_string(),
            }))
            .await;

        let err = svc.sign_out().await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(BackendError::Network { .. })));
        assert!(svc.current_user().is_none());
        assert_eq!(client.sign_out_calls(), 1);
    }

    #[tokio::test]
    async fn sign_out_without_session_is_noop() {
        let (svc, client) = service();
        svc.sign_out().await.unwrap();
        assert_eq!(client.sign_out_calls(), 0);
    }

    #[tokio::test]
    async fn verify_session_clears_expired_and_rejected() {
        let (svc, client) = service();
        assert_eq!(svc.verify_session().await.unwrap(), None);

        let mut expired = make_session("u-1");
        expired.expires_at = Some(Utc::now() - Duration::seconds(5));
        svc.session().set_session(expired);
        assert_eq!(svc.verify_session().await.unwrap(), None);
        assert!(!svc.session().is_signed_in());

        svc.session().set_session(make_session("u-1"));
        assert_eq!(
            svc.verify_session().await.unwrap().map(|u| u.id),
            Some("u-1".to_string())
        );

        client
            .set_get_user_error(Some(BackendError::Unauthorized { raw_message: None }))
            .await;
        assert_eq!(svc.verify_session().await.unwrap(), None);
        assert!(!svc.session().is_signed_in());
    }

    #[tokio::test]
    async fn verify_session_keeps_session_on_transport_error() {
        let (svc, client) = service();
        svc.session().set_session(make_session("u-1"));
        client
            .set_get_user_error(Some(BackendError::Timeout {
                detail: "30s".to_string(),
            }))
            .await;
        assert!(svc.verify_session().await.is_err());
        assert!(svc.session().is_signed_in());
    }
}
