//! Password sign-in, sign-out and user lookup over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::RestClient;
use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::AuthClient;
use crate::types::{AuthUser, Session};
use crate::utils::log_sanitizer::redact_token;

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|ttl| now.checked_add_signed(ttl))
            });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[async_trait]
impl AuthClient for RestClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.auth_url("token?grant_type=password");
        let request = self
            .client
            .request(Method::POST, &url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password });

        let text = HttpUtils::execute_expecting_success(request, "POST", &url, "auth").await?;
        let response: TokenResponse = HttpUtils::parse_json(&text)?;
        let session = response.into_session(Utc::now());

        log::info!(
            "Signed in user {} (token {})",
            session.user.id,
            redact_token(&session.access_token)
        );
        self.set_access_token(Some(session.access_token.clone()))
            .await;
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let url = self.auth_url("logout");
        let request = self
            .client
            .request(Method::POST, &url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {access_token}"));

        // The local token goes away whatever the service answers.
        self.set_access_token(None).await;
        HttpUtils::execute_expecting_success(request, "POST", &url, "auth").await?;
        log::info!("Signed out (token {})", redact_token(access_token));
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let url = self.auth_url("user");
        let request = self
            .client
            .request(Method::GET, &url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {access_token}"));

        let text = HttpUtils::execute_expecting_success(request, "GET", &url, "auth").await?;
        HttpUtils::parse_json(&text)
    }
}
