//! GoTrue auth endpoints

use super::RestGateway;
use crate::gateway::{AuthGateway, AuthSession, AuthUser};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    password: &'a str,
}

/// `/token?grant_type=password` response
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

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

impl RestGateway {
    fn auth_request(&self, method: Method, path: &str, session: &AuthSession) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.config.auth_url(path))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&session.access_token)
    }
}

#[async_trait]
impl AuthGateway for RestGateway {
    async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthSession> {
        let response = self
            .client
            .post(self.config.auth_url("token?grant_type=password"))
            .header("apikey", &self.config.api_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        // GoTrue answers bad credentials with 400 invalid_grant
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED
        ) {
            let err = Self::error_from(response).await;
            tracing::warn!(email = email, "Sign-in rejected: {}", err);
            return Err(ClientError::Unauthorized("Invalid login credentials".into()));
        }

        let token: TokenResponse = Self::handle_response(response).await?;
        let session = AuthSession::from(token);
        self.set_access_token(session.access_token.clone());
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn current_user(&self, session: &AuthSession) -> ClientResult<AuthUser> {
        let response = self
            .auth_request(Method::GET, "user", session)
            .send()
            .await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized("session is no longer valid".into()));
        }
        Self::handle_response(response).await
    }

    async fn sign_out(&self, session: &AuthSession) -> ClientResult<()> {
        let response = self
            .auth_request(Method::POST, "logout", session)
            .send()
            .await?;
        self.clear_access_token();
        match response.status() {
            // already invalid on the server side
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(()),
            _ => Self::handle_empty(response).await,
        }
    }

    async fn update_password(
        &self,
        session: &AuthSession,
        new_password: &str,
    ) -> ClientResult<()> {
        let response = self
            .auth_request(Method::PUT, "user", session)
            .json(&PasswordChange {
                password: new_password,
            })
            .send()
            .await?;
        Self::handle_empty(response).await
    }
}
