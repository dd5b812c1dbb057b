//! GoTrue password auth.

use crate::client::{Session, SupabaseClient};
use crate::error::{response_message, transport_message};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use todosync_core::providers::BoxFuture;
use todosync_core::{AuthError, AuthProvider, Credentials, Identity, UserId};
use tracing::{debug, error, info, warn};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

impl From<UserResponse> for Identity {
    fn from(user: UserResponse) -> Self {
        Self::new(UserId::new(user.id), user.email)
    }
}

impl SupabaseClient {
    async fn password_sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        debug!(email = %credentials.email, "Signing in with password");

        let response = self
            .auth_request(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email: &credentials.email,
                password: credentials.password(),
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(transport_message(&e, self.config.request_timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let (status, message) = response_message(response).await;
            return Err(
                if matches!(
                    status,
                    StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
                ) {
                    debug!(%status, "Credentials rejected");
                    AuthError::InvalidCredentials(message)
                } else {
                    error!(%status, %message, "Unexpected response from auth service");
                    AuthError::Network(message)
                },
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("failed to parse token response: {e}")))?;

        let identity = Identity::from(token.user);
        *self.session.write().await = Some(Session {
            access_token: token.access_token,
            identity: Some(identity.clone()),
        });

        info!(user_id = %identity.id, "Signed in");
        Ok(identity)
    }

    async fn fetch_current_user(&self) -> Option<Identity> {
        let token = self.access_token().await?;

        let response = match self
            .auth_request(Method::GET, "user")
            .bearer_auth(&token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %transport_message(&e, self.config.request_timeout), "Could not confirm session");
                return None;
            },
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Stored session is no longer valid");
            self.session.write().await.take();
            return None;
        }
        if !status.is_success() {
            let (status, message) = response_message(response).await;
            error!(%status, %message, "Unexpected response from auth service");
            return None;
        }

        match response.json::<UserResponse>().await {
            Ok(user) => {
                let identity = Identity::from(user);
                if let Some(session) = self.session.write().await.as_mut() {
                    session.identity = Some(identity.clone());
                }
                Some(identity)
            },
            Err(e) => {
                warn!(error = %e, "Failed to parse user response");
                None
            },
        }
    }

    async fn remote_sign_out(&self) -> Result<(), AuthError> {
        // Local session material goes first so a failed call cannot keep it alive.
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        let response = self
            .auth_request(Method::POST, "logout")
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(transport_message(&e, self.config.request_timeout)))?;

        if !response.status().is_success() {
            let (_, message) = response_message(response).await;
            return Err(AuthError::Network(message));
        }

        match &session.identity {
            Some(identity) => info!(user_id = %identity.id, "Signed out"),
            None => info!("Signed out"),
        }
        Ok(())
    }
}

impl AuthProvider for SupabaseClient {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(self.password_sign_in(credentials))
    }

    fn current_user(&self) -> BoxFuture<'_, Option<Identity>> {
        Box::pin(self.fetch_current_user())
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(self.remote_sign_out())
    }
}
