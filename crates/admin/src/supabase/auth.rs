//! Auth service operations.
//!
//! Password sign-in and refresh both answer with a token pair; that pair is
//! what the console keeps in its session.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use super::{SupabaseClient, SupabaseError};
use crate::models::{AuthSession, AuthUser};

/// Token grant response from the auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
    /// Absolute expiry as a Unix timestamp, sent by newer servers.
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in));

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    /// Exchange an email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Api`] with the provider's message when the
    /// credentials are rejected ("Invalid login credentials").
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }));

        let response: TokenResponse = self.send_json(request).await?;
        Ok(response.into_session(Utc::now()))
    }

    /// Trade a refresh token for a new session.
    ///
    /// Refresh tokens are single use; the returned session carries its
    /// replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token is unknown, used, or revoked.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, SupabaseError> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&serde_json::json!({ "refresh_token": refresh_token }));

        let response: TokenResponse = self.send_json(request).await?;
        Ok(response.into_session(Utc::now()))
    }

    /// Look up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let request = self.request(Method::GET, "auth/v1/user", Some(access_token));
        self.send_json(request).await
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth service rejects the call.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let request = self.request(Method::POST, "auth/v1/logout", Some(access_token));
        self.send(request).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GRANT: &str = r#"{
        "access_token": "eyJhbGciOiJIUzI1NiJ9.a.b",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1760000000,
        "refresh_token": "v1.refresh",
        "user": {
            "id": "8d0f3c1e-2b4a-4c5d-9e6f-7a8b9c0d1e2f",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "owner@fasatina.sa"
        }
    }"#;

    #[test]
    fn test_grant_uses_absolute_expiry() {
        let response: TokenResponse = serde_json::from_str(GRANT).unwrap();
        let session = response.into_session(Utc::now());

        assert_eq!(session.expires_at.timestamp(), 1_760_000_000);
        assert_eq!(session.refresh_token, "v1.refresh");
        assert_eq!(session.user.email.as_deref(), Some("owner@fasatina.sa"));
    }

    #[test]
    fn test_grant_falls_back_to_lifetime() {
        let mut value: serde_json::Value = serde_json::from_str(GRANT).unwrap();
        value.as_object_mut().unwrap().remove("expires_at");
        let response: TokenResponse = serde_json::from_value(value).unwrap();

        let now = Utc::now();
        let session = response.into_session(now);
        assert_eq!(session.expires_at, now + Duration::seconds(3600));
    }
}
