//! Session-related types for admin authentication.
//!
//! The auth service issues a short-lived access token and a refresh token
//! at sign-in. Both live in the admin's server-side session; the browser
//! only ever holds the session cookie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use fasatina_core::AdminUserId;

/// Tokens are treated as expired this long before they actually are.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

/// A user record from the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: AdminUserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session-stored token pair for a signed-in admin.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

impl AuthSession {
    /// Whether the access token must be refreshed before use.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECONDS) <= now
    }
}

/// The admin a gated request runs as.
#[derive(Clone)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: String,
    access_token: String,
}

impl std::fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("id", &self.id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl CurrentAdmin {
    /// Identity for a verified session and the user it resolved to.
    #[must_use]
    pub fn new(session: &AuthSession, user: &AuthUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone().unwrap_or_default(),
            access_token: session.access_token.clone(),
        }
    }

    /// Bearer token for calls made on this admin's behalf.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the signed-in admin's [`super::AuthSession`].
    pub const AUTH_SESSION: &str = "auth_session";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: "access-secret".to_string(),
            refresh_token: "refresh-secret".to_string(),
            expires_at,
            user: AuthUser {
                id: AdminUserId::new("8d0f"),
                email: Some("owner@fasatina.sa".to_string()),
            },
        }
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc::now();
        assert!(!session(now + Duration::minutes(10)).is_expired(now));
        assert!(session(now + Duration::seconds(10)).is_expired(now));
        assert!(session(now - Duration::minutes(1)).is_expired(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = session(Utc::now());
        let debug = format!("{session:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));

        let admin = CurrentAdmin::new(&session, &session.user);
        let debug = format!("{admin:?}");
        assert!(debug.contains("owner@fasatina.sa"));
        assert!(!debug.contains("access-secret"));
        assert_eq!(admin.access_token(), "access-secret");
    }
}
