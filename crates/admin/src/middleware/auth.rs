//! Authentication gate and extractors for admin.
//!
//! Every gated request starts in [`GateState::Checking`] and resolves to
//! either [`GateState::Authenticated`] or [`GateState::Redirecting`]:
//!
//! - no token pair in the session: redirect
//! - access token expired: trade the refresh token for a new pair; if that
//!   fails, redirect
//! - look the user up with the access token; if that fails, redirect
//!
//! There is no retry. A redirect also drops the stored pair, so signing out
//! anywhere (or the auth service revoking the session) sends the next
//! gated request to the login page.

use std::fmt::Display;
use std::future::Future;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::{AuthSession, AuthUser, CurrentAdmin, session_keys};
use crate::state::AppState;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Checks a stored session against the auth service.
pub trait SessionVerifier: Send + Sync {
    type Error: Display + Send;

    /// Trade a refresh token for a new session.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<AuthSession, Self::Error>> + Send;

    /// Resolve an access token to its user.
    fn current_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send;
}

impl SessionVerifier for SupabaseClient {
    type Error = SupabaseError;

    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<AuthSession, Self::Error>> + Send {
        self.refresh_session(refresh_token)
    }

    fn current_user(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send {
        self.get_user(access_token)
    }
}

/// A session that passed the gate.
#[derive(Debug, Clone)]
pub struct Verified {
    pub admin: CurrentAdmin,
    /// The session as it should now be stored.
    pub session: AuthSession,
    /// Whether `session` holds a new token pair that must be saved.
    pub refreshed: bool,
}

/// Gate state for one request.
#[derive(Debug, Clone)]
pub enum GateState {
    Checking,
    Authenticated(Verified),
    Redirecting,
}

impl GateState {
    /// Run the check. Already-resolved states are returned unchanged.
    pub async fn resolve<V: SessionVerifier>(
        self,
        verifier: &V,
        stored: Option<AuthSession>,
        now: DateTime<Utc>,
    ) -> Self {
        match self {
            Self::Checking => check(verifier, stored, now).await,
            resolved => resolved,
        }
    }
}

async fn check<V: SessionVerifier>(
    verifier: &V,
    stored: Option<AuthSession>,
    now: DateTime<Utc>,
) -> GateState {
    let Some(mut session) = stored else {
        return GateState::Redirecting;
    };

    let refreshed = session.is_expired(now);
    if refreshed {
        match verifier.refresh(&session.refresh_token).await {
            Ok(fresh) => session = fresh,
            Err(e) => {
                tracing::info!(error = %e, "Admin session refresh failed");
                return GateState::Redirecting;
            }
        }
    }

    match verifier.current_user(&session.access_token).await {
        Ok(user) => {
            let admin = CurrentAdmin::new(&session, &user);
            session.user = user;
            GateState::Authenticated(Verified {
                admin,
                session,
                refreshed,
            })
        }
        Err(e) => {
            tracing::info!(error = %e, "Admin user lookup failed");
            GateState::Redirecting
        }
    }
}

/// Extractor that requires admin authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when a gated request is not authenticated.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Send the browser to the login page.
    RedirectToLogin,
    /// The session layer is missing from the router.
    SessionUnavailable,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AdminAuthRejection::SessionUnavailable)?;

        let stored = load_auth_session(&session).await;
        let gate = GateState::Checking
            .resolve(state.supabase(), stored, Utc::now())
            .await;

        match gate {
            GateState::Authenticated(verified) => {
                if verified.refreshed
                    && let Err(e) = set_auth_session(&session, &verified.session).await
                {
                    tracing::warn!(error = %e, "Failed to store refreshed admin session");
                }
                set_sentry_user(verified.admin.id.as_str(), Some(&verified.admin.email));
                Ok(Self(verified.admin))
            }
            GateState::Checking | GateState::Redirecting => {
                if let Err(e) = clear_auth_session(&session).await {
                    tracing::warn!(error = %e, "Failed to clear admin session");
                }
                Err(AdminAuthRejection::RedirectToLogin)
            }
        }
    }
}

/// Read the stored token pair; unreadable data counts as none.
pub async fn load_auth_session(session: &Session) -> Option<AuthSession> {
    session
        .get::<AuthSession>(session_keys::AUTH_SESSION)
        .await
        .ok()
        .flatten()
}

/// Store the token pair after sign-in or refresh.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_auth_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::AUTH_SESSION, auth).await
}

/// Remove the token pair (logout or failed check).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_auth_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<AuthSession>(session_keys::AUTH_SESSION)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;
    use fasatina_core::AdminUserId;

    use super::*;

    fn user() -> AuthUser {
        AuthUser {
            id: AdminUserId::new("8d0f"),
            email: Some("owner@fasatina.sa".to_string()),
        }
    }

    fn session(token: &str, expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: token.to_string(),
            refresh_token: format!("{token}-refresh"),
            expires_at,
            user: user(),
        }
    }

    struct MockVerifier {
        refresh_ok: bool,
        user_ok: bool,
        refresh_calls: AtomicUsize,
        user_calls: AtomicUsize,
        looked_up: Mutex<Vec<String>>,
    }

    impl MockVerifier {
        fn new(refresh_ok: bool, user_ok: bool) -> Self {
            Self {
                refresh_ok,
                user_ok,
                refresh_calls: AtomicUsize::new(0),
                user_calls: AtomicUsize::new(0),
                looked_up: Mutex::new(Vec::new()),
            }
        }
    }

    impl SessionVerifier for MockVerifier {
        type Error = String;

        fn refresh(
            &self,
            _refresh_token: &str,
        ) -> impl Future<Output = Result<AuthSession, Self::Error>> + Send {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let result = if self.refresh_ok {
                Ok(session("fresh", Utc::now() + Duration::hours(1)))
            } else {
                Err("Invalid Refresh Token: Already Used".to_string())
            };
            std::future::ready(result)
        }

        fn current_user(
            &self,
            access_token: &str,
        ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            self.looked_up.lock().unwrap().push(access_token.to_string());
            let result = if self.user_ok {
                Ok(user())
            } else {
                Err("invalid JWT".to_string())
            };
            std::future::ready(result)
        }
    }

    #[tokio::test]
    async fn test_no_session_redirects_without_calls() {
        let verifier = MockVerifier::new(true, true);
        let state = GateState::Checking
            .resolve(&verifier, None, Utc::now())
            .await;

        assert!(matches!(state, GateState::Redirecting));
        assert_eq!(verifier.refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(verifier.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_session_authenticates() {
        let verifier = MockVerifier::new(true, true);
        let now = Utc::now();
        let stored = session("live", now + Duration::minutes(30));

        let state = GateState::Checking
            .resolve(&verifier, Some(stored), now)
            .await;

        let GateState::Authenticated(verified) = state else {
            panic!("expected authenticated");
        };
        assert!(!verified.refreshed);
        assert_eq!(verified.admin.email, "owner@fasatina.sa");
        assert_eq!(verified.admin.access_token(), "live");
        assert_eq!(verifier.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_session_is_refreshed() {
        let verifier = MockVerifier::new(true, true);
        let now = Utc::now();
        let stored = session("stale", now - Duration::minutes(5));

        let state = GateState::Checking
            .resolve(&verifier, Some(stored), now)
            .await;

        let GateState::Authenticated(verified) = state else {
            panic!("expected authenticated");
        };
        assert!(verified.refreshed);
        assert_eq!(verified.session.access_token, "fresh");
        assert_eq!(*verifier.looked_up.lock().unwrap(), vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_refresh_redirects() {
        let verifier = MockVerifier::new(false, true);
        let now = Utc::now();
        let stored = session("stale", now - Duration::minutes(5));

        let state = GateState::Checking
            .resolve(&verifier, Some(stored), now)
            .await;

        assert!(matches!(state, GateState::Redirecting));
        assert_eq!(verifier.user_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_user_lookup_redirects() {
        let verifier = MockVerifier::new(true, false);
        let now = Utc::now();
        let stored = session("revoked", now + Duration::minutes(30));

        let state = GateState::Checking
            .resolve(&verifier, Some(stored), now)
            .await;

        assert!(matches!(state, GateState::Redirecting));
        assert_eq!(verifier.user_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolved_states_are_final() {
        let verifier = MockVerifier::new(true, true);
        let now = Utc::now();

        let state = GateState::Redirecting
            .resolve(&verifier, Some(session("live", now + Duration::hours(1))), now)
            .await;

        assert!(matches!(state, GateState::Redirecting));
        assert_eq!(verifier.user_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejection_redirects_to_login() {
        let response = AdminAuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_PATH);
    }
}
