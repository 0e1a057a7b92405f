//! Authentication route handlers for admin.
//!
//! Email and password go to the auth service; on success the token pair is
//! kept in the server-side session. The login page is the only console page
//! that is not gated.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{
    LOGIN_PATH, clear_auth_session, load_auth_session, login_rate_limiter, set_auth_session,
};
use crate::state::AppState;
use crate::supabase::SupabaseError;

/// Message the auth service returns for a wrong email or password.
const INVALID_CREDENTIALS: &str = "Invalid login credentials";

const MISSING_FIELDS_MESSAGE: &str = "يرجى إدخال البريد الإلكتروني وكلمة المرور";
const INVALID_CREDENTIALS_MESSAGE: &str = "البريد الإلكتروني أو كلمة المرور غير صحيحة";

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Build the auth router. Only password submissions are rate limited.
pub fn router(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route(
            LOGIN_PATH,
            get(login_page).merge(post(login).layer(login_rate_limiter(trust_proxy_headers))),
        )
        .route("/admin/logout", post(logout))
}

fn render_login(email: &str, error: Option<String>) -> Html<String> {
    let template = LoginTemplate {
        email: email.to_string(),
        error,
    };

    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// What the login form shows for a rejected sign-in.
fn sign_in_error_message(error: &SupabaseError) -> String {
    let message = error.provider_message();
    if message == INVALID_CREDENTIALS {
        INVALID_CREDENTIALS_MESSAGE.to_string()
    } else {
        message
    }
}

/// Render the login page.
///
/// GET /admin/login
pub async fn login_page() -> Html<String> {
    render_login("", None)
}

/// Sign in with email and password.
///
/// POST /admin/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return render_login(email, Some(MISSING_FIELDS_MESSAGE.to_string())).into_response();
    }

    let auth = match state
        .supabase()
        .sign_in_with_password(email, &form.password)
        .await
    {
        Ok(auth) => auth,
        Err(e) => {
            tracing::info!(error = %e, "Admin sign-in rejected");
            return render_login(email, Some(sign_in_error_message(&e))).into_response();
        }
    };

    // New session id on privilege change
    if let Err(e) = session.cycle_id().await {
        return AppError::from(e).into_response();
    }
    if let Err(e) = set_auth_session(&session, &auth).await {
        return AppError::from(e).into_response();
    }

    tracing::info!(user_id = %auth.user.id, "Admin signed in");
    Redirect::to("/admin").into_response()
}

/// Sign out and clear the session.
///
/// POST /admin/logout
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    if let Some(auth) = load_auth_session(&session).await {
        // The local session is dropped either way
        match state.supabase().sign_out(&auth.access_token).await {
            Ok(()) => tracing::info!(user_id = %auth.user.id, "Admin signed out"),
            Err(e) if e.is_unauthorized() => {
                tracing::debug!(error = %e, "Access token already invalid at sign-out");
            }
            Err(e) => tracing::warn!(error = %e, "Auth service sign-out failed"),
        }
    }

    if let Err(e) = clear_auth_session(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();

    Redirect::to(LOGIN_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_credentials_are_localized() {
        let err = SupabaseError::Api {
            status: 400,
            message: INVALID_CREDENTIALS.to_string(),
        };
        assert_eq!(sign_in_error_message(&err), INVALID_CREDENTIALS_MESSAGE);
    }

    #[test]
    fn test_other_errors_show_provider_message() {
        let err = SupabaseError::Api {
            status: 400,
            message: "Email not confirmed".to_string(),
        };
        assert_eq!(sign_in_error_message(&err), "Email not confirmed");
    }

    #[test]
    fn test_login_page_renders_error_banner() {
        let Html(body) = render_login("owner@fasatina.sa", Some(MISSING_FIELDS_MESSAGE.to_string()));
        assert!(body.contains(MISSING_FIELDS_MESSAGE));
        assert!(body.contains("owner@fasatina.sa"));
    }
}
