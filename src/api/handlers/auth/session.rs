//! Session extraction, the current-account endpoint, and logout.
//!
//! Sessions are stateless: a request is authenticated by validating the
//! presented credential and re-fetching the account it names. Logout cannot
//! revoke anything server-side; it overwrites the client's cookie with an
//! already-expired credential.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::state::AuthState;
use super::storage::{Account, lookup_account_by_id};
use super::types::AccountResponse;

const SESSION_COOKIE: &str = "authorization";

/// Build the session cookie header value.
pub(super) fn session_cookie(token: &str, max_age_seconds: u64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age_seconds}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pull the session credential from the `Authorization: Bearer` header or
/// the session cookie, in that order.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())?
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
        .next()
}

pub(super) enum AuthenticateOutcome {
    Account(Account),
    /// No credential, or an invalid/expired one.
    Unauthorized,
    /// Valid credential, but the account no longer exists.
    Gone,
}

/// Authenticate a request: validate the credential, then re-fetch the
/// account so stale sessions for deleted accounts never authenticate.
pub(super) async fn authenticate(
    pool: &PgPool,
    state: &AuthState,
    headers: &HeaderMap,
) -> anyhow::Result<AuthenticateOutcome> {
    let Some(credential) = extract_credential(headers) else {
        return Ok(AuthenticateOutcome::Unauthorized);
    };
    let Some(claims) = state.issuer().validate(&credential) else {
        return Ok(AuthenticateOutcome::Unauthorized);
    };
    if claims.sub == Uuid::nil() {
        return Ok(AuthenticateOutcome::Unauthorized);
    }

    match lookup_account_by_id(pool, claims.sub).await? {
        Some(account) => Ok(AuthenticateOutcome::Account(account)),
        None => Ok(AuthenticateOutcome::Gone),
    }
}

/// Return the account behind the presented session.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid session", body = String),
        (status = 422, description = "Session names an account that no longer exists", body = String)
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authenticate(&pool, &auth_state, &headers).await {
        Ok(AuthenticateOutcome::Account(account)) => {
            (StatusCode::OK, Json(AccountResponse::from(account))).into_response()
        }
        Ok(AuthenticateOutcome::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
        }
        Ok(AuthenticateOutcome::Gone) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "You shouldn't exist?".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to authenticate: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Log out by replacing the session cookie with an already-expired
/// credential. Succeeds regardless of whether a valid session was presented.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let token = match auth_state.issuer().expired() {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to sign expired credential: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Logout failed".to_string())
                .into_response();
        }
    };

    let cookie = session_cookie(&token, 0, auth_state.config().session_cookie_secure());
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response()
}
