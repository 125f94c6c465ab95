//! Login endpoint.

use axum::{
    Json,
    extract::Extension,
    http::{StatusCode, header},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::hasher::{verify_dummy, verify_secret};
use super::session::session_cookie;
use super::state::AuthState;
use super::storage::lookup_account;
use super::types::{LoginRequest, TokenResponse};
use super::utils::{normalize_identifier, valid_identifier, valid_password};

/// Log in with a username or email and a password.
///
/// Unverified accounts cannot log in, even with the right password. The
/// password is still checked first so the 403 never doubles as a password
/// oracle.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Wrong password", body = String),
        (status = 403, description = "Account not verified", body = String),
        (status = 404, description = "No such account", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let identifier = normalize_identifier(&request.profile);
    if !valid_identifier(&identifier) {
        return (StatusCode::BAD_REQUEST, "Invalid profile".to_string()).into_response();
    }
    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Missing password".to_string()).into_response();
    }

    let account = match lookup_account(&pool, &identifier).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            verify_dummy(&request.password);
            return (StatusCode::NOT_FOUND, "Not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    match verify_secret(&request.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return (StatusCode::UNAUTHORIZED, "Wrong password".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to verify password: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    }

    if !account.verified {
        return (StatusCode::FORBIDDEN, "Account not verified".to_string()).into_response();
    }

    let token = match auth_state.issuer().issue(account.id) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    let cookie = session_cookie(
        &token,
        auth_state.config().session_ttl_seconds(),
        auth_state.config().session_cookie_secure(),
    );
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse { token }),
    )
        .into_response()
}
