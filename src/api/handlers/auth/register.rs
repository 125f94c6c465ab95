//! Account registration endpoint.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::hasher::hash_secret;
use super::state::AuthState;
use super::storage::{RegisterOutcome, insert_account};
use super::types::{AccountResponse, FieldError, RegisterRequest};
use super::utils::{normalize_identifier, valid_email, valid_password, valid_username};
use super::verification::request_challenge;

/// Register a new account.
///
/// Validation is structural and per-field. Uniqueness is not pre-checked:
/// the insert either succeeds or reports a conflict, so concurrent
/// registrations with the same identity can never both win.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid field", body = FieldError),
        (status = 409, description = "Username or email already taken", body = String)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let username = request.username.trim();
    if !valid_username(username) {
        return (
            StatusCode::BAD_REQUEST,
            Json(FieldError::new(
                "username",
                "Must be 2-32 characters, start with a letter, and contain only letters, digits, '-' or '_'.",
            )),
        )
            .into_response();
    }

    let email = normalize_identifier(&request.email);
    if !valid_email(&email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(FieldError::new("email", "Must be a valid email address.")),
        )
            .into_response();
    }

    if !valid_password(&request.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(FieldError::new("password", "Must not be empty.")),
        )
            .into_response();
    }

    let password_hash = match hash_secret(&request.password) {
        Ok(digest) => digest,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    let account = match insert_account(&pool, username, &email, &password_hash).await {
        Ok(RegisterOutcome::Created(account)) => account,
        Ok(RegisterOutcome::Conflict) => {
            return (
                StatusCode::CONFLICT,
                "Username or email already taken".to_string(),
            )
                .into_response();
        }
        Err(err) => {
            error!("Failed to insert account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    // The account exists either way; a failed challenge here is recovered
    // through POST /verify/request.
    if let Err(err) = request_challenge(&pool, &auth_state, &account).await {
        warn!("Failed to issue initial challenge: {err}");
    }

    (StatusCode::CREATED, Json(AccountResponse::from(account))).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::state::{AuthConfig, AuthState};
    use super::super::token::SessionIssuer;
    use super::{RegisterRequest, register};
    use crate::api::email::LogEmailSender;
    use anyhow::Result;
    use axum::Json;
    use axum::body::to_bytes;
    use axum::extract::Extension;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    fn auth_state() -> Arc<AuthState> {
        let config = AuthConfig::new(
            "https://api.lubook.club".to_string(),
            "https://lubook.club".to_string(),
        );
        let issuer = SessionIssuer::new(&SecretString::from("test-secret"), 3600);
        Arc::new(AuthState::new(config, issuer, Arc::new(LogEmailSender)))
    }

    async fn register_response(request: RegisterRequest) -> Result<axum::response::Response> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        Ok(
            register(Extension(pool), Extension(auth_state()), Some(Json(request)))
                .await
                .into_response(),
        )
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let response = register(Extension(pool), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_short_username() -> Result<()> {
        let response = register_response(RegisterRequest {
            username: "a".to_string(),
            email: "luna@example.com".to_string(),
            password: "pw123".to_string(),
        })
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(
            value.get("field").and_then(serde_json::Value::as_str),
            Some("username")
        );
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_bad_email() -> Result<()> {
        let response = register_response(RegisterRequest {
            username: "luna".to_string(),
            email: "not-an-email".to_string(),
            password: "pw123".to_string(),
        })
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(
            value.get("field").and_then(serde_json::Value::as_str),
            Some("email")
        );
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_empty_password() -> Result<()> {
        let response = register_response(RegisterRequest {
            username: "luna".to_string(),
            email: "luna@example.com".to_string(),
            password: String::new(),
        })
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(
            value.get("field").and_then(serde_json::Value::as_str),
            Some("password")
        );
        Ok(())
    }
}
