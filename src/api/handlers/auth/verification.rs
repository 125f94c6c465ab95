//! Verification challenge engine and endpoints.
//!
//! Each account holds at most one pending challenge: a 6-digit code and an
//! opaque link token, both stored hashed and both resolving the same
//! challenge. Requesting a new challenge replaces the old one. Expiry is
//! lazy, checked when a secret is presented, and a resolved challenge is
//! deleted in the same transaction that marks the account verified.
//!
//! The email carrying the plaintext secrets is fire-and-forget: the stored
//! challenge is never rolled back on delivery failure.

use axum::{
    Json,
    extract::{Extension, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::email::verification_email;

use super::hasher::{hash_secret, verify_dummy, verify_secret};
use super::state::AuthState;
use super::storage::{
    Account, consume_challenge, get_challenge, lookup_account, upsert_challenge,
};
use super::types::{
    CheckQuery, RequestCodeRequest, VerifiedResponse, VerifyCodeRequest, VerifyCodeResponse,
    VerifyLinkQuery,
};
use super::utils::{
    build_verify_url, generate_code, generate_link_token, normalize_identifier, valid_identifier,
};

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ChallengeRequestOutcome {
    AlreadySatisfied,
    TooSoon,
    Sent,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ChallengeResolveOutcome {
    NotFound,
    Expired,
    Mismatch,
    Verified,
}

/// Issue a fresh challenge for `account` and queue the verification email.
///
/// The challenge row is committed before delivery is attempted; a failed
/// send leaves it in place and the caller retries through the resend
/// endpoint once the cooldown elapses.
pub(super) async fn request_challenge(
    pool: &PgPool,
    state: &AuthState,
    account: &Account,
) -> anyhow::Result<ChallengeRequestOutcome> {
    if account.verified {
        return Ok(ChallengeRequestOutcome::AlreadySatisfied);
    }

    if let Some(challenge) = get_challenge(pool, account.id).await? {
        if challenge.age_seconds < state.config().resend_cooldown_seconds() {
            return Ok(ChallengeRequestOutcome::TooSoon);
        }
    }

    let code = generate_code();
    let token = generate_link_token()?;
    let code_hash = hash_secret(&code)?;
    let token_hash = hash_secret(&token)?;

    upsert_challenge(pool, account.id, &code_hash, &token_hash).await?;

    let link = build_verify_url(state.config().public_base_url(), &account.username, &token);
    let (subject, text, html) = verification_email(&account.username, &account.email, &code, &link);
    let mailer = state.mailer();
    let to = account.email.clone();
    tokio::spawn(async move {
        if let Err(err) = mailer.send(&to, &subject, &text, &html) {
            warn!("Failed to send verification email: {err}");
        }
    });

    Ok(ChallengeRequestOutcome::Sent)
}

/// Resolve a pending challenge with a presented secret (code or link token).
///
/// When no challenge exists, the same hashing work runs against a dummy
/// digest so the miss is not observable by timing.
pub(super) async fn resolve_challenge(
    pool: &PgPool,
    state: &AuthState,
    account: &Account,
    secret: &str,
    use_token: bool,
) -> anyhow::Result<ChallengeResolveOutcome> {
    let Some(challenge) = get_challenge(pool, account.id).await? else {
        verify_dummy(secret);
        return Ok(ChallengeResolveOutcome::NotFound);
    };

    if challenge.age_seconds >= state.config().code_ttl_seconds() {
        verify_dummy(secret);
        return Ok(ChallengeResolveOutcome::Expired);
    }

    let digest = if use_token {
        &challenge.token_hash
    } else {
        &challenge.code_hash
    };
    if !verify_secret(secret, digest)? {
        return Ok(ChallengeResolveOutcome::Mismatch);
    }

    consume_challenge(pool, challenge.user_id).await?;
    Ok(ChallengeResolveOutcome::Verified)
}

/// Request (or resend) a verification challenge.
#[utoipa::path(
    post,
    path = "/verify/request",
    request_body = RequestCodeRequest,
    responses(
        (status = 201, description = "Verification email queued"),
        (status = 400, description = "Invalid payload", body = String),
        (status = 404, description = "No such account", body = String),
        (status = 409, description = "Account already verified", body = String),
        (status = 429, description = "Resend cooldown active", body = String)
    ),
    tag = "verify"
)]
pub async fn request_code(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RequestCodeRequest>>,
) -> impl IntoResponse {
    let request: RequestCodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let identifier = normalize_identifier(&request.profile);
    if !valid_identifier(&identifier) {
        return (StatusCode::BAD_REQUEST, "Invalid profile".to_string()).into_response();
    }

    let account = match lookup_account(&pool, &identifier).await {
        Ok(Some(account)) => account,
        Ok(None) => return (StatusCode::NOT_FOUND, "Not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    };

    match request_challenge(&pool, &auth_state, &account).await {
        Ok(ChallengeRequestOutcome::Sent) => {
            (StatusCode::CREATED, "Verification email queued".to_string()).into_response()
        }
        Ok(ChallengeRequestOutcome::AlreadySatisfied) => {
            (StatusCode::CONFLICT, "Already verified".to_string()).into_response()
        }
        Ok(ChallengeRequestOutcome::TooSoon) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Wait before requesting another code".to_string(),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to issue challenge: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}

/// Resolve a challenge with the emailed 6-digit code.
#[utoipa::path(
    post,
    path = "/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Account verified", body = VerifyCodeResponse),
        (status = 400, description = "Invalid payload", body = String),
        (status = 401, description = "Wrong code", body = String),
        (status = 404, description = "No such account or challenge", body = String),
        (status = 410, description = "Code expired", body = String)
    ),
    tag = "verify"
)]
pub async fn verify_code(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyCodeRequest>>,
) -> impl IntoResponse {
    let request: VerifyCodeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let identifier = normalize_identifier(&request.profile);
    if !valid_identifier(&identifier) {
        return (StatusCode::BAD_REQUEST, "Invalid profile".to_string()).into_response();
    }
    let code = request.code.trim();
    if code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing code".to_string()).into_response();
    }

    let account = match lookup_account(&pool, &identifier).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            verify_dummy(code);
            return (StatusCode::NOT_FOUND, "Not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    };

    match resolve_challenge(&pool, &auth_state, &account, code, false).await {
        Ok(ChallengeResolveOutcome::Verified) => {
            (StatusCode::OK, Json(VerifyCodeResponse { success: true })).into_response()
        }
        Ok(ChallengeResolveOutcome::Mismatch) => {
            (StatusCode::UNAUTHORIZED, "Wrong code".to_string()).into_response()
        }
        Ok(ChallengeResolveOutcome::Expired) => {
            (StatusCode::GONE, "Code expired".to_string()).into_response()
        }
        Ok(ChallengeResolveOutcome::NotFound) => {
            (StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
        }
        Err(err) => {
            error!("Failed to resolve challenge: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}

// 302, matching what browsers get from the emailed link.
fn redirect_found(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

/// Resolve a challenge from the emailed link, redirecting to the frontend.
///
/// The browser lands on `/verify/success` or `/verify/failed`; no outcome
/// detail leaks through the URL beyond that.
#[utoipa::path(
    get,
    path = "/verify",
    params(
        ("username" = String, Query, description = "Account username"),
        ("token" = String, Query, description = "Opaque link token")
    ),
    responses(
        (status = 302, description = "Redirect to frontend verification result")
    ),
    tag = "verify"
)]
pub async fn verify_link(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    query: Option<Query<VerifyLinkQuery>>,
) -> impl IntoResponse {
    let frontend = auth_state
        .config()
        .frontend_base_url()
        .trim_end_matches('/')
        .to_string();
    let failed = format!("{frontend}/verify/failed");

    let Some(Query(query)) = query else {
        return redirect_found(&failed);
    };

    let identifier = normalize_identifier(&query.username);
    let account = match lookup_account(&pool, &identifier).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            verify_dummy(&query.token);
            return redirect_found(&failed);
        }
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return redirect_found(&failed);
        }
    };

    match resolve_challenge(&pool, &auth_state, &account, &query.token, true).await {
        Ok(ChallengeResolveOutcome::Verified) => {
            redirect_found(&format!("{frontend}/verify/success"))
        }
        Ok(_) => redirect_found(&failed),
        Err(err) => {
            error!("Failed to resolve challenge: {err}");
            redirect_found(&failed)
        }
    }
}

/// Report whether an account is verified.
#[utoipa::path(
    get,
    path = "/verify/check",
    params(
        ("profile" = String, Query, description = "Username or email")
    ),
    responses(
        (status = 200, description = "Verification status", body = VerifiedResponse),
        (status = 400, description = "Invalid profile", body = String),
        (status = 404, description = "No such account", body = String)
    ),
    tag = "verify"
)]
pub async fn verify_check(
    pool: Extension<PgPool>,
    query: Option<Query<CheckQuery>>,
) -> impl IntoResponse {
    let Some(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Missing profile".to_string()).into_response();
    };

    let identifier = normalize_identifier(&query.profile);
    if !valid_identifier(&identifier) {
        return (StatusCode::BAD_REQUEST, "Invalid profile".to_string()).into_response();
    }

    match lookup_account(&pool, &identifier).await {
        Ok(Some(account)) => (
            StatusCode::OK,
            Json(VerifiedResponse {
                verified: account.verified,
            }),
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found".to_string()).into_response(),
        Err(err) => {
            error!("Failed to lookup account: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response();
        }
    }
}
