//! Database adapter for accounts and verification challenges.
//!
//! Uniqueness and challenge replacement lean entirely on the store:
//! duplicate identities surface as unique-index violations on insert (no
//! check-then-insert), and the one-challenge-per-account rule is a single
//! `ON CONFLICT (user_id) DO UPDATE` upsert.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::is_unique_violation;

/// Account row as read by the service. The password hash never leaves this
/// module except for verification.
#[derive(Debug)]
pub(crate) struct Account {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) verified: bool,
    pub(crate) joined: String,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created(Account),
    Conflict,
}

/// Pending challenge row with its age, for lazy expiry checks.
#[derive(Debug)]
pub(super) struct ChallengeRecord {
    pub(super) user_id: Uuid,
    pub(super) code_hash: String,
    pub(super) token_hash: String,
    pub(super) age_seconds: i64,
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, role::text AS role, verified, joined::text AS joined";

fn account_from_row(row: &sqlx::postgres::PgRow) -> Account {
    Account {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        verified: row.get("verified"),
        joined: row.get("joined"),
    }
}

/// Look up an account by username-or-email in a single OR-predicate query.
/// `identifier` must already be normalized (lowercased).
pub(super) async fn lookup_account(pool: &PgPool, identifier: &str) -> Result<Option<Account>> {
    let query = format!(
        "SELECT {ACCOUNT_COLUMNS} FROM users \
         WHERE LOWER(username) = $1 OR LOWER(email) = $1 LIMIT 1"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(identifier)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account")?;

    Ok(row.map(|row| account_from_row(&row)))
}

pub(super) async fn lookup_account_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1 LIMIT 1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    Ok(row.map(|row| account_from_row(&row)))
}

/// Insert a new, unverified account. Duplicate identities are reported as
/// `Conflict` via the unique indexes, so two concurrent registrations with
/// the same identity resolve to exactly one success.
pub(super) async fn insert_account(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<RegisterOutcome> {
    let query = format!(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
         RETURNING {ACCOUNT_COLUMNS}"
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = %query
    );
    let row = sqlx::query(&query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegisterOutcome::Created(account_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Store a fresh challenge, replacing any prior one for the account. The old
/// secrets become permanently unusable the moment this commits.
pub(super) async fn upsert_challenge(
    pool: &PgPool,
    user_id: Uuid,
    code_hash: &str,
    token_hash: &str,
) -> Result<()> {
    let query = r"
        INSERT INTO verifications (user_id, code_hash, token_hash)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET code_hash = EXCLUDED.code_hash,
            token_hash = EXCLUDED.token_hash,
            created_at = NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(code_hash)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to upsert challenge")?;
    Ok(())
}

pub(super) async fn get_challenge(pool: &PgPool, user_id: Uuid) -> Result<Option<ChallengeRecord>> {
    let query = r"
        SELECT user_id, code_hash, token_hash,
               EXTRACT(EPOCH FROM (NOW() - created_at))::BIGINT AS age_seconds
        FROM verifications
        WHERE user_id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to get challenge")?;

    Ok(row.map(|row| ChallengeRecord {
        user_id: row.get("user_id"),
        code_hash: row.get("code_hash"),
        token_hash: row.get("token_hash"),
        age_seconds: row.get("age_seconds"),
    }))
}

/// Consume a successfully resolved challenge: flip `verified` and delete the
/// challenge row in one transaction, so a resolved code can never be
/// replayed.
pub(super) async fn consume_challenge(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await.context("begin consume transaction")?;

    let query = "UPDATE users SET verified = TRUE WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark account verified")?;

    let query = "DELETE FROM verifications WHERE user_id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete challenge")?;

    tx.commit().await.context("commit consume transaction")?;
    Ok(())
}
