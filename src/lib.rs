//! # Lubook account service
//!
//! `lubook` handles accounts for the Lubook community site: registration,
//! credential login, stateless session tokens, and the email verification
//! challenge (6-digit code or link).
//!
//! ## Identities
//!
//! An account is addressed by a single identifier that may be either the
//! username or the email. Both are unique under case-insensitive comparison,
//! enforced by unique indexes on `LOWER(username)` / `LOWER(email)`.
//!
//! ## Verification
//!
//! Registration creates the account unverified and sends a verification
//! email carrying a 6-digit code and a link token. Both secrets are stored
//! argon2-hashed, expire 15 minutes after issuance, and are one-time use: a
//! successful resolution flips `verified` and deletes the challenge row.
//! Login is hard-gated on `verified`.
//!
//! ## Sessions
//!
//! Session credentials are signed, self-contained bearer tokens carrying
//! `{sub, iat, exp}`. There is no server-side session state; logout replaces
//! the cookie with an already-expired credential.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
