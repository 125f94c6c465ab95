//! Account handlers and supporting modules.
//!
//! Registration, login, logout, the current-account endpoint, and the email
//! verification challenge live here, split the same way the routes are:
//! `storage` talks to Postgres, `hasher` owns argon2, `token` owns the signed
//! session credentials, and each endpoint module holds its handler.

mod hasher;
pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod token;
mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
pub use token::{SessionClaims, SessionIssuer};
