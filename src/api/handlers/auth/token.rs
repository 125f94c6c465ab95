//! Stateless session credentials.
//!
//! A credential is a signed claim set `{sub, iat, exp}` and nothing else: no
//! server-side session row exists, so validity is purely a function of the
//! signature and the embedded expiry. Validation fails closed, with zero
//! clock leeway. Logout cannot revoke an issued credential early; it only
//! replaces the client's copy with an already-expired one.

use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Account id the bearer authenticates as.
    pub sub: Uuid,
    pub iat: u64,
    pub exp: u64,
}

/// Mints and validates signed session credentials.
///
/// The signing key is injected at construction; this component owns no
/// configuration lifecycle of its own.
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            ttl_seconds,
        }
    }

    /// Mint a credential for an account, valid from now for the configured
    /// lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is unusable or signing fails.
    pub fn issue(&self, account_id: Uuid) -> Result<String> {
        let iat = unix_now()?;
        let claims = SessionClaims {
            sub: account_id,
            iat,
            exp: iat + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding).context("failed to sign credential")
    }

    /// Mint the already-expired replacement credential handed out at logout.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is unusable or signing fails.
    pub fn expired(&self) -> Result<String> {
        let iat = unix_now()?;
        let claims = SessionClaims {
            sub: Uuid::nil(),
            iat,
            exp: iat.saturating_sub(1),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .context("failed to sign expired credential")
    }

    /// Validate a presented credential.
    ///
    /// Fails closed: any signature mismatch, malformed structure, or expiry
    /// in the past yields `None`.
    #[must_use]
    pub fn validate(&self, credential: &str) -> Option<SessionClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<SessionClaims>(credential, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(ttl_seconds: u64) -> SessionIssuer {
        SessionIssuer::new(&SecretString::from("test-secret"), ttl_seconds)
    }

    #[test]
    fn issue_validate_round_trip() {
        let issuer = issuer(3600);
        let account_id = Uuid::new_v4();
        let credential = issuer.issue(account_id).expect("credential");
        let claims = issuer.validate(&credential).expect("claims");
        assert_eq!(claims.sub, account_id);
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn validate_rejects_garbage() {
        let issuer = issuer(3600);
        assert!(issuer.validate("").is_none());
        assert!(issuer.validate("not.a.credential").is_none());
    }

    #[test]
    fn validate_rejects_wrong_key() {
        let credential = issuer(3600).issue(Uuid::new_v4()).expect("credential");
        let other = SessionIssuer::new(&SecretString::from("other-secret"), 3600);
        assert!(other.validate(&credential).is_none());
    }

    #[test]
    fn validate_rejects_tampered_payload() {
        let issuer = issuer(3600);
        let credential = issuer.issue(Uuid::new_v4()).expect("credential");
        let mut parts: Vec<&str> = credential.split('.').collect();
        let payload = parts[1];
        let flipped = if payload.starts_with('A') { "B" } else { "A" };
        let tampered_payload = format!("{flipped}{}", &payload[1..]);
        parts[1] = &tampered_payload;
        assert!(issuer.validate(&parts.join(".")).is_none());
    }

    #[test]
    fn expired_credential_is_invalid() {
        let issuer = issuer(3600);
        let credential = issuer.expired().expect("credential");
        assert!(issuer.validate(&credential).is_none());
    }
}
