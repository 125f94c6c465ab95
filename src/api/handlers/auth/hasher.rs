//! Secret hashing for passwords and verification codes/tokens.
//!
//! Everything secret is stored as an argon2id PHC string, verification codes
//! included: a 6-digit code has only ~10^6 possible values, so a fast hash
//! would let anyone who reads the table enumerate it offline.
//!
//! `verify_secret` keeps mismatch (`Ok(false)`) distinct from a malformed
//! stored digest (`Err`), and `verify_dummy` runs the same verification path
//! against a fixed digest so "no stored secret" is not distinguishable from
//! "wrong secret" by timing.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use once_cell::sync::Lazy;

// Digest of a throwaway value, used only to equalize timing.
static DUMMY_DIGEST: Lazy<String> =
    Lazy::new(|| hash_secret("lubook-timing-pad").unwrap_or_default());

/// Hash a secret with argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns an error if the hashing backend fails.
pub(crate) fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|err| anyhow!("failed to hash secret: {err}"))
}

/// Verify a secret against a stored PHC digest.
///
/// Returns `Ok(false)` on mismatch. A digest that cannot be decoded is an
/// error, never a silent mismatch.
///
/// # Errors
///
/// Returns an error if the stored digest is malformed or verification fails
/// for a reason other than a wrong secret.
pub(crate) fn verify_secret(secret: &str, digest: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(digest).map_err(|err| anyhow!("malformed secret digest: {err}"))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("failed to verify secret: {err}")),
    }
}

/// Burn the same verification work as a real comparison, discarding the
/// result. Called on the "no stored secret" paths.
pub(super) fn verify_dummy(secret: &str) {
    let _ = verify_secret(secret, &DUMMY_DIGEST);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash_secret("pw123").expect("digest");
        assert!(digest.starts_with("$argon2"));
        assert_eq!(verify_secret("pw123", &digest).ok(), Some(true));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let digest = hash_secret("pw123").expect("digest");
        assert_eq!(verify_secret("pw124", &digest).ok(), Some(false));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_secret("pw123").expect("digest");
        let second = hash_secret("pw123").expect("digest");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_is_an_error_not_a_mismatch() {
        assert!(verify_secret("pw123", "not-a-digest").is_err());
        assert!(verify_secret("pw123", "").is_err());
    }

    #[test]
    fn dummy_verification_does_not_panic() {
        verify_dummy("123456");
        verify_dummy("");
    }
}
