//! Small helpers for identifier validation and verification secrets.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::{Rng, RngCore, rngs::OsRng};
use regex::Regex;

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{1,31}$").expect("username pattern"));

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"));

/// Normalize an identifier (username or email) for lookup and uniqueness
/// checks. Identity comparison is case-insensitive throughout.
pub(super) fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Username format: 2-32 characters, starting with a letter, then letters,
/// digits, `-` or `_`.
pub(super) fn valid_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    EMAIL_REGEX.is_match(email_normalized)
}

/// Passwords only need to be non-empty; strength policy is the client's job.
pub(super) fn valid_password(password: &str) -> bool {
    !password.is_empty()
}

/// An identifier is addressable when it looks like a username or an email.
pub(super) fn valid_identifier(identifier: &str) -> bool {
    valid_username(identifier) || valid_email(identifier)
}

/// Generate a fresh 6-digit verification code, uniform over 100000-999999.
pub(super) fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Generate the opaque link token: 32 random bytes, hex-encoded.
///
/// The raw token only travels in the verification email; the database stores
/// an argon2 digest of it.
pub(super) fn generate_link_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate verification token")?;
    Ok(hex::encode(bytes))
}

/// Build the verification link included in outbound emails.
pub(super) fn build_verify_url(public_base_url: &str, username: &str, token: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    format!(
        "{base}/verify?username={}&token={}",
        urlencoding::encode(username),
        urlencoding::encode(token)
    )
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[test]
    fn normalize_identifier_trims_and_lowercases() {
        assert_eq!(normalize_identifier(" Luna@Example.COM "), "luna@example.com");
        assert_eq!(normalize_identifier("LUNA"), "luna");
    }

    #[test]
    fn valid_username_accepts_expected_shapes() {
        assert!(valid_username("luna"));
        assert!(valid_username("luna-draws_art"));
        assert!(valid_username("ab"));
        assert!(valid_username(&format!("a{}", "b".repeat(31))));
    }

    #[test]
    fn valid_username_rejects_bad_shapes() {
        assert!(!valid_username("a"));
        assert!(!valid_username("1luna"));
        assert!(!valid_username("-luna"));
        assert!(!valid_username("luna has spaces"));
        assert!(!valid_username(&format!("a{}", "b".repeat(32))));
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_identifier_accepts_either_shape() {
        assert!(valid_identifier("luna"));
        assert!(valid_identifier("luna@example.com"));
        assert!(!valid_identifier("@@"));
    }

    #[test]
    fn valid_password_rejects_empty_only() {
        assert!(valid_password("pw123"));
        assert!(!valid_password(""));
    }

    #[test]
    fn generate_code_stays_in_range() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn generate_link_token_is_64_hex_chars() {
        let token = generate_link_token().expect("token");
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn build_verify_url_encodes_token() {
        let url = build_verify_url("https://api.lubook.club/", "luna", "ab+cd");
        assert_eq!(
            url,
            "https://api.lubook.club/verify?username=luna&token=ab%2Bcd"
        );
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
