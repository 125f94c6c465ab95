//! Request/response types for account and verification endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::Account;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    /// Username or email.
    pub profile: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestCodeRequest {
    /// Username or email.
    pub profile: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyCodeRequest {
    /// Username or email.
    pub profile: String,
    /// The 6-digit code from the verification email.
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyLinkQuery {
    pub username: String,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyCodeResponse {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifiedResponse {
    pub verified: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CheckQuery {
    /// Username or email.
    pub profile: String,
}

/// Structural validation failure, reported per field.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub(super) fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Account body returned to clients. Never carries the password hash.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub verified: bool,
    pub joined: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username,
            email: account.email,
            role: account.role,
            verified: account.verified,
            joined: account.joined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use uuid::Uuid;

    #[test]
    fn register_request_round_trips() -> Result<()> {
        let request = RegisterRequest {
            username: "luna".to_string(),
            email: "luna@example.com".to_string(),
            password: "pw123".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "luna");
        assert_eq!(decoded.email, "luna@example.com");
        Ok(())
    }

    #[test]
    fn account_response_omits_password_hash() -> Result<()> {
        let account = Account {
            id: Uuid::nil(),
            username: "luna".to_string(),
            email: "luna@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: "user".to_string(),
            verified: false,
            joined: "2026-08-23 00:00:00+00".to_string(),
        };
        let response = AccountResponse::from(account);
        let value = serde_json::to_value(&response)?;
        assert!(value.get("password_hash").is_none());
        assert!(value.get("password").is_none());
        assert_eq!(
            value.get("username").and_then(serde_json::Value::as_str),
            Some("luna")
        );
        Ok(())
    }

    #[test]
    fn field_error_serializes_both_parts() -> Result<()> {
        let err = FieldError::new("username", "Must have at least 2 characters.");
        let value = serde_json::to_value(&err)?;
        assert_eq!(
            value.get("field").and_then(serde_json::Value::as_str),
            Some("username")
        );
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("Must have at least 2 characters.")
        );
        Ok(())
    }
}
