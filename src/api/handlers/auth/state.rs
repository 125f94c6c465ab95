//! Auth configuration and shared state.

use std::sync::Arc;

use crate::api::email::EmailSender;

use super::token::SessionIssuer;

const DEFAULT_CODE_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_RESEND_COOLDOWN_SECONDS: i64 = 5 * 60;
const DEFAULT_SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    public_base_url: String,
    frontend_base_url: String,
    code_ttl_seconds: i64,
    resend_cooldown_seconds: i64,
    session_ttl_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_base_url: String, frontend_base_url: String) -> Self {
        Self {
            public_base_url,
            frontend_base_url,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            resend_cooldown_seconds: DEFAULT_RESEND_COOLDOWN_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_resend_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.resend_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    pub(crate) fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    pub(super) fn resend_cooldown_seconds(&self) -> i64 {
        self.resend_cooldown_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    issuer: SessionIssuer,
    mailer: Arc<dyn EmailSender>,
}

impl AuthState {
    pub fn new(config: AuthConfig, issuer: SessionIssuer, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            config,
            issuer,
            mailer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    pub(super) fn mailer(&self) -> Arc<dyn EmailSender> {
        Arc::clone(&self.mailer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use secrecy::SecretString;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(
            "https://api.lubook.club".to_string(),
            "https://lubook.club".to_string(),
        );

        assert_eq!(config.public_base_url(), "https://api.lubook.club");
        assert_eq!(config.frontend_base_url(), "https://lubook.club");
        assert_eq!(config.code_ttl_seconds(), super::DEFAULT_CODE_TTL_SECONDS);
        assert_eq!(
            config.resend_cooldown_seconds(),
            super::DEFAULT_RESEND_COOLDOWN_SECONDS
        );
        assert_eq!(
            config.session_ttl_seconds(),
            super::DEFAULT_SESSION_TTL_SECONDS
        );
        assert!(config.session_cookie_secure());

        let config = config
            .with_code_ttl_seconds(60)
            .with_resend_cooldown_seconds(30)
            .with_session_ttl_seconds(3600);

        assert_eq!(config.code_ttl_seconds(), 60);
        assert_eq!(config.resend_cooldown_seconds(), 30);
        assert_eq!(config.session_ttl_seconds(), 3600);
    }

    #[test]
    fn cookie_secure_follows_frontend_scheme() {
        let config = AuthConfig::new(
            "http://localhost:8080".to_string(),
            "http://localhost:4321".to_string(),
        );
        assert!(!config.session_cookie_secure());
    }

    #[test]
    fn auth_state_exposes_parts() {
        let config = AuthConfig::new(
            "https://api.lubook.club".to_string(),
            "https://lubook.club".to_string(),
        );
        let issuer = SessionIssuer::new(&SecretString::from("secret"), 3600);
        let state = AuthState::new(config, issuer, Arc::new(LogEmailSender));
        assert_eq!(state.issuer().ttl_seconds(), 3600);
        assert_eq!(state.config().frontend_base_url(), "https://lubook.club");
    }
}
