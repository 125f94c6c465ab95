use crate::cli::actions::Action;
use anyhow::{Result, anyhow};
use secrecy::SecretString;

/// Build the action from parsed arguments.
///
/// # Errors
///
/// Returns an error if a required argument is missing
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one::<String>("dsn")
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --dsn"))?,
        session_secret: matches
            .get_one::<String>("session-secret")
            .map(|secret| SecretString::from(secret.clone()))
            .ok_or_else(|| anyhow!("missing required argument: --session-secret"))?,
        session_ttl_seconds: matches
            .get_one::<u64>("session-ttl")
            .copied()
            .unwrap_or(7 * 24 * 60 * 60),
        code_ttl_seconds: matches
            .get_one::<i64>("code-ttl")
            .copied()
            .unwrap_or(15 * 60),
        resend_cooldown_seconds: matches
            .get_one::<i64>("resend-cooldown")
            .copied()
            .unwrap_or(5 * 60),
        public_base_url: matches
            .get_one::<String>("public-url")
            .cloned()
            .unwrap_or_else(|| "http://localhost:8080".to_string()),
        frontend_base_url: matches
            .get_one::<String>("frontend-url")
            .cloned()
            .unwrap_or_else(|| "https://lubook.club".to_string()),
    })
}
