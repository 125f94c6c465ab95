use crate::{
    api,
    cli::actions::Action,
};
use anyhow::Result;

/// Handle the server action: assemble configuration and start serving.
///
/// # Errors
///
/// Returns an error if the database connection or the listener fails
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        dsn,
        session_secret,
        session_ttl_seconds,
        code_ttl_seconds,
        resend_cooldown_seconds,
        public_base_url,
        frontend_base_url,
    } = action;

    let auth_config = api::handlers::auth::AuthConfig::new(public_base_url, frontend_base_url)
        .with_code_ttl_seconds(code_ttl_seconds)
        .with_resend_cooldown_seconds(resend_cooldown_seconds)
        .with_session_ttl_seconds(session_ttl_seconds);

    api::new(port, dsn, auth_config, &session_secret).await
}
