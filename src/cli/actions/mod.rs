pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        session_secret: SecretString,
        session_ttl_seconds: u64,
        code_ttl_seconds: i64,
        resend_cooldown_seconds: i64,
        public_base_url: String,
        frontend_base_url: String,
    },
}
