pub mod auth;
pub mod health;

pub use self::health::health;

use axum::response::IntoResponse;

/// Root handler, a minimal liveness probe.
pub async fn root() -> impl IntoResponse {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
