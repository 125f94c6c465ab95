use utoipa::OpenApi;

use super::handlers::{
    auth::{login, register, session, types, verification},
    health,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        register::register,
        login::login,
        session::logout,
        session::me,
        verification::request_code,
        verification::verify_code,
        verification::verify_link,
        verification::verify_check,
    ),
    components(schemas(
        types::RegisterRequest,
        types::LoginRequest,
        types::TokenResponse,
        types::RequestCodeRequest,
        types::VerifyCodeRequest,
        types::VerifyCodeResponse,
        types::VerifiedResponse,
        types::FieldError,
        types::AccountResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "verify", description = "Email verification challenges"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
