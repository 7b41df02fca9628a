use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppState;
use super::schemas::ErrorResponse;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Token lifetime in seconds.
    #[schema(example = 3600)]
    pub expires_in: u64,
}

/// `POST /v1/auth/login` -- authenticate with username/password and receive a JWT.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    summary = "Login",
    description = "Authenticate with username and password to receive a JWT token.",
    request_body(content = LoginRequest, description = "Login credentials"),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 404, description = "Authentication is disabled", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> impl IntoResponse {
    let Some(ref auth) = state.auth else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ErrorResponse::new(
                "authentication is not enabled"
            ))),
        );
    };

    match auth.login(&body.username, &body.password) {
        Ok((token, expires_in)) => (
            StatusCode::OK,
            Json(serde_json::json!(LoginResponse { token, expires_in })),
        ),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!(ErrorResponse::new(e))),
        ),
    }
}

/// `POST /v1/auth/logout` -- revoke the current JWT token.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    summary = "Logout",
    description = "Revoke the current JWT token, making it immediately invalid.",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Invalid or missing token", body = ErrorResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(ref auth) = state.auth else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!(ErrorResponse::new(
                "authentication is not enabled"
            ))),
        );
    };

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!(ErrorResponse::new("missing Bearer token"))),
        );
    };

    match auth.revoke_jwt(token) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "logged_out" })),
        ),
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!(ErrorResponse::new(e))),
        ),
    }
}
