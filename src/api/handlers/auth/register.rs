//! Account registration endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::auth::RegisterRequest;

use super::types::{auth_error_response, MessageResponse, RegisterResponse};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return auth_error_response("register", &crate::auth::AuthError::MissingFields)
            .into_response();
    };

    match state.auth.register(request).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "User registered successfully".to_string(),
                user,
            }),
        )
            .into_response(),
        Err(err) => auth_error_response("register", &err).into_response(),
    }
}
