//! Login endpoint; issues the bearer token used by every protected route.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::auth::{AuthError, LoginRequest};

use super::types::{auth_error_response, LoginResponse, MessageResponse};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return auth_error_response("login", &AuthError::MissingFields).into_response();
    };

    match state.auth.login(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: "Login successful".to_string(),
                token: outcome.token,
                user: outcome.user,
            }),
        )
            .into_response(),
        Err(err) => auth_error_response("login", &err).into_response(),
    }
}
