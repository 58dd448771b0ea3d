//! OTP-based password reset: request a code, then redeem it.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::auth::{AuthError, ForgotPasswordRequest, ResetPasswordRequest};

use super::types::{auth_error_response, MessageResponse};

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP issued and queued for delivery", body = MessageResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 404, description = "No account for that email", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return auth_error_response("forgot-password", &AuthError::MissingFields).into_response();
    };

    match state.auth.forgot_password(request).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("OTP sent to your email")),
        )
            .into_response(),
        Err(err) => auth_error_response("forgot-password", &err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password rotated", body = MessageResponse),
        (status = 400, description = "Missing fields or bad OTP", body = MessageResponse),
        (status = 404, description = "No account for that email", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return auth_error_response("reset-password", &AuthError::MissingFields).into_response();
    };

    match state.auth.reset_password(request).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password reset successful")),
        )
            .into_response(),
        Err(err) => auth_error_response("reset-password", &err).into_response(),
    }
}
