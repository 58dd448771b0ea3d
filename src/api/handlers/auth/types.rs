//! Response bodies and error mapping shared by the auth handlers.

use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthError, AuthFlow, UserProfile};

/// Uniform `{ "message": ... }` body used for acks and errors alike.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Map a flow error to its HTTP status and client-safe message. Internal
/// failures are logged here, with the operation name, and surface as a
/// generic 500.
pub(crate) fn auth_error_response(
    operation: &str,
    err: &AuthError,
) -> (StatusCode, Json<MessageResponse>) {
    AuthFlow::log_internal(operation, err);
    let (status, message) = match err {
        AuthError::MissingFields => (StatusCode::BAD_REQUEST, "All fields are required"),
        AuthError::DuplicateUser => (StatusCode::CONFLICT, "User already exists"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
        AuthError::OtpExpiredOrInvalid => (StatusCode::BAD_REQUEST, "Invalid or expired OTP"),
        AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error"),
    };
    (status, Json(MessageResponse::new(message)))
}
