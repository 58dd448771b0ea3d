//! Logout endpoint.
//!
//! Tokens are stateless, so there is nothing to revoke server-side; the
//! endpoint acknowledges and the client discards its token.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use crate::api::state::AppState;

use super::types::MessageResponse;

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout acknowledged", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout(state: Extension<Arc<AppState>>) -> impl IntoResponse {
    state.auth.logout();
    (
        StatusCode::OK,
        Json(MessageResponse::new("Logged out successfully")),
    )
}
