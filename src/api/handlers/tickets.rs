//! User-facing ticket endpoints: create a ticket, list your own.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::api::state::AppState;
use crate::domain::Ticket;
use crate::store::NewTicket;

use super::auth::MessageResponse;
use super::principal::require_auth;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TicketResponse {
    pub message: String,
    pub ticket: Ticket,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TicketListResponse {
    pub tickets: Vec<Ticket>,
}

pub(crate) fn server_error(operation: &str, err: &anyhow::Error) -> (StatusCode, Json<MessageResponse>) {
    error!("{operation} failed: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(MessageResponse::new("Server error")),
    )
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Missing title or description", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<CreateTicketRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &state.tokens) {
        Ok(principal) => principal,
        Err(status) => {
            return (status, Json(MessageResponse::new("Unauthorized"))).into_response()
        }
    };

    let request = match payload {
        Some(Json(request)) => request,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::new("Title and description required")),
            )
                .into_response()
        }
    };
    if request.title.trim().is_empty() || request.description.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Title and description required")),
        )
            .into_response();
    }

    let new_ticket = NewTicket {
        title: request.title.trim().to_string(),
        description: request.description.trim().to_string(),
        created_by: principal.user_id,
    };
    match state.tickets.insert_ticket(new_ticket).await {
        Ok(ticket) => (
            StatusCode::CREATED,
            Json(TicketResponse {
                message: "Ticket created successfully".to_string(),
                ticket,
            }),
        )
            .into_response(),
        Err(err) => server_error("create ticket", &err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    responses(
        (status = 200, description = "Tickets created by the caller, newest first", body = TicketListResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "tickets"
)]
pub async fn list_own_tickets(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &state.tokens) {
        Ok(principal) => principal,
        Err(status) => {
            return (status, Json(MessageResponse::new("Unauthorized"))).into_response()
        }
    };

    match state.tickets.tickets_for_user(principal.user_id).await {
        Ok(tickets) => (StatusCode::OK, Json(TicketListResponse { tickets })).into_response(),
        Err(err) => server_error("list tickets", &err).into_response(),
    }
}
