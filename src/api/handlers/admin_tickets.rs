//! Admin-only ticket endpoints: list everything, change status, assign.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::domain::TicketStatus;

use super::auth::MessageResponse;
use super::principal::require_admin;
use super::tickets::{server_error, TicketListResponse, TicketResponse};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AssignTicketRequest {
    /// Admin user id to assign, or null to unassign.
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<Uuid>,
}

fn forbidden_response(status: StatusCode) -> (StatusCode, Json<MessageResponse>) {
    let message = if status == StatusCode::FORBIDDEN {
        "Admin access required"
    } else {
        "Unauthorized"
    };
    (status, Json(MessageResponse::new(message)))
}

#[utoipa::path(
    get,
    path = "/api/admin/tickets",
    responses(
        (status = 200, description = "Every ticket in the system, newest first", body = TicketListResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "admin"
)]
pub async fn list_all_tickets(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &state.tokens) {
        return forbidden_response(status).into_response();
    }

    match state.tickets.all_tickets().await {
        Ok(tickets) => (StatusCode::OK, Json(TicketListResponse { tickets })).into_response(),
        Err(err) => server_error("list all tickets", &err).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/admin/tickets/{ticket_id}/status",
    request_body = UpdateStatusRequest,
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket id")
    ),
    responses(
        (status = 200, description = "Status updated", body = TicketResponse),
        (status = 400, description = "Unknown status value", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = MessageResponse),
        (status = 404, description = "No such ticket", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "admin"
)]
pub async fn update_ticket_status(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(ticket_id): Path<Uuid>,
    payload: Option<Json<UpdateStatusRequest>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &state.tokens) {
        return forbidden_response(status).into_response();
    }

    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Invalid status")),
        )
            .into_response();
    };
    // Status arrives as a string so an unknown value is a 400, not a
    // deserialization reject.
    let Some(status) = TicketStatus::parse(&request.status) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Invalid status")),
        )
            .into_response();
    };

    match state.tickets.update_ticket_status(ticket_id, status).await {
        Ok(Some(ticket)) => (
            StatusCode::OK,
            Json(TicketResponse {
                message: "Ticket status updated".to_string(),
                ticket,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Ticket not found")),
        )
            .into_response(),
        Err(err) => server_error("update ticket status", &err).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/api/admin/tickets/{ticket_id}/assign",
    request_body = AssignTicketRequest,
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket id")
    ),
    responses(
        (status = 200, description = "Assignee updated", body = TicketResponse),
        (status = 400, description = "Missing payload", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = MessageResponse),
        (status = 404, description = "No such ticket", body = MessageResponse),
        (status = 500, description = "Server error", body = MessageResponse)
    ),
    tag = "admin"
)]
pub async fn assign_ticket(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(ticket_id): Path<Uuid>,
    payload: Option<Json<AssignTicketRequest>>,
) -> impl IntoResponse {
    if let Err(status) = require_admin(&headers, &state.tokens) {
        return forbidden_response(status).into_response();
    }

    let Some(Json(request)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse::new("Missing payload")),
        )
            .into_response();
    };

    match state
        .tickets
        .assign_ticket(ticket_id, request.assigned_to)
        .await
    {
        Ok(Some(ticket)) => (
            StatusCode::OK,
            Json(TicketResponse {
                message: "Ticket assigned".to_string(),
                ticket,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Ticket not found")),
        )
            .into_response(),
        Err(err) => server_error("assign ticket", &err).into_response(),
    }
}
