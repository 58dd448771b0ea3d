use utoipa::openapi::{Contact, InfoBuilder, License, Tag};
use utoipa::OpenApi;

use super::handlers::{admin_tickets, auth, health, tickets};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::login::login,
        auth::password_reset::forgot_password,
        auth::password_reset::reset_password,
        auth::session::logout,
        tickets::create_ticket,
        tickets::list_own_tickets,
        admin_tickets::list_all_tickets,
        admin_tickets::update_ticket_status,
        admin_tickets::assign_ticket,
    ),
    components(schemas(
        health::Health,
        auth::types::MessageResponse,
        auth::types::RegisterResponse,
        auth::types::LoginResponse,
        crate::auth::RegisterRequest,
        crate::auth::LoginRequest,
        crate::auth::ForgotPasswordRequest,
        crate::auth::ResetPasswordRequest,
        crate::auth::UserProfile,
        crate::domain::Role,
        crate::domain::Ticket,
        crate::domain::TicketStatus,
        tickets::CreateTicketRequest,
        tickets::TicketResponse,
        tickets::TicketListResponse,
        admin_tickets::UpdateStatusRequest,
        admin_tickets::AssignTicketRequest,
    ))
)]
struct ApiDoc;

/// Build the OpenAPI document served under `/docs`, with Cargo.toml
/// metadata instead of the derive defaults.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = cargo_license();
    doc.info = info;

    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service and database liveness".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login, and password reset".to_string());

    let mut tickets_tag = Tag::new("tickets");
    tickets_tag.description = Some("Support tickets for the authenticated user".to_string());

    let mut admin_tag = Tag::new("admin");
    admin_tag.description = Some("Ticket triage for admins".to_string());

    doc.tags = Some(vec![health_tag, auth_tag, tickets_tag, admin_tag]);

    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/forgot-password",
            "/api/auth/reset-password",
            "/api/auth/logout",
            "/api/tickets",
            "/api/admin/tickets",
            "/api/admin/tickets/{ticket_id}/status",
            "/api/admin/tickets/{ticket_id}/assign",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn document_carries_cargo_metadata() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));
        let tags = doc.tags.unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
    }

    #[test]
    fn parse_author_handles_both_forms() {
        assert_eq!(
            parse_author("Jane Doe <jane@example.com>"),
            (Some("Jane Doe"), Some("jane@example.com"))
        );
        assert_eq!(parse_author("Jane Doe"), (Some("Jane Doe"), None));
        assert_eq!(parse_author(""), (None, None));
    }
}
