//! Persistence boundary for users and tickets.
//!
//! The auth flow and the ticket handlers only see these traits; the real
//! server wires in [`postgres::PgStore`], tests wire in
//! [`memory::MemoryStore`]. The store is always an explicitly passed
//! handle, never a process-global pool.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Role, Ticket, TicketStatus, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Fields for a new user record. `email` must already be normalized.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

/// Result of an insert attempt. Uniqueness is enforced by the store itself
/// (unique index / map key), not by a check-then-insert sequence, so two
/// concurrent registrations for the same email cannot both succeed.
#[derive(Debug)]
pub enum InsertUserOutcome {
    Created(User),
    DuplicateEmail,
}

/// One-time-password state change carried by [`CredentialUpdate`].
///
/// The OTP hash and its expiry only ever change together; there is no way
/// to express setting one without the other.
#[derive(Clone, Debug)]
pub enum OtpUpdate {
    /// Leave the pending OTP (or its absence) untouched.
    Keep,
    /// Replace any pending OTP. Last write wins between concurrent issuers.
    Set {
        hash: String,
        expires_at: DateTime<Utc>,
    },
    /// Remove the pending OTP.
    Clear,
}

/// A single atomic update to a user's credentials.
#[derive(Clone, Debug)]
pub struct CredentialUpdate {
    pub password_hash: Option<String>,
    pub otp: OtpUpdate,
}

impl CredentialUpdate {
    #[must_use]
    pub fn set_otp(hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            password_hash: None,
            otp: OtpUpdate::Set { hash, expires_at },
        }
    }

    /// Rotate the password and clear the pending OTP in one update.
    #[must_use]
    pub fn rotate_password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            otp: OtpUpdate::Clear,
        }
    }
}

/// User records and authentication secrets.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert_user(&self, new_user: NewUser) -> Result<InsertUserOutcome>;

    /// Apply `update` to the user row as a single write. Returns an error
    /// if the user does not exist.
    async fn update_credentials(&self, id: Uuid, update: CredentialUpdate) -> Result<()>;
}

/// Fields for a new ticket. Tickets start out `OPEN` and unassigned.
#[derive(Clone, Debug)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
}

/// Support tickets.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, new_ticket: NewTicket) -> Result<Ticket>;

    /// Tickets created by `user_id`, newest first.
    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>>;

    /// All tickets, newest first.
    async fn all_tickets(&self) -> Result<Vec<Ticket>>;

    /// Returns `None` when the ticket does not exist.
    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>>;

    /// Returns `None` when the ticket does not exist.
    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Ticket>>;
}

/// Liveness probe for the `/health` endpoint.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<()>;
}
