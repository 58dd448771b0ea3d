//! In-memory store with the same observable semantics as [`super::PgStore`].
//!
//! Used as the test double for the auth flow and handler tests, and handy
//! for local development without Postgres.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Ticket, TicketStatus, User};

use super::{
    CredentialStore, CredentialUpdate, InsertUserOutcome, NewTicket, NewUser, OtpUpdate,
    StoreHealth, TicketStore,
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    tickets: RwLock<Vec<Ticket>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing the registration flow. Test helper.
    pub async fn seed_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<InsertUserOutcome> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new_user.email) {
            return Ok(InsertUserOutcome::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            password_hash: new_user.password_hash,
            reset_otp_hash: None,
            reset_otp_expires_at: None,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(InsertUserOutcome::Created(user))
    }

    async fn update_credentials(&self, id: Uuid, update: CredentialUpdate) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no user row for id {id}"))?;
        if let Some(password_hash) = update.password_hash {
            user.password_hash = password_hash;
        }
        match update.otp {
            OtpUpdate::Keep => {}
            OtpUpdate::Set { hash, expires_at } => {
                user.reset_otp_hash = Some(hash);
                user.reset_otp_expires_at = Some(expires_at);
            }
            OtpUpdate::Clear => {
                user.reset_otp_hash = None;
                user.reset_otp_expires_at = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, new_ticket: NewTicket) -> Result<Ticket> {
        let now = Utc::now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: new_ticket.title,
            description: new_ticket.description,
            status: TicketStatus::Open,
            created_by: new_ticket.created_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        };
        self.tickets.write().await.push(ticket.clone());
        Ok(ticket)
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut owned: Vec<Ticket> = tickets
            .iter()
            .filter(|ticket| ticket.created_by == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut all: Vec<Ticket> = tickets.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.iter_mut().find(|ticket| ticket.id == ticket_id) else {
            return Ok(None);
        };
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(Some(ticket.clone()))
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.iter_mut().find(|ticket| ticket.id == ticket_id) else {
            return Ok(None);
        };
        ticket.assigned_to = assigned_to;
        ticket.updated_at = Utc::now();
        Ok(Some(ticket.clone()))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
