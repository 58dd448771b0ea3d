//! Postgres-backed store. Schema lives in `sql/schema.sql`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::{Role, Ticket, TicketStatus, User};

use super::{
    CredentialStore, CredentialUpdate, InsertUserOutcome, NewTicket, NewUser, OtpUpdate,
    StoreHealth, TicketStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn row_to_user(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");
    let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role in users row: {role}"))?;
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role,
        password_hash: row.get("password_hash"),
        reset_otp_hash: row.get("reset_otp_hash"),
        reset_otp_expires_at: row.get("reset_otp_expires_at"),
        created_at: row.get("created_at"),
    })
}

fn row_to_ticket(row: &PgRow) -> Result<Ticket> {
    let status: String = row.get("status");
    let status = TicketStatus::parse(&status)
        .ok_or_else(|| anyhow!("unknown status in tickets row: {status}"))?;
    Ok(Ticket {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status,
        created_by: row.get("created_by"),
        assigned_to: row.get("assigned_to"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const USER_COLUMNS: &str =
    "id, name, email, role, password_hash, reset_otp_hash, reset_otp_expires_at, created_at";

const TICKET_COLUMNS: &str =
    "id, title, description, status, created_by, assigned_to, created_at, updated_at";

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to look up user by email")?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to look up user by id")?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<InsertUserOutcome> {
        // Uniqueness is enforced by the index on email; a duplicate surfaces
        // as SQLSTATE 23505 instead of a racy pre-check.
        let query = format!(
            "INSERT INTO users (name, email, role, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(new_user.role.as_str())
            .bind(&new_user.password_hash)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await;

        match row {
            Ok(row) => Ok(InsertUserOutcome::Created(row_to_user(&row)?)),
            Err(err) if is_unique_violation(&err) => Ok(InsertUserOutcome::DuplicateEmail),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn update_credentials(&self, id: Uuid, update: CredentialUpdate) -> Result<()> {
        // One statement per OTP variant so the hash and expiry always move
        // together; COALESCE keeps the password when no rotation was asked.
        let result = match update.otp {
            OtpUpdate::Keep => {
                let query = r"
                    UPDATE users
                    SET password_hash = COALESCE($2, password_hash)
                    WHERE id = $1
                ";
                sqlx::query(query)
                    .bind(id)
                    .bind(update.password_hash)
                    .execute(&self.pool)
                    .instrument(db_span("UPDATE", query))
                    .await
            }
            OtpUpdate::Set { hash, expires_at } => {
                let query = r"
                    UPDATE users
                    SET password_hash = COALESCE($2, password_hash),
                        reset_otp_hash = $3,
                        reset_otp_expires_at = $4
                    WHERE id = $1
                ";
                sqlx::query(query)
                    .bind(id)
                    .bind(update.password_hash)
                    .bind(hash)
                    .bind(expires_at)
                    .execute(&self.pool)
                    .instrument(db_span("UPDATE", query))
                    .await
            }
            OtpUpdate::Clear => {
                let query = r"
                    UPDATE users
                    SET password_hash = COALESCE($2, password_hash),
                        reset_otp_hash = NULL,
                        reset_otp_expires_at = NULL
                    WHERE id = $1
                ";
                sqlx::query(query)
                    .bind(id)
                    .bind(update.password_hash)
                    .execute(&self.pool)
                    .instrument(db_span("UPDATE", query))
                    .await
            }
        };

        let result = result.context("failed to update credentials")?;
        if result.rows_affected() == 0 {
            return Err(anyhow!("no user row for id {id}"));
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket(&self, new_ticket: NewTicket) -> Result<Ticket> {
        let query = format!(
            "INSERT INTO tickets (title, description, created_by)
             VALUES ($1, $2, $3)
             RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&new_ticket.title)
            .bind(&new_ticket.description)
            .bind(new_ticket.created_by)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await
            .context("failed to insert ticket")?;
        row_to_ticket(&row)
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<Ticket>> {
        let query = format!(
            "SELECT {TICKET_COLUMNS} FROM tickets
             WHERE created_by = $1
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to list user tickets")?;
        rows.iter().map(row_to_ticket).collect()
    }

    async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        let query = format!("SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at DESC");
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to list tickets")?;
        rows.iter().map(row_to_ticket).collect()
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<Ticket>> {
        let query = format!(
            "UPDATE tickets
             SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(ticket_id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await
            .context("failed to update ticket status")?;
        row.as_ref().map(row_to_ticket).transpose()
    }

    async fn assign_ticket(
        &self,
        ticket_id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Ticket>> {
        let query = format!(
            "UPDATE tickets
             SET assigned_to = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {TICKET_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(ticket_id)
            .bind(assigned_to)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await
            .context("failed to assign ticket")?;
        row.as_ref().map(row_to_ticket).transpose()
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<()> {
        let span = tracing::info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire database connection")?;
        conn.ping()
            .instrument(span)
            .await
            .context("failed to ping database")?;
        Ok(())
    }
}
