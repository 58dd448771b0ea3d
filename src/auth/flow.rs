//! Orchestration of register / login / forgot-password / reset-password /
//! logout.
//!
//! The flow holds no state between requests; everything mutable lives in
//! the injected [`CredentialStore`]. Password and OTP hashing run under
//! `spawn_blocking` so argon2 never stalls the executor.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::email::{EmailMessage, Mailer};
use crate::store::{CredentialStore, CredentialUpdate, InsertUserOutcome, NewUser};

use super::error::AuthError;
use super::otp;
use super::password::PasswordHasher;
use super::token::TokenIssuer;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Public view of a user; never carries the password hash.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Successful login: bearer token plus the authenticated profile.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserProfile,
}

/// Normalize an email for lookup and uniqueness checks.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic shape check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn require_field(value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingFields);
    }
    Ok(())
}

fn require_email(email: &str) -> Result<String, AuthError> {
    require_field(email)?;
    let normalized = normalize_email(email);
    if !valid_email(&normalized) {
        return Err(AuthError::MissingFields);
    }
    Ok(normalized)
}

pub struct AuthFlow {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    mailer: Mailer,
}

impl AuthFlow {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer, mailer: Mailer) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
            tokens,
            mailer,
        }
    }

    async fn hash_blocking(&self, plaintext: String) -> Result<String> {
        let hasher = self.hasher;
        task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .context("hashing task panicked")?
    }

    async fn verify_blocking(&self, plaintext: String, stored: String) -> Result<bool> {
        let hasher = self.hasher;
        task::spawn_blocking(move || hasher.verify(&plaintext, &stored))
            .await
            .context("verify task panicked")
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AuthError> {
        require_field(&request.name)?;
        require_field(&request.password)?;
        let email = require_email(&request.email)?;

        let password_hash = self.hash_blocking(request.password).await?;
        let outcome = self
            .store
            .insert_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                role: Role::User,
                password_hash,
            })
            .await?;

        let user = match outcome {
            InsertUserOutcome::Created(user) => user,
            InsertUserOutcome::DuplicateEmail => return Err(AuthError::DuplicateUser),
        };

        // Welcome mail is fire-and-forget: queued after the insert committed,
        // and a full queue or dead worker never rolls back registration.
        self.mailer.deliver(EmailMessage {
            to: user.email.clone(),
            subject: "Welcome to Support System".to_string(),
            text: format!(
                "Welcome {}, your account has been created successfully.",
                user.name
            ),
            html: format!(
                "<h2>Welcome {}</h2><p>Your account has been created successfully.</p>",
                user.name
            ),
        });

        Ok(UserProfile::from(&user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        require_field(&request.password)?;
        let email = require_email(&request.email)?;

        // Unknown email and wrong password are indistinguishable to the
        // caller; only the debug log tells them apart.
        let Some(user) = self.store.find_by_email(&email).await? else {
            debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .verify_blocking(request.password, user.password_hash.clone())
            .await?;
        if !matches {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, user.role)?;
        Ok(LoginOutcome {
            token,
            user: UserProfile::from(&user),
        })
    }

    /// Issue a fresh OTP and queue it for delivery. Re-issuing overwrites
    /// any prior pending OTP, so only the latest code verifies.
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<(), AuthError> {
        let email = require_email(&request.email)?;

        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::UserNotFound);
        };

        let code = otp::generate();
        let otp_hash = self.hash_blocking(code.clone()).await?;
        let expires_at = otp::expiry_from(Utc::now());

        self.store
            .update_credentials(user.id, CredentialUpdate::set_otp(otp_hash, expires_at))
            .await?;

        // The plaintext code exists only here and in the queued message; it
        // is never persisted or logged.
        self.mailer.deliver(EmailMessage {
            to: user.email.clone(),
            subject: "Your Password Reset OTP".to_string(),
            text: format!(
                "Hello {}, your OTP is {}. It is valid for {} minutes.",
                user.name,
                code,
                otp::OTP_TTL_MINUTES
            ),
            html: format!(
                "<h2>Hello {}</h2><p>Your OTP for password reset is:</p><h1>{}</h1>\
                 <p>This OTP is valid for <b>{} minutes</b>.</p>",
                user.name,
                code,
                otp::OTP_TTL_MINUTES
            ),
        });

        Ok(())
    }

    /// Verify the submitted OTP and rotate the password. On success the
    /// new hash is stored and both OTP fields are cleared in one update;
    /// on failure the pending OTP is left alone for further attempts.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<(), AuthError> {
        require_field(&request.otp)?;
        require_field(&request.new_password)?;
        let email = require_email(&request.email)?;

        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::UserNotFound);
        };

        let hasher = self.hasher;
        let submitted = request.otp.clone();
        let candidate = user.clone();
        let checked = task::spawn_blocking(move || {
            otp::verify(&candidate, &submitted, Utc::now(), &hasher)
        })
        .await
        .map_err(|err| AuthError::Internal(anyhow!("otp verify task panicked: {err}")))?;

        if let Err(reason) = checked {
            debug!(user_id = %user.id, %reason, "OTP verification failed");
            return Err(AuthError::OtpExpiredOrInvalid);
        }

        let password_hash = self.hash_blocking(request.new_password).await?;
        self.store
            .update_credentials(user.id, CredentialUpdate::rotate_password(password_hash))
            .await?;

        Ok(())
    }

    /// Tokens are stateless, so logout is an acknowledgement only;
    /// previously issued tokens remain valid until they expire.
    pub fn logout(&self) {
        debug!("logout acknowledged");
    }

    /// Log an internal failure with context and return the uniform error.
    /// Used by the HTTP layer so handler bodies stay small.
    pub fn log_internal(operation: &str, err: &AuthError) {
        if let AuthError::Internal(inner) = err {
            error!("{operation} failed: {inner:#}");
        }
    }
}
