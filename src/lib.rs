//! # Helpdesk (Customer Support Ticketing API)
//!
//! `helpdesk` is the backend for a small customer support system. Users
//! register, log in, and file tickets; admins triage every ticket, change
//! statuses, and assign work.
//!
//! ## Authentication
//!
//! Login issues a stateless HS256 bearer token carrying the user id and
//! role. Passwords are stored as Argon2id PHC strings and never leave the
//! auth module in plaintext.
//!
//! ## Password Reset
//!
//! Forgot-password issues a six-digit OTP, stores only its Argon2id hash
//! with a ten-minute expiry, and queues the plaintext for email delivery.
//! Redeeming the OTP rotates the password and clears the pending code in a
//! single store write, so a code can never be used twice.
//!
//! ## Roles
//!
//! Two roles: `USER` and `ADMIN`. Admin routes return `401` without a
//! valid token and `403` for authenticated non-admins.

pub mod api;
pub mod auth;
pub mod cli;
pub mod domain;
pub mod email;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
