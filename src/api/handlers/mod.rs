//! HTTP handlers, grouped by surface.

pub mod admin_tickets;
pub mod auth;
pub mod health;
pub mod principal;
pub mod tickets;
