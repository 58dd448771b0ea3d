//! Shared server state injected into handlers via `Extension`.

use secrecy::SecretString;
use std::sync::Arc;

use crate::auth::{AuthFlow, TokenIssuer};
use crate::store::{StoreHealth, TicketStore};

/// One day, matching the issued token lifetime of the frontend session.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 86_400;

pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:5173";

/// Server configuration assembled by the CLI.
#[derive(Clone, Debug)]
pub struct AppConfig {
    jwt_secret: SecretString,
    frontend_base_url: String,
    token_ttl_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, frontend_base_url: impl Into<String>) -> Self {
        self.frontend_base_url = frontend_base_url.into();
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, token_ttl_seconds: i64) -> Self {
        self.token_ttl_seconds = token_ttl_seconds;
        self
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub const fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}

/// Everything a handler needs, behind one `Arc`.
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthFlow,
    pub tickets: Arc<dyn TicketStore>,
    pub tokens: TokenIssuer,
    pub health: Arc<dyn StoreHealth>,
}
