//! Authenticated principal extraction and authorization helpers.
//!
//! Handlers read the `Authorization: Bearer` header, verify the token, and
//! get back a principal carrying the user id and role from the claims.
//! Role checks happen per route, not here.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::auth::TokenIssuer;
use crate::domain::Role;

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Copy, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token into a principal, or return 401 for missing,
/// invalid, or expired tokens.
pub fn require_auth(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<Principal, StatusCode> {
    let Some(token) = bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    match tokens.verify(token) {
        Ok(claims) => Ok(Principal {
            user_id: claims.sub,
            role: claims.role,
        }),
        Err(err) => {
            debug!("rejected bearer token: {err}");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Like [`require_auth`] but also demands the ADMIN role, returning 403
/// for authenticated non-admins.
pub fn require_admin(headers: &HeaderMap, tokens: &TokenIssuer) -> Result<Principal, StatusCode> {
    let principal = require_auth(headers, tokens)?;
    if principal.role != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("test-secret".to_string()), 3600)
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn missing_header_is_unauthorized() {
        assert_eq!(
            require_auth(&HeaderMap::new(), &issuer()).map(|p| p.user_id),
            Err(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn malformed_scheme_is_unauthorized() -> Result<()> {
        let issuer = issuer();
        let token = issuer.issue(Uuid::new_v4(), Role::User)?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&token)?);
        assert!(require_auth(&headers, &issuer).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(require_auth(&headers, &issuer).is_err());
        Ok(())
    }

    #[test]
    fn valid_token_yields_principal() -> Result<()> {
        let issuer = issuer();
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id, Role::User)?;
        let principal =
            require_auth(&headers_with(&token), &issuer).map_err(|status| anyhow::anyhow!("{status}"))?;
        assert_eq!(principal.user_id, user_id);
        assert_eq!(principal.role, Role::User);
        Ok(())
    }

    #[test]
    fn admin_gate_rejects_users_with_403() -> Result<()> {
        let issuer = issuer();
        let user_token = issuer.issue(Uuid::new_v4(), Role::User)?;
        assert_eq!(
            require_admin(&headers_with(&user_token), &issuer).map(|p| p.role),
            Err(StatusCode::FORBIDDEN)
        );

        let admin_token = issuer.issue(Uuid::new_v4(), Role::Admin)?;
        assert!(require_admin(&headers_with(&admin_token), &issuer).is_ok());
        Ok(())
    }

    #[test]
    fn expired_token_is_unauthorized() -> Result<()> {
        let expired = TokenIssuer::new(&SecretString::from("test-secret".to_string()), -10)
            .issue(Uuid::new_v4(), Role::User)?;
        assert_eq!(
            require_auth(&headers_with(&expired), &issuer()).map(|p| p.user_id),
            Err(StatusCode::UNAUTHORIZED)
        );
        Ok(())
    }
}
