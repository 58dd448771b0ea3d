//! Classified failures returned by the auth flow.

use thiserror::Error;

/// Everything the auth flow can report to its caller. Validation and
/// business-rule failures carry no internals; unexpected collaborator
/// faults are collapsed into `Internal` and logged at the boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing required fields")]
    MissingFields,
    #[error("user already exists")]
    DuplicateUser,
    /// Unknown email and wrong password map here identically so callers
    /// cannot enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    /// Uniform surface for every OTP verifier failure.
    #[error("OTP expired or invalid")]
    OtpExpiredOrInvalid,
    #[error("internal failure")]
    Internal(#[from] anyhow::Error),
}
