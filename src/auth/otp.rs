//! One-time-password generation and verification for password resets.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

use crate::domain::User;

use super::password::PasswordHasher;

/// Pending OTPs expire ten minutes after issuance.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Why a submitted OTP was rejected. The auth flow surfaces all of these
/// uniformly; the distinction exists for logging and tests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("no pending OTP for user")]
    NoPendingOtp,
    #[error("OTP expired")]
    Expired,
    #[error("OTP mismatch")]
    Mismatch,
}

/// Generate a uniformly random six-digit code. The range starts at 100000
/// so a leading zero is never produced.
#[must_use]
pub fn generate() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[must_use]
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(OTP_TTL_MINUTES)
}

/// Check `submitted` against the user's pending OTP at time `now`.
///
/// Expiry is checked before the hash comparison: an expired code fails
/// without paying for a hash, and the internal failure reason stays
/// distinguishable. Failed checks leave the pending OTP untouched, so the
/// correct code stays valid until expiry or successful use.
pub fn verify(
    user: &User,
    submitted: &str,
    now: DateTime<Utc>,
    hasher: &PasswordHasher,
) -> Result<(), OtpError> {
    let (Some(otp_hash), Some(expires_at)) = (&user.reset_otp_hash, user.reset_otp_expires_at)
    else {
        return Err(OtpError::NoPendingOtp);
    };
    if now >= expires_at {
        return Err(OtpError::Expired);
    }
    if !hasher.verify(submitted, otp_hash) {
        return Err(OtpError::Mismatch);
    }
    Ok(())
}
