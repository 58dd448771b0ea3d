//! Authentication: credential hashing, OTP password resets, and bearer
//! tokens, orchestrated by [`AuthFlow`].

pub mod error;
pub mod flow;
pub mod otp;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use flow::{
    AuthFlow, ForgotPasswordRequest, LoginOutcome, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UserProfile,
};
pub use password::PasswordHasher;
pub use token::{Claims, TokenError, TokenIssuer};
