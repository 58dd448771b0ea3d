//! Handlers for the `/api/auth` surface.

pub mod login;
pub mod password_reset;
pub mod register;
pub mod session;
pub mod types;

pub use login::login;
pub use password_reset::{forgot_password, reset_password};
pub use register::register;
pub use session::logout;
pub use types::{LoginResponse, MessageResponse, RegisterResponse};
