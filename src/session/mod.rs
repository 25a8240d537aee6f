//! Session Management Module
//!
//! Cookie-backed sessions for the login server.
//!
//! # Modules
//!
//! - [`data`] - The session key/value store
//! - [`cookie`] - Encrypted cookie creation
//! - [`manager`] - Loading and persisting sessions per request
//! - [`csrf`] - CSRF token handling backed by the session

pub mod cookie;
pub mod csrf;
pub mod data;
pub mod manager;

pub use cookie::{CookieFactory, CookieOptions, COOKIE_NAME};
pub use csrf::{ensure_token, verify_request, CsrfError};
pub use data::{LoginSession, CSRF_KEY, EMAIL_KEY, USERNAME_KEY};
pub use manager::SessionManager;
