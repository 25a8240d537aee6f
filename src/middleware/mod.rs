//! Request middleware for the login server
//!
//! - [`health`] - user store health gate
//! - [`locale`] - locale negotiation and locale path prefixes
//! - [`error_pages`] - environment-specific 5xx bodies

pub mod error_pages;
pub mod health;
pub mod locale;

use actix_web::{http::header, middleware::DefaultHeaders};

pub use error_pages::generic_server_errors;
pub use health::{require_user_store, HEALTHCHECK_PATH};
pub use locale::{negotiate_locale, Locale, LocaleNegotiator};

/// HSTS max-age in seconds (180 days)
pub const HSTS_MAX_AGE_SECONDS: u64 = 15_552_000;

/// `Strict-Transport-Security` on every response, for SSL-only deployments
#[must_use]
pub fn hsts() -> DefaultHeaders {
    DefaultHeaders::new().add((
        header::STRICT_TRANSPORT_SECURITY,
        format!("max-age={HSTS_MAX_AGE_SECONDS}; includeSubDomains"),
    ))
}
