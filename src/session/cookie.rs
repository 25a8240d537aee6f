use actix_web::cookie::{time::Duration, Cookie, SameSite};
use anyhow::Result;
use serde::Serialize;

use super::data::LoginSession;
use crate::utils::crypto::encrypt_data;

/// Default session cookie name
pub const COOKIE_NAME: &str = "login.sid";

/// Options for cookie creation
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::hours(24),
        }
    }
}

/// Cookie factory for creating encrypted cookies with proper configuration
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_name: String,
    cookie_secure: bool,
    max_age_ms: u64,
}

impl CookieFactory {
    #[must_use]
    pub fn new(
        encryption_key: [u8; 32],
        cookie_name: &str,
        cookie_secure: bool,
        max_age_ms: u64,
    ) -> Self {
        Self {
            encryption_key,
            cookie_name: cookie_name.to_string(),
            cookie_secure,
            max_age_ms,
        }
    }

    /// Generic method to create a cookie with encrypted data
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_cookie<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        options: CookieOptions,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;

        Ok(Cookie::build(name.to_owned(), value)
            .http_only(options.http_only)
            .secure(self.cookie_secure && options.secure)
            .same_site(options.same_site)
            .path(options.path)
            .max_age(options.max_age)
            .finish())
    }

    /// Create the encrypted session cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, session: &LoginSession) -> Result<Cookie<'static>> {
        self.create_cookie(
            &self.cookie_name,
            session,
            CookieOptions {
                max_age: self.max_age(),
                ..Default::default()
            },
        )
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn encryption_key(&self) -> &[u8; 32] {
        &self.encryption_key
    }

    /// Cookie lifetime
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.max_age_ms).unwrap_or(i64::MAX))
    }
}
