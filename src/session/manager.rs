use actix_web::{cookie::Cookie, HttpRequest};
use anyhow::Result;
use chrono::{Duration, Utc};
use log::{debug, warn};

use super::cookie::CookieFactory;
use super::data::LoginSession;
use crate::settings::LoginSettings;
use crate::utils::crypto::{decrypt_data, derive_encryption_key};

/// Session manager for the encrypted `login.sid` cookie
///
/// Sessions are stateless: everything lives in the cookie, encrypted with a
/// key derived from the session secret.
#[derive(Clone)]
pub struct SessionManager {
    cookie_factory: CookieFactory,
    max_age_ms: u64,
}

impl SessionManager {
    #[must_use]
    pub fn new(secret: &[u8], cookie_name: &str, cookie_secure: bool, max_age_ms: u64) -> Self {
        Self {
            cookie_factory: CookieFactory::new(
                derive_encryption_key(secret),
                cookie_name,
                cookie_secure,
                max_age_ms,
            ),
            max_age_ms,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &LoginSettings) -> Self {
        Self::new(
            settings.session.session_secret.as_bytes(),
            &settings.session.cookie_name,
            settings.application.force_ssl,
            settings.session.max_age_ms,
        )
    }

    #[must_use]
    pub fn cookie_factory(&self) -> &CookieFactory {
        &self.cookie_factory
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_factory.cookie_secure()
    }

    /// Decode the session carried by the request
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Session cookie is not found
    /// - Decryption fails
    /// - Session has expired
    pub fn extract_session(&self, req: &HttpRequest) -> Result<LoginSession> {
        let cookie = req
            .cookie(self.cookie_factory.cookie_name())
            .ok_or_else(|| anyhow::anyhow!("Session not found"))?;

        let session: LoginSession =
            decrypt_data(cookie.value(), self.cookie_factory.encryption_key())?;

        if session.is_expired(self.max_age(), Utc::now()) {
            return Err(anyhow::anyhow!("Session expired"));
        }

        Ok(session)
    }

    /// Decode the session carried by the request, or start a fresh one
    #[must_use]
    pub fn load(&self, req: &HttpRequest) -> LoginSession {
        self.extract_session(req).unwrap_or_else(|e| {
            debug!("Starting new session: {e}");
            LoginSession::new()
        })
    }

    /// Build the cookie that persists `session` for this request
    ///
    /// Secure cookies are withheld on plain-HTTP requests; the scheme honours
    /// `Forwarded`/`X-Forwarded-Proto` so TLS-terminating proxies work.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn session_cookie(
        &self,
        session: &LoginSession,
        req: &HttpRequest,
    ) -> Result<Option<Cookie<'static>>> {
        if self.cookie_secure() && req.connection_info().scheme() != "https" {
            warn!("Not sending secure session cookie over insecure connection");
            return Ok(None);
        }
        self.cookie_factory.create_session_cookie(session).map(Some)
    }

    fn max_age(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.max_age_ms).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_SESSION_MAX_AGE_MS;
    use crate::testing::constants::TEST_SESSION_SECRET;
    use actix_web::test as actix_test;

    fn manager(secure: bool) -> SessionManager {
        SessionManager::new(
            TEST_SESSION_SECRET,
            "login.sid",
            secure,
            DEFAULT_SESSION_MAX_AGE_MS,
        )
    }

    #[test]
    fn test_cookie_round_trip_through_request() {
        let manager = manager(false);
        let mut session = LoginSession::new();
        session.set_email("a@example.com");

        let plain_req = actix_test::TestRequest::default().to_http_request();
        let cookie = manager.session_cookie(&session, &plain_req).unwrap().unwrap();

        let req = actix_test::TestRequest::default().cookie(cookie).to_http_request();
        let loaded = manager.extract_session(&req).unwrap();
        assert_eq!(loaded.email(), Some("a@example.com"));
    }

    #[test]
    fn test_missing_cookie_starts_fresh_session() {
        let req = actix_test::TestRequest::default().to_http_request();
        let manager = manager(false);

        assert!(manager.extract_session(&req).is_err());
        assert!(manager.load(&req).is_empty());
    }

    #[test]
    fn test_tampered_cookie_is_rejected() {
        let req = actix_test::TestRequest::default()
            .cookie(Cookie::new("login.sid", "definitely-not-encrypted"))
            .to_http_request();

        assert!(manager(false).extract_session(&req).is_err());
        assert!(manager(false).load(&req).is_empty());
    }

    #[test]
    fn test_cookie_from_other_secret_is_rejected() {
        let other = SessionManager::new(b"another secret", "login.sid", false, 1000);
        let mut session = LoginSession::new();
        session.set_email("a@example.com");
        let cookie = other
            .cookie_factory()
            .create_session_cookie(&session)
            .unwrap();

        let req = actix_test::TestRequest::default().cookie(cookie).to_http_request();
        assert!(manager(false).extract_session(&req).is_err());
    }

    #[test]
    fn test_expired_session_is_rejected() {
        // Zero max age: every session is already expired
        let short = SessionManager::new(TEST_SESSION_SECRET, "login.sid", false, 0);
        let cookie = short
            .cookie_factory()
            .create_session_cookie(&LoginSession::new())
            .unwrap();

        let req = actix_test::TestRequest::default().cookie(cookie).to_http_request();
        let err = short.extract_session(&req).unwrap_err();
        assert!(err.to_string().contains("Session expired"));
    }

    #[test]
    fn test_unbounded_max_age_keeps_session() {
        let manager = SessionManager::new(TEST_SESSION_SECRET, "login.sid", false, u64::MAX);
        let mut session = LoginSession::new();
        session.set_email("a@example.com");
        let cookie = manager
            .cookie_factory()
            .create_session_cookie(&session)
            .unwrap();

        let req = actix_test::TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(manager.load(&req).email(), Some("a@example.com"));
    }

    #[test]
    fn test_secure_cookie_requires_https() {
        let manager = manager(true);
        let session = LoginSession::new();

        let plain = actix_test::TestRequest::default().to_http_request();
        assert!(manager.session_cookie(&session, &plain).unwrap().is_none());

        let proxied = actix_test::TestRequest::default()
            .insert_header(("X-Forwarded-Proto", "https"))
            .to_http_request();
        let cookie = manager.session_cookie(&session, &proxied).unwrap().unwrap();
        assert!(cookie.secure().unwrap());
    }
}
