//! Test fixtures providing pre-built test objects

use actix_web::cookie::Cookie;
use std::sync::Arc;

use super::constants::{TEST_AUDIENCE, TEST_EMAIL, TEST_SESSION_SECRET, TEST_USERNAME};
use super::mock::MockVerifier;
use crate::models::{UserId, UserRecord};
use crate::persona::{AuthContext, IdentityVerifier};
use crate::session::{ensure_token, LoginSession, SessionManager, COOKIE_NAME, USERNAME_KEY};
use crate::settings::{LoginSettings, DEFAULT_SESSION_MAX_AGE_MS};
use crate::users::{InMemoryUserStore, UserStore};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// User store holding `{id: 1, email: "a@example.com"}`
    #[must_use]
    pub fn user_store() -> InMemoryUserStore {
        InMemoryUserStore::with_users([UserRecord::new(UserId::Numeric(1), TEST_EMAIL)])
    }

    /// Session signed in as the fixture user, with a CSRF token
    #[must_use]
    pub fn signed_in_session() -> LoginSession {
        let mut session = LoginSession::new();
        session.set_email(TEST_EMAIL);
        session.insert(USERNAME_KEY, TEST_USERNAME);
        ensure_token(&mut session);
        session
    }

    /// Session manager over plain-HTTP cookies keyed with the test secret
    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::new(
            TEST_SESSION_SECRET,
            COOKIE_NAME,
            false,
            DEFAULT_SESSION_MAX_AGE_MS,
        )
    }

    /// Settings matching the other fixtures
    #[must_use]
    pub fn settings() -> LoginSettings {
        let mut settings = LoginSettings::default();
        settings.persona.audience = TEST_AUDIENCE.to_string();
        settings.session.session_secret = String::from_utf8_lossy(TEST_SESSION_SECRET).into_owned();
        settings
    }

    /// Verifier accepting every assertion as `email`
    #[must_use]
    pub fn accepting_verifier(email: &str) -> Arc<dyn IdentityVerifier> {
        Arc::new(MockVerifier::accept(email))
    }

    /// Verifier rejecting every assertion with `reason`
    #[must_use]
    pub fn rejecting_verifier(reason: &str) -> Arc<dyn IdentityVerifier> {
        Arc::new(MockVerifier::reject(reason))
    }

    /// Auth context over the fixture user store
    #[must_use]
    pub fn auth_context(verifier: Arc<dyn IdentityVerifier>) -> AuthContext {
        Self::auth_context_with_store(verifier, Arc::new(Self::user_store()))
    }

    #[must_use]
    pub fn auth_context_with_store(
        verifier: Arc<dyn IdentityVerifier>,
        users: Arc<dyn UserStore>,
    ) -> AuthContext {
        AuthContext::new(TEST_AUDIENCE, verifier, users)
    }

    /// Encrypted cookie for `session`
    ///
    /// # Panics
    ///
    /// Panics if the session cannot be encrypted.
    #[must_use]
    pub fn session_cookie(session: &LoginSession) -> Cookie<'static> {
        Self::session_manager()
            .cookie_factory()
            .create_session_cookie(session)
            .expect("session cookie encrypts")
    }

    /// A fresh session cookie and its CSRF token
    #[must_use]
    pub fn session_cookie_with_csrf() -> (Cookie<'static>, String) {
        let mut session = LoginSession::new();
        let token = ensure_token(&mut session);
        (Self::session_cookie(&session), token)
    }

    /// Cookie and CSRF token for the signed-in fixture session
    #[must_use]
    pub fn signed_in_cookie() -> (Cookie<'static>, String) {
        let mut session = Self::signed_in_session();
        let token = ensure_token(&mut session);
        (Self::session_cookie(&session), token)
    }
}
