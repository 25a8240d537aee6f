//! Persona identity flow: assertion verification and response normalization

pub mod responses;
pub mod verifier;

use std::sync::Arc;

use crate::users::UserStore;

pub use responses::{logout_response, verify_response, AuthResponse, AuthStatus};
pub use verifier::{
    AssertionResult, IdentityVerifier, RemoteVerifier, VerificationError, VerifiedIdentity,
};

/// Everything the identity endpoints need, built once at startup
#[derive(Clone)]
pub struct AuthContext {
    audience: String,
    verifier: Arc<dyn IdentityVerifier>,
    users: Arc<dyn UserStore>,
}

impl AuthContext {
    #[must_use]
    pub fn new(
        audience: &str,
        verifier: Arc<dyn IdentityVerifier>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            audience: audience.to_string(),
            verifier,
            users,
        }
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.verifier.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }
}
