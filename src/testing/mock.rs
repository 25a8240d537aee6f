//! Fake identity verifiers for isolated handler tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::persona::{IdentityVerifier, VerificationError, VerifiedIdentity};

/// Verifier that answers every assertion the same way
pub struct MockVerifier {
    outcome: Result<String, String>,
    calls: AtomicUsize,
}

impl MockVerifier {
    /// Accept every assertion as `email`
    #[must_use]
    pub fn accept(email: &str) -> Self {
        Self {
            outcome: Ok(email.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reject every assertion with `reason`
    #[must_use]
    pub fn reject(reason: &str) -> Self {
        Self {
            outcome: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of verifications performed so far
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn verify(
        &self,
        _assertion: &str,
        _audience: &str,
    ) -> Result<VerifiedIdentity, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(email) => Ok(VerifiedIdentity {
                email: email.clone(),
                issuer: Some("login.persona.org".to_string()),
                expires: None,
            }),
            Err(reason) => Err(VerificationError::Rejected(reason.clone())),
        }
    }
}
