//! Normalized JSON payloads for the verify and logout endpoints
//!
//! [`verify_response`] and [`logout_response`] hold all of the decision logic
//! of the identity endpoints; the HTTP layer only gathers their inputs and
//! writes the result.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::UserRecord;
use crate::session::LoginSession;
use crate::users::UserStore;

/// Top-level `status` of every identity payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Okay,
    Failure,
}

impl AuthStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Okay => "okay",
            Self::Failure => "failure",
        }
    }
}

/// Response payload of the identity endpoints
///
/// Each variant serializes to exactly the keys its payload carries, so a
/// failure can never include a `user` and an unknown email never has one.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResponse {
    /// `{status: "failure", reason}`
    Failure { reason: String },
    /// `{exists: true, user, email, status: "okay"}`
    KnownUser { user: UserRecord, email: String },
    /// `{error, exists: false, email, status: "okay"}`
    ///
    /// `error` is the lookup failure, or `null` when the user simply does not exist.
    UnknownUser { email: String, error: Option<String> },
    /// `{status: "okay"}`
    Okay,
}

impl AuthResponse {
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        match self {
            Self::Failure { .. } => AuthStatus::Failure,
            Self::KnownUser { .. } | Self::UnknownUser { .. } | Self::Okay => AuthStatus::Okay,
        }
    }

    /// The user record, present only for a known user
    #[must_use]
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            Self::KnownUser { user, .. } => Some(user),
            _ => None,
        }
    }
}

impl Serialize for AuthResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Failure { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", self.status().as_str())?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
            Self::KnownUser { user, email } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("exists", &true)?;
                map.serialize_entry("user", user)?;
                map.serialize_entry("email", email)?;
                map.serialize_entry("status", self.status().as_str())?;
                map.end()
            }
            Self::UnknownUser { email, error } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("exists", &false)?;
                map.serialize_entry("email", email)?;
                map.serialize_entry("status", self.status().as_str())?;
                map.end()
            }
            Self::Okay => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", self.status().as_str())?;
                map.end()
            }
        }
    }
}

/// Build the verify payload for an assertion outcome
///
/// A verification error short-circuits to a failure without touching the
/// store. Otherwise the email is looked up: a lookup error or a missing user
/// both yield `exists: false` with `status: "okay"`, and a hit yields the user.
pub async fn verify_response(
    error: Option<String>,
    email: &str,
    users: &dyn UserStore,
) -> AuthResponse {
    if let Some(reason) = error {
        return AuthResponse::Failure { reason };
    }

    match users.find_by_email(email).await {
        Ok(Some(user)) => AuthResponse::KnownUser {
            user,
            email: email.to_string(),
        },
        Ok(None) => AuthResponse::UnknownUser {
            email: email.to_string(),
            error: None,
        },
        Err(e) => {
            log::warn!("User lookup for {email} failed: {e}");
            AuthResponse::UnknownUser {
                email: email.to_string(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Build the logout payload, dropping the identity fields from the session
///
/// The session is cleared whether or not `error` is set.
pub fn logout_response(error: Option<String>, session: Option<&mut LoginSession>) -> AuthResponse {
    if let Some(session) = session {
        session.clear_identity();
    }

    match error {
        Some(reason) => AuthResponse::Failure { reason },
        None => AuthResponse::Okay,
    }
}
