//! HTTP endpoints wrapping the Persona verify and logout handlers
//!
//! Each endpoint loads the cookie session, checks CSRF, runs the handler and
//! writes the payload together with the re-encoded session cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::models::UserRecord;
use crate::persona::{logout_response, verify_response, AssertionResult, AuthContext};
use crate::session::{ensure_token, verify_request, LoginSession, SessionManager, USERNAME_KEY};

/// Body of `POST /persona/verify`, as JSON or form data
#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    pub assertion: Option<String>,
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

/// Body of `POST /persona/logout`
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(rename = "_csrf")]
    pub csrf: Option<String>,
}

type JsonOrForm<T> = web::Either<web::Json<T>, web::Form<T>>;

/// Reason reported when the request carries no assertion
pub const NEED_ASSERTION: &str = "need assertion";

/// Verify a Persona assertion and report whether the email has an account
///
/// # Errors
///
/// Returns an error if:
/// - The CSRF token is missing or wrong
/// - The session cookie cannot be encrypted
pub async fn persona_verify(
    req: HttpRequest,
    body: Option<JsonOrForm<VerifyRequest>>,
    auth: web::Data<AuthContext>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let body = body.map(|body| body.into_inner()).unwrap_or_default();
    let mut session = session_manager.load(&req);
    verify_request(&req, &mut session, body.csrf.as_deref())?;

    let result = match body.assertion.as_deref().filter(|a| !a.is_empty()) {
        Some(assertion) => AssertionResult::from_outcome(
            auth.verifier().verify(assertion, auth.audience()).await,
        ),
        None => AssertionResult {
            verified: false,
            email: String::new(),
            error: Some(NEED_ASSERTION.to_string()),
        },
    };

    if result.verified {
        info!("Verified Persona assertion for {}", result.email);
        session.set_email(&result.email);
    } else {
        debug!(
            "Persona verification failed: {}",
            result.error.as_deref().unwrap_or_default()
        );
    }

    let payload = verify_response(result.error, &result.email, auth.users()).await;
    if let Some(username) = payload.user().and_then(UserRecord::username) {
        session.insert(USERNAME_KEY, username);
    }
    respond(&req, &session_manager, &session, &payload)
}

/// Sign the session out
///
/// # Errors
///
/// Returns an error if:
/// - The CSRF token is missing or wrong
/// - The session cookie cannot be encrypted
pub async fn persona_logout(
    req: HttpRequest,
    body: Option<JsonOrForm<LogoutRequest>>,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let body = body.map(|body| body.into_inner()).unwrap_or_default();
    let mut session = session_manager.load(&req);
    verify_request(&req, &mut session, body.csrf.as_deref())?;

    if let Some(email) = session.email() {
        info!("Logging out {email}");
    }
    let payload = logout_response(None, Some(&mut session));
    respond(&req, &session_manager, &session, &payload)
}

/// Hand out the session's CSRF token, creating one if needed
///
/// # Errors
///
/// Returns an error if the session cookie cannot be encrypted
pub async fn csrf_token(
    req: HttpRequest,
    session_manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_manager.load(&req);
    let token = ensure_token(&mut session);
    respond(&req, &session_manager, &session, &json!({ "csrf": token }))
}

fn respond<T: Serialize>(
    req: &HttpRequest,
    session_manager: &SessionManager,
    session: &LoginSession,
    payload: &T,
) -> Result<HttpResponse, AppError> {
    let mut response = HttpResponse::Ok();
    if let Some(cookie) = session_manager
        .session_cookie(session, req)
        .map_err(AppError::Session)?
    {
        response.cookie(cookie);
    }
    Ok(response.json(payload))
}
