//! CSRF protection for the identity endpoints
//!
//! The token lives in the session under `_csrf`. State-changing requests must
//! echo it back in the body, the query string or an `X-CSRF-Token` /
//! `X-XSRF-Token` header.

use actix_web::{http::Method, web, HttpRequest};
use serde::Deserialize;
use thiserror::Error;

use super::data::{LoginSession, CSRF_KEY};
use crate::utils::crypto::{constant_time_eq, generate_csrf_token};

/// Request headers checked for a CSRF token, in order
pub const CSRF_HEADERS: [&str; 2] = ["x-csrf-token", "x-xsrf-token"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsrfError {
    #[error("missing CSRF token")]
    Missing,
    #[error("invalid CSRF token")]
    Mismatch,
}

#[derive(Deserialize)]
struct CsrfQuery {
    #[serde(rename = "_csrf")]
    csrf: Option<String>,
}

/// Return the session's CSRF token, creating one if needed
pub fn ensure_token(session: &mut LoginSession) -> String {
    if let Some(token) = session.get(CSRF_KEY) {
        return token.to_string();
    }
    let token = generate_csrf_token();
    session.insert(CSRF_KEY, token.clone());
    token
}

/// Check the request's CSRF token against the session
///
/// Safe methods pass unchecked. A session without a token gains one in memory
/// only: the rejected request writes no cookie, so clients must first fetch a
/// token from `GET /persona/csrf`.
///
/// # Errors
///
/// Returns [`CsrfError::Missing`] when the request carries no token and
/// [`CsrfError::Mismatch`] when it does not match the session's.
pub fn verify_request(
    req: &HttpRequest,
    session: &mut LoginSession,
    body_token: Option<&str>,
) -> Result<(), CsrfError> {
    if is_safe_method(req.method()) {
        return Ok(());
    }

    let expected = ensure_token(session);
    let provided = request_token(req, body_token).ok_or(CsrfError::Missing)?;

    if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(CsrfError::Mismatch)
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn request_token(req: &HttpRequest, body_token: Option<&str>) -> Option<String> {
    if let Some(token) = body_token.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    if let Some(token) = web::Query::<CsrfQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().csrf)
        .filter(|t| !t.is_empty())
    {
        return Some(token);
    }

    CSRF_HEADERS.iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .filter(|t| !t.is_empty())
            .map(ToString::to_string)
    })
}
