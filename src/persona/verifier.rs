//! Persona assertion verification
//!
//! The remote verifier receives `{assertion, audience}` and answers with
//! either `{status: "okay", email, audience, expires, issuer}` or
//! `{status: "failure", reason}`.

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::settings::PersonaSettings;

/// Outcome of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub issuer: Option<String>,
    pub expires: Option<i64>,
}

/// Verification failures; the display text is what clients see as `reason`
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The verifier rejected the assertion; carries its reason verbatim
    #[error("{0}")]
    Rejected(String),
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("verifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("verifier returned HTTP {0}")]
    Status(u16),
    #[error("verifier response was invalid: {0}")]
    InvalidResponse(String),
    #[error("invalid verifier URL: {0}")]
    Configuration(String),
}

/// Identity assertion result as handed to the verify handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub verified: bool,
    pub email: String,
    pub error: Option<String>,
}

impl AssertionResult {
    #[must_use]
    pub fn from_outcome(outcome: Result<VerifiedIdentity, VerificationError>) -> Self {
        match outcome {
            Ok(identity) => Self {
                verified: true,
                email: identity.email,
                error: None,
            },
            Err(e) => Self {
                verified: false,
                email: String::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

/// Turns an assertion into a verified identity
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `assertion` for `audience`
    ///
    /// # Errors
    ///
    /// Returns an error if the assertion is rejected or the verifier cannot be reached.
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerificationError>;
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    assertion: &'a str,
    audience: &'a str,
}

#[derive(Deserialize, Debug)]
struct VerifierReply {
    status: String,
    email: Option<String>,
    audience: Option<String>,
    expires: Option<i64>,
    issuer: Option<String>,
    reason: Option<String>,
}

/// Verifier backed by the remote Persona verification service
#[derive(Clone)]
pub struct RemoteVerifier {
    http_client: reqwest::Client,
    verifier_url: url::Url,
}

impl RemoteVerifier {
    /// Create a verifier posting to `verifier_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or the HTTP client cannot be built
    pub fn new(verifier_url: &str, timeout: Duration) -> Result<Self, VerificationError> {
        let verifier_url = url::Url::parse(verifier_url)
            .map_err(|e| VerificationError::Configuration(format!("{verifier_url}: {e}")))?;
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            verifier_url,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the configured verifier URL is invalid
    pub fn from_settings(settings: &PersonaSettings) -> Result<Self, VerificationError> {
        Self::new(
            &settings.verifier_url,
            Duration::from_secs(settings.verifier_timeout_seconds),
        )
    }

    #[must_use]
    pub fn verifier_url(&self) -> &url::Url {
        &self.verifier_url
    }
}

#[async_trait]
impl IdentityVerifier for RemoteVerifier {
    async fn verify(
        &self,
        assertion: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerificationError> {
        debug!("Verifying assertion with {}", self.verifier_url);

        let response = self
            .http_client
            .post(self.verifier_url.clone())
            .json(&VerifyRequest {
                assertion,
                audience,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let reply: VerifierReply = serde_json::from_str(&body)
            .map_err(|e| VerificationError::InvalidResponse(e.to_string()))?;

        let identity = interpret_reply(reply, audience)?;
        info!("Persona verified {}", identity.email);
        Ok(identity)
    }
}

fn interpret_reply(
    reply: VerifierReply,
    expected_audience: &str,
) -> Result<VerifiedIdentity, VerificationError> {
    if reply.status != "okay" {
        return Err(VerificationError::Rejected(
            reply
                .reason
                .unwrap_or_else(|| format!("verifier status {}", reply.status)),
        ));
    }

    if let Some(audience) = reply.audience.as_deref() {
        if audience != expected_audience {
            return Err(VerificationError::AudienceMismatch);
        }
    }

    let email = reply
        .email
        .filter(|email| !email.is_empty())
        .ok_or_else(|| VerificationError::InvalidResponse("missing email".to_string()))?;

    Ok(VerifiedIdentity {
        email,
        issuer: reply.issuer,
        expires: reply.expires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{dev::ServerHandle, web, App, HttpResponse, HttpServer};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    const AUDIENCE: &str = "https://login.example.org";

    #[derive(Clone, Copy)]
    enum Reply {
        ServerError,
        NotJson,
        Okay,
    }

    type SeenBody = web::Data<Mutex<Option<Value>>>;

    async fn fake_verifier(
        body: web::Json<Value>,
        reply: web::Data<Reply>,
        seen: SeenBody,
    ) -> HttpResponse {
        let audience = body["audience"].clone();
        *seen.lock().unwrap() = Some(body.into_inner());
        match *reply.get_ref() {
            Reply::ServerError => HttpResponse::InternalServerError().finish(),
            Reply::NotJson => HttpResponse::Ok().body("<html>oops</html>"),
            Reply::Okay => HttpResponse::Ok().json(json!({
                "status": "okay",
                "email": "a@example.com",
                "audience": audience,
                "issuer": "login.persona.org",
                "expires": 1_700_000_000_000_i64
            })),
        }
    }

    /// Run a local verifier answering with `reply`; returns its URL
    fn start_verifier(reply: Reply) -> (String, SeenBody, ServerHandle) {
        let seen: SeenBody = web::Data::new(Mutex::new(None));
        let server_seen = seen.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(reply))
                .app_data(server_seen.clone())
                .route("/verify", web::post().to(fake_verifier))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{addr}/verify"), seen, handle)
    }

    fn remote(url: &str) -> RemoteVerifier {
        RemoteVerifier::new(url, Duration::from_secs(5)).unwrap()
    }

    #[actix_web::test]
    async fn test_remote_okay_posts_assertion_and_audience() {
        let (url, seen, handle) = start_verifier(Reply::Okay);

        let identity = remote(&url).verify("a.b.c", AUDIENCE).await.unwrap();
        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.issuer.as_deref(), Some("login.persona.org"));
        assert_eq!(
            seen.lock().unwrap().take(),
            Some(json!({ "assertion": "a.b.c", "audience": AUDIENCE }))
        );

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_remote_server_error_reports_status() {
        let (url, _, handle) = start_verifier(Reply::ServerError);

        let err = remote(&url).verify("a.b.c", AUDIENCE).await.unwrap_err();
        assert!(matches!(err, VerificationError::Status(500)));
        assert_eq!(err.to_string(), "verifier returned HTTP 500");

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_remote_non_json_body_is_invalid() {
        let (url, _, handle) = start_verifier(Reply::NotJson);

        let err = remote(&url).verify("a.b.c", AUDIENCE).await.unwrap_err();
        assert!(matches!(err, VerificationError::InvalidResponse(_)));

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_remote_unreachable_is_transport_error() {
        let port = std::net::TcpListener::bind(("127.0.0.1", 0))
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let err = remote(&format!("http://127.0.0.1:{port}/verify"))
            .verify("a.b.c", AUDIENCE)
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::Transport(_)));
    }

    fn reply(json: &str) -> VerifierReply {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_okay_reply() {
        let identity = interpret_reply(
            reply(
                r#"{"status":"okay","email":"a@example.com","audience":"https://login.example.org","expires":1700000000000,"issuer":"login.persona.org"}"#,
            ),
            "https://login.example.org",
        )
        .unwrap();

        assert_eq!(identity.email, "a@example.com");
        assert_eq!(identity.issuer.as_deref(), Some("login.persona.org"));
        assert_eq!(identity.expires, Some(1_700_000_000_000));
    }

    #[test]
    fn test_failure_reply_keeps_reason() {
        let err = interpret_reply(
            reply(r#"{"status":"failure","reason":"assertion has expired"}"#),
            "https://login.example.org",
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "assertion has expired");
    }

    #[test]
    fn test_failure_reply_without_reason() {
        let err = interpret_reply(reply(r#"{"status":"weird"}"#), "x").unwrap_err();
        assert_eq!(err.to_string(), "verifier status weird");
    }

    #[test]
    fn test_audience_mismatch() {
        let err = interpret_reply(
            reply(r#"{"status":"okay","email":"a@example.com","audience":"https://evil.example"}"#),
            "https://login.example.org",
        )
        .unwrap_err();

        assert!(matches!(err, VerificationError::AudienceMismatch));
    }

    #[test]
    fn test_okay_without_email_is_invalid() {
        let err = interpret_reply(reply(r#"{"status":"okay"}"#), "x").unwrap_err();
        assert!(matches!(err, VerificationError::InvalidResponse(_)));
    }

    #[test]
    fn test_assertion_result_from_outcome() {
        let ok = AssertionResult::from_outcome(Ok(VerifiedIdentity {
            email: "a@example.com".to_string(),
            issuer: None,
            expires: None,
        }));
        assert!(ok.verified);
        assert_eq!(ok.error, None);

        let failed =
            AssertionResult::from_outcome(Err(VerificationError::Rejected("timeout".to_string())));
        assert!(!failed.verified);
        assert_eq!(failed.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_invalid_verifier_url() {
        assert!(matches!(
            RemoteVerifier::new("not a url", Duration::from_secs(1)),
            Err(VerificationError::Configuration(_))
        ));
        let verifier =
            RemoteVerifier::new("https://verifier.example.org/verify", Duration::from_secs(1))
                .unwrap();
        assert_eq!(verifier.verifier_url().path(), "/verify");
    }
}
