use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::session::CsrfError;

/// Errors surfaced by request handlers
///
/// Identity failures are not errors: they are reported in the JSON payload.
/// These cover the request being refused or the server failing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Csrf(#[from] CsrfError),
    #[error("failed to persist session: {0}")]
    Session(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Csrf(_) => StatusCode::FORBIDDEN,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            Self::Csrf(_) => "invalid_csrf_token",
            Self::Session(_) | Self::Internal(_) => "server_error",
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": error,
            "message": self.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn test_csrf_error_is_forbidden() {
        let err = AppError::from(CsrfError::Mismatch);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "invalid_csrf_token");
        assert_eq!(value["message"], "invalid CSRF token");
    }

    #[test]
    fn test_internal_errors_are_500() {
        let err = AppError::Session(anyhow::anyhow!("encryption failed"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "failed to persist session: encryption failed"
        );
    }
}
