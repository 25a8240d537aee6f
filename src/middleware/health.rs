use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, HttpResponse,
};
use log::warn;
use serde_json::json;

use crate::persona::AuthContext;

/// Path that stays reachable while the user store is down
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

/// Middleware: refuse requests with 503 while the user store is unavailable
///
/// The health endpoint itself is let through so it can report the outage.
///
/// # Errors
///
/// Propagates errors from the wrapped service.
pub async fn require_user_store(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let available = req
        .app_data::<web::Data<AuthContext>>()
        .map_or(true, |ctx| ctx.users().is_available());

    if available || req.path() == HEALTHCHECK_PATH {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }

    warn!("Rejecting {} {}: user store unavailable", req.method(), req.path());
    let response = HttpResponse::ServiceUnavailable().json(json!({
        "error": "service_unavailable",
        "message": "The user store is unavailable"
    }));
    Ok(req.into_response(response).map_into_right_body())
}
