use actix_web::{
    dev::ServiceResponse,
    http::{header, StatusCode},
    middleware::{ErrorHandlerResponse, ErrorHandlers},
    HttpResponse, Result,
};
use log::error;
use serde_json::json;

/// Error handlers used outside development: 5xx bodies are replaced with a
/// generic payload so internal details never reach clients
///
/// 503 is left alone; the user store health gate owns that body.
#[must_use]
pub fn generic_server_errors<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .default_handler_server(replace_server_error)
        .handler(StatusCode::SERVICE_UNAVAILABLE, keep_response)
}

#[allow(clippy::unnecessary_wraps)]
fn keep_response<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    Ok(ErrorHandlerResponse::Response(res.map_into_left_body()))
}

fn replace_server_error<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let (req, original) = res.into_parts();
    error!(
        "Server error {} on {} {}",
        original.status().as_u16(),
        req.method(),
        req.path()
    );

    let mut response = HttpResponse::build(original.status()).json(json!({
        "error": "server_error",
        "message": "An internal server error occurred"
    }));
    if let Some(value) = original.headers().get(header::SET_COOKIE) {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, value.clone());
    }

    let res = ServiceResponse::new(req, response)
        .map_into_boxed_body()
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    async fn explode() -> HttpResponse {
        HttpResponse::InternalServerError().body("stack trace with secrets")
    }

    #[actix_web::test]
    async fn test_server_error_body_is_replaced() {
        let app = test::init_service(
            App::new()
                .wrap(generic_server_errors())
                .route("/", web::get().to(explode)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "server_error");
        assert!(!body.to_string().contains("secrets"));
    }

    async fn bad_gateway() -> HttpResponse {
        HttpResponse::BadGateway().body("upstream said: secret")
    }

    async fn unavailable() -> HttpResponse {
        HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
    }

    #[actix_web::test]
    async fn test_other_server_errors_replaced_except_unavailable() {
        let app = test::init_service(
            App::new()
                .wrap(generic_server_errors())
                .route("/gateway", web::get().to(bad_gateway))
                .route("/unavailable", web::get().to(unavailable)),
        )
        .await;

        let req = test::TestRequest::get().uri("/gateway").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "server_error");

        let req = test::TestRequest::get().uri("/unavailable").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "status": "unavailable" }));
    }
}
