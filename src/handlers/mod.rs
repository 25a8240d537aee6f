// HTTP request handlers for the login server
pub mod persona;
pub mod static_files;

use actix_web::web;

// Re-export the main handler functions
pub use persona::{csrf_token, persona_logout, persona_verify};
pub use static_files::{health, serve_static};

/// Register every route; static files are the fallback for anything else
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Persona identity endpoints
        .route("/persona/verify", web::post().to(persona_verify))
        .route("/persona/logout", web::post().to(persona_logout))
        .route("/persona/csrf", web::get().to(csrf_token))
        // Health endpoint
        .route(crate::middleware::HEALTHCHECK_PATH, web::get().to(health))
        .default_service(web::to(serve_static));
}
