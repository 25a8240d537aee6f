#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    middleware::{from_fn, Condition, Logger},
    web, App, HttpServer,
};
use personars::{
    handlers::configure_services,
    middleware::{generic_server_errors, hsts, negotiate_locale, require_user_store, LocaleNegotiator},
    persona::{AuthContext, RemoteVerifier},
    session::SessionManager,
    settings::LoginSettings,
    users::{JsonFileUserStore, UserStore},
    utils::LoggingHelper,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = LoginSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let verifier = RemoteVerifier::from_settings(&settings.persona)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize verifier: {e}")))?;

    let users = JsonFileUserStore::open(&settings.user_store.path);
    LoggingHelper::log_user_store(
        users.store_name(),
        &settings.user_store.path,
        users.is_available(),
    );

    let auth = AuthContext::new(&settings.persona.audience, Arc::new(verifier), Arc::new(users));
    start_server(auth, settings).await
}

/// Start the server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(auth: AuthContext, settings: LoginSettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    LoggingHelper::log_startup(&bind_address, &settings);
    LoggingHelper::log_persona_config(&settings);

    let session_manager = SessionManager::from_settings(&settings);
    let locales = LocaleNegotiator::from_settings(&settings.locale);
    LoggingHelper::log_locales(locales.supported(), &settings.locale.default_lang);
    LoggingHelper::log_endpoints(&settings);

    let cors_origins = settings.get_cors_origins();
    let force_ssl = settings.application.force_ssl;
    let production = !settings.is_development();

    let auth = web::Data::new(auth);
    let session_manager = web::Data::new(session_manager);
    let locales = web::Data::new(locales);
    let settings = web::Data::new(settings);

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                "Content-Type",
                "Accept",
                "X-CSRF-Token",
                "X-XSRF-Token",
            ])
            .supports_credentials()
            .max_age(3600);

        // Last wrapped runs first: errors, health gate, CORS, logging, HSTS, locale
        App::new()
            .app_data(auth.clone())
            .app_data(session_manager.clone())
            .app_data(locales.clone())
            .app_data(settings.clone())
            .wrap(from_fn(negotiate_locale))
            .wrap(Condition::new(force_ssl, hsts()))
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(from_fn(require_user_store))
            .wrap(Condition::new(production, generic_server_errors()))
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}
