// Centralized logging for startup and configuration summaries
use log::{info, warn};

use crate::settings::LoginSettings;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the listening address and runtime mode
    pub fn log_startup(bind_address: &str, settings: &LoginSettings) {
        info!("🚀 Starting Persona login server on http://{bind_address}");
        info!(
            "Environment: {} (force SSL: {})",
            settings.application.environment, settings.application.force_ssl
        );
        info!("Log level: {}", settings.logging.level);
        if settings.application.force_ssl {
            info!("🔒 HSTS enabled, session cookies marked Secure");
        }
    }

    /// Log the Persona verifier configuration
    pub fn log_persona_config(settings: &LoginSettings) {
        info!("🔍 Persona verifier: {}", settings.persona.verifier_url);
        if settings.persona.audience.is_empty() {
            warn!("❌ No Persona audience configured; every assertion will be rejected");
        } else {
            info!("🎯 Expected audience: {}", settings.persona.audience);
        }
    }

    /// Log the user store state
    pub fn log_user_store(store_name: &str, path: &str, available: bool) {
        if available {
            info!("✅ {store_name} user store loaded from {path}");
        } else {
            warn!("❌ {store_name} user store at {path} is unavailable; serving 503");
        }
    }

    /// Log the locale configuration
    pub fn log_locales(supported: &[String], default_lang: &str) {
        info!("🌐 Supported languages: {supported:?} (default {default_lang})");
    }

    /// Log the registered endpoints
    pub fn log_endpoints(settings: &LoginSettings) {
        info!("Persona endpoints:");
        info!("  POST /persona/verify  - Verify an identity assertion");
        info!("  POST /persona/logout  - Clear the signed-in identity");
        info!("  GET  /persona/csrf    - Fetch the session CSRF token");
        info!("System endpoints:");
        info!("  GET  /healthcheck     - Health check");
        info!(
            "  GET  /*               - Static files from {} and {}",
            settings.static_files.public_folder, settings.static_files.compiled_assets_folder
        );
    }
}
