use crate::middleware::Locale;
use crate::models::HealthResponse;
use crate::persona::AuthContext;
use crate::settings::LoginSettings;
use actix_web::{http::header, http::Method, web, HttpRequest, HttpResponse, Result};
use log::debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Health check endpoint
///
/// Answers 503 while the user store is unavailable.
///
/// # Errors
/// Returns an error if health status cannot be determined
pub async fn health(auth: web::Data<AuthContext>) -> Result<HttpResponse> {
    let user_store = auth.users().is_available();
    let response = HealthResponse {
        status: if user_store { "ok" } else { "unavailable" }.to_string(),
        message: format!(
            "Persona login server is running ({} user store {})",
            auth.users().store_name(),
            if user_store { "available" } else { "unavailable" }
        ),
        user_store,
    };

    if user_store {
        Ok(HttpResponse::Ok().json(response))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(response))
    }
}

/// Serve static files from the public folder, then the compiled asset folder
///
/// Used as the default service, so anything not routed lands here.
///
/// # Errors
///
/// Returns an error if the response cannot be built
pub async fn serve_static(
    req: HttpRequest,
    locale: Locale,
    settings: web::Data<LoginSettings>,
) -> Result<HttpResponse> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(not_found());
    }

    let Some(relative) = safe_relative_path(req.path()) else {
        debug!("Rejected static path: {}", req.path());
        return Ok(not_found());
    };

    let folders = [
        &settings.static_files.public_folder,
        &settings.static_files.compiled_assets_folder,
    ];
    let found = folders.iter().find_map(|folder| {
        let file_path = Path::new(folder.as_str()).join(&relative);
        debug!("Attempting to serve static file: {}", file_path.display());
        fs::read(&file_path).ok().map(|contents| (file_path, contents))
    });

    Ok(found.map_or_else(
        || {
            debug!("Static file not found: {}", relative.display());
            not_found()
        },
        |(file_path, contents)| {
            HttpResponse::Ok()
                .content_type(content_type_for(&file_path))
                .insert_header((header::CONTENT_LANGUAGE, locale.lang))
                .body(contents)
        },
    ))
}

/// Map a request path to a relative file path, refusing traversal
///
/// `/` maps to `index.html`.
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_start_matches('/');
    let trimmed = if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{trimmed}index.html")
    } else {
        trimmed.to_string()
    };

    let relative = PathBuf::from(trimmed);
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then_some(relative)
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "text/plain",
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "not_found",
        "message": "File not found"
    }))
}
