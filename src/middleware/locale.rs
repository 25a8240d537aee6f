//! Locale negotiation
//!
//! A supported language as the first path segment (`/th-TH/...`) wins and is
//! stripped before routing. Otherwise `Accept-Language` is consulted, then the
//! configured default.

use actix_web::{
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::{
        header::ACCEPT_LANGUAGE,
        uri::{PathAndQuery, Uri},
    },
    middleware::Next,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use log::info;
use std::future::{ready, Ready};

use crate::settings::LocaleSettings;

/// The negotiated language for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// BCP 47 style tag, e.g. `en-US`
    pub lang: String,
    /// POSIX style name, e.g. `en_US`
    pub locale: String,
}

impl Locale {
    #[must_use]
    pub fn new(lang: &str) -> Self {
        let lang = language_tag(lang);
        Self {
            locale: locale_name(&lang),
            lang,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl FromRequest for Locale {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(req.extensions().get::<Self>().cloned().unwrap_or_default()))
    }
}

/// Normalize `en_us` / `EN-us` / `en-US` to `en-US`
#[must_use]
pub fn language_tag(tag: &str) -> String {
    let mut parts = tag.trim().splitn(2, ['-', '_']);
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    match parts.next() {
        Some(region) if !region.is_empty() => format!("{language}-{}", region.to_ascii_uppercase()),
        _ => language,
    }
}

/// Convert a language tag to its locale name: `en-US` becomes `en_US`
#[must_use]
pub fn locale_name(lang: &str) -> String {
    language_tag(lang).replace('-', "_")
}

fn primary_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Picks the language for each request from the supported set
#[derive(Debug, Clone)]
pub struct LocaleNegotiator {
    supported: Vec<String>,
    default_lang: String,
}

impl LocaleNegotiator {
    #[must_use]
    pub fn new(supported: &[String], default_lang: &str) -> Self {
        Self {
            supported: supported.iter().map(|tag| language_tag(tag)).collect(),
            default_lang: language_tag(default_lang),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &LocaleSettings) -> Self {
        Self::new(&settings.supported_languages, &settings.default_lang)
    }

    #[must_use]
    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// The supported tag equal to `tag`, ignoring case and separator style
    #[must_use]
    pub fn match_supported(&self, tag: &str) -> Option<&str> {
        let wanted = language_tag(tag);
        self.supported
            .iter()
            .find(|supported| **supported == wanted)
            .map(String::as_str)
    }

    /// Split a leading supported language off `path`
    ///
    /// Returns the language and the remaining path, which always starts with `/`.
    #[must_use]
    pub fn from_path(&self, path: &str) -> Option<(&str, String)> {
        let trimmed = path.strip_prefix('/')?;
        let (segment, rest) = trimmed
            .split_once('/')
            .map_or((trimmed, ""), |(segment, rest)| (segment, rest));
        let lang = self.match_supported(segment)?;
        Some((lang, format!("/{rest}")))
    }

    /// Best supported language for an `Accept-Language` header
    ///
    /// Candidates are ordered by quality; exact matches are preferred over
    /// primary-language matches (`th` picks `th-TH`).
    #[must_use]
    pub fn from_accept_language(&self, header: &str) -> Option<&str> {
        let candidates = parse_accept_language(header);

        candidates
            .iter()
            .find_map(|tag| self.match_supported(tag))
            .or_else(|| {
                candidates.iter().find_map(|tag| {
                    let primary = primary_language(tag).to_ascii_lowercase();
                    self.supported
                        .iter()
                        .find(|supported| primary_language(supported) == primary)
                        .map(String::as_str)
                })
            })
    }

    /// Negotiate the locale for a request path and `Accept-Language` header
    ///
    /// The second element is the path to route on when a locale prefix was stripped.
    #[must_use]
    pub fn negotiate(&self, path: &str, accept_language: Option<&str>) -> (Locale, Option<String>) {
        if let Some((lang, rest)) = self.from_path(path) {
            return (Locale::new(lang), Some(rest));
        }
        let lang = accept_language
            .and_then(|header| self.from_accept_language(header))
            .unwrap_or(self.default_lang.as_str());
        (Locale::new(lang), None)
    }
}

fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    // Stable sort keeps header order among equal weights
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

/// Middleware: negotiate the locale, strip a locale path prefix, and store
/// the [`Locale`] in request extensions
///
/// # Errors
///
/// Propagates errors from the wrapped service.
pub async fn negotiate_locale(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(negotiator) = req.app_data::<web::Data<LocaleNegotiator>>().cloned() {
        let accept_language = req
            .headers()
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        let (locale, stripped) = negotiator.negotiate(req.path(), accept_language.as_deref());
        if let Some(path) = stripped {
            rewrite_path(&mut req, &path);
        }

        info!("Using locale: {}", locale.lang);
        req.extensions_mut().insert(locale);
    }

    next.call(req).await
}

fn rewrite_path(req: &mut ServiceRequest, path: &str) {
    let path_and_query = match req.query_string() {
        "" => path.to_string(),
        query => format!("{path}?{query}"),
    };
    let Ok(path_and_query) = path_and_query.parse::<PathAndQuery>() else {
        return;
    };

    let mut parts = req.head().uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    if let Ok(uri) = Uri::from_parts(parts) {
        req.match_info_mut().get_mut().update(&uri);
        req.head_mut().uri = uri;
    }
}
