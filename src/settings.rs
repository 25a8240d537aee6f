use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;

/// Default Persona remote verification endpoint
pub const DEFAULT_VERIFIER_URL: &str = "https://verifier.login.persona.org/verify";

/// Session cookie max age: 31 days in milliseconds
pub const DEFAULT_SESSION_MAX_AGE_MS: u64 = 2_678_400_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginSettings {
    pub application: ApplicationSettings,
    pub persona: PersonaSettings,
    pub static_files: StaticFilesSettings,
    pub session: SessionSettings,
    pub locale: LocaleSettings,
    pub user_store: UserStoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
    /// Mirrors `NODE_ENV`; anything other than "development" is treated as production
    pub environment: String,
    /// Enables HSTS, secure cookies and proxy-aware scheme detection
    pub force_ssl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaSettings {
    /// Expected audience of incoming assertions (scheme://host:port)
    pub audience: String,
    pub verifier_url: String,
    pub verifier_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticFilesSettings {
    pub public_folder: String,
    /// Pre-built stylesheets and other generated assets, served after `public_folder`
    pub compiled_assets_folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub session_secret: String,
    pub max_age_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSettings {
    pub supported_languages: Vec<String>,
    pub default_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStoreSettings {
    /// JSON file holding an array of user documents
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: "http://localhost:3000".to_string(),
            environment: "development".to_string(),
            force_ssl: false,
        }
    }
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            audience: "http://localhost:3000".to_string(),
            verifier_url: DEFAULT_VERIFIER_URL.to_string(),
            verifier_timeout_seconds: 10,
        }
    }
}

impl Default for StaticFilesSettings {
    fn default() -> Self {
        Self {
            public_folder: "public".to_string(),
            compiled_assets_folder: "public/compiled".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "login.sid".to_string(),
            session_secret: String::new(), // Will be generated if empty
            max_age_ms: DEFAULT_SESSION_MAX_AGE_MS,
        }
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            supported_languages: vec!["en-US".to_string(), "th-TH".to_string()],
            default_lang: "en_US".to_string(),
        }
    }
}

impl Default for UserStoreSettings {
    fn default() -> Self {
        Self {
            path: "users.json".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoginSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment initialization fails
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::initialize_environment()?;

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Ok(settings)
    }

    /// Initialize environment and logging
    ///
    /// # Errors
    ///
    /// Returns an error if logger initialization fails
    fn initialize_environment() -> Result<(), Box<dyn std::error::Error>> {
        Self::load_env_file();
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `LOGIN_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            let toml_content = fs::read_to_string(&default_config_path)?;
            settings = basic_toml::from_str(&toml_content)?;
            log::info!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("LOGIN_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                let secrets_toml_content = fs::read_to_string(&secrets_path)?;
                settings = basic_toml::from_str(&secrets_toml_content)?;
                log::info!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ℹ LOGIN_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_persona_env_overrides(&mut settings.persona);
        Self::apply_static_files_env_overrides(&mut settings.static_files);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_user_store_env_overrides(&mut settings.user_store);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    /// Apply environment overrides for application settings
    pub fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
        if let Ok(environment) = std::env::var("NODE_ENV") {
            app_settings.environment = environment;
        }
        if let Ok(force_ssl) = std::env::var("FORCE_SSL") {
            app_settings.force_ssl = parse_flag(&force_ssl);
        }
    }

    /// Apply environment overrides for Persona settings
    pub fn apply_persona_env_overrides(persona_settings: &mut PersonaSettings) {
        if let Some(audience) = ["AUDIENCE", "audience"]
            .iter()
            .find_map(|name| std::env::var(name).ok())
        {
            persona_settings.audience = audience;
        }
        if let Ok(verifier_url) = std::env::var("PERSONA_VERIFIER_URL") {
            persona_settings.verifier_url = verifier_url;
        }
    }

    /// Apply environment overrides for static files settings
    fn apply_static_files_env_overrides(static_settings: &mut StaticFilesSettings) {
        if let Ok(public_folder) = std::env::var("STATIC_FOLDER_PATH") {
            static_settings.public_folder = public_folder;
        }
        if let Ok(compiled) = std::env::var("COMPILED_ASSETS_PATH") {
            static_settings.compiled_assets_folder = compiled;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    fn apply_user_store_env_overrides(store_settings: &mut UserStoreSettings) {
        if let Ok(path) = std::env::var("USER_STORE_PATH") {
            store_settings.path = path;
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Generate a cryptographically secure random session secret
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        log::warn!("⚠️  Using auto-generated session secret");
        log::warn!("🔒 For production use, set the SESSION_SECRET environment variable");
        log::warn!("   or configure session_secret in Settings.toml");
        log::warn!("💡 Sessions will not survive a restart unless a secret is configured");
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Whether the server runs with development conveniences (detailed error bodies)
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.application.environment == "development"
    }
}

/// Interpret an environment flag; unset-like values are false, anything else is true
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_env_vars() {
        for name in [
            "SESSION_SECRET",
            "PORT",
            "NODE_ENV",
            "FORCE_SSL",
            "AUDIENCE",
            "audience",
            "PERSONA_VERIFIER_URL",
            "LOGIN_SECRETS_DIR",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = LoginSettings::default();
        assert_eq!(settings.session.cookie_name, "login.sid");
        assert_eq!(settings.session.max_age_ms, 2_678_400_000);
        assert_eq!(settings.session.session_secret, "");
        assert_eq!(
            settings.locale.supported_languages,
            vec!["en-US".to_string(), "th-TH".to_string()]
        );
        assert_eq!(settings.locale.default_lang, "en_US");
        assert_eq!(settings.persona.verifier_url, DEFAULT_VERIFIER_URL);
        assert!(!settings.application.force_ssl);
        assert!(settings.is_development());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("FALSE"));
        assert!(!parse_flag(" off "));
    }

    #[test]
    #[serial]
    fn test_application_env_overrides() {
        clean_env_vars();
        std::env::set_var("PORT", "8081");
        std::env::set_var("NODE_ENV", "production");
        std::env::set_var("FORCE_SSL", "true");

        let mut app = ApplicationSettings::default();
        LoginSettings::apply_application_env_overrides(&mut app);

        assert_eq!(app.port, 8081);
        assert_eq!(app.environment, "production");
        assert!(app.force_ssl);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_ignored() {
        clean_env_vars();
        std::env::set_var("PORT", "not-a-port");

        let mut app = ApplicationSettings::default();
        LoginSettings::apply_application_env_overrides(&mut app);
        assert_eq!(app.port, 3000);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_audience_env_override() {
        clean_env_vars();
        std::env::set_var("audience", "https://login.example.org");

        let mut persona = PersonaSettings::default();
        LoginSettings::apply_persona_env_overrides(&mut persona);
        assert_eq!(persona.audience, "https://login.example.org");

        std::env::set_var("AUDIENCE", "https://upper.example.org");
        LoginSettings::apply_persona_env_overrides(&mut persona);
        assert_eq!(persona.audience, "https://upper.example.org");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_secret_env_override() {
        clean_env_vars();
        let mut session = SessionSettings {
            session_secret: "configured".to_string(),
            ..Default::default()
        };

        std::env::set_var("SESSION_SECRET", "from-env");
        LoginSettings::apply_session_env_overrides(&mut session);
        assert_eq!(session.session_secret, "from-env");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_secret_auto_generation() {
        clean_env_vars();

        let mut first = SessionSettings::default();
        LoginSettings::apply_session_env_overrides(&mut first);
        let mut second = SessionSettings::default();
        LoginSettings::apply_session_env_overrides(&mut second);

        // Base64 of 32 bytes is 44 characters
        assert_eq!(first.session_secret.len(), 44);
        assert_ne!(first.session_secret, second.session_secret);

        clean_env_vars();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: LoginSettings = basic_toml::from_str(
            r#"
            [application]
            port = 9000
            force_ssl = true

            [persona]
            audience = "https://login.example.org"
            "#,
        )
        .unwrap();

        assert_eq!(settings.application.port, 9000);
        assert!(settings.application.force_ssl);
        assert_eq!(settings.application.host, "0.0.0.0");
        assert_eq!(settings.persona.audience, "https://login.example.org");
        assert_eq!(settings.persona.verifier_url, DEFAULT_VERIFIER_URL);
        assert_eq!(settings.session.cookie_name, "login.sid");
    }

    #[test]
    fn test_cors_origins() {
        let mut settings = LoginSettings::default();
        settings.application.cors_origins = "https://a.org, https://b.org,".to_string();
        assert_eq!(
            settings.get_cors_origins(),
            vec!["https://a.org".to_string(), "https://b.org".to_string()]
        );
    }
}
