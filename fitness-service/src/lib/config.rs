use std::env;

use auth::AuthSettings;
use auth::SettingsError;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "fitness_service=info,auth=info,tower_http=info";

/// Run mode used when `RUN_MODE` is not set.
pub const DEFAULT_RUN_MODE: &str = "production";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_algorithm() -> String {
    AuthSettings::DEFAULT_ALGORITHM.to_string()
}

fn default_access_token_ttl_minutes() -> i64 {
    AuthSettings::DEFAULT_ACCESS_TOKEN_TTL_MINUTES
}

fn default_reset_token_ttl_minutes() -> i64 {
    AuthSettings::DEFAULT_RESET_TOKEN_TTL_MINUTES
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"[redacted]")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("reset_token_ttl_minutes", &self.reset_token_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    /// Validate into the settings consumed by the authentication core.
    ///
    /// # Errors
    /// * `SecretTooShort` - Secret shorter than 32 bytes
    /// * `UnsupportedAlgorithm` - Not one of HS256, HS384, HS512
    /// * `NonPositiveTtl` / `TtlOutOfRange` / `ResetTtlNotShorter` - Invalid token lifetimes
    pub fn to_settings(&self) -> Result<AuthSettings, SettingsError> {
        AuthSettings::from_minutes(
            self.secret.as_bytes(),
            &self.algorithm,
            self.access_token_ttl_minutes,
            self.reset_token_ttl_minutes,
        )
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, AUTH__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// Only `config/development.toml` carries a signing secret; any other
    /// run mode, including an unset one, fails to load unless `AUTH__SECRET`
    /// is set.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| DEFAULT_RUN_MODE.to_string());
        Self::load_for(&run_mode)
    }

    /// Same as [`Config::load`] for an explicit run mode.
    pub fn load_for(run_mode: &str) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: AUTH__SECRET=... overrides auth.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
