use std::env;
use std::time::Duration;

use auth::HashParams;
use auth::MIN_SECRET_LEN;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::auth::models::Deadlines;
use crate::domain::auth::models::Lifetimes;
use crate::domain::session::models::ReapMode;

const MAX_TOKEN_HOURS: i64 = 24 * 365;
const MAX_RESET_MINUTES: i64 = 60 * 24 * 7;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub session: SessionConfig,
    pub timeouts: TimeoutConfig,
    pub password_reset: PasswordResetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Argon2id cost parameters
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub reaper_interval_secs: u64,
    pub reap_mode: ReapMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub store_ms: u64,
    pub hash_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordResetConfig {
    pub expiration_minutes: i64,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults for every tunable
    ///
    /// # Errors
    /// * `ConfigError` - Missing required key or a value rejected by `validate`
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = Self::with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        ConfigBuilder::builder()
            .set_default("database.max_connections", 5)?
            .set_default("server.http_port", 8080)?
            .set_default("jwt.expiration_hours", 24)?
            .set_default("jwt.issuer", auth::DEFAULT_ISSUER)?
            .set_default("password.memory_kib", 65536)?
            .set_default("password.iterations", 1)?
            .set_default("password.parallelism", 4)?
            .set_default("session.reaper_interval_secs", 3600)?
            .set_default("session.reap_mode", "deactivate")?
            .set_default("timeouts.store_ms", 5000)?
            .set_default("timeouts.hash_ms", 10000)?
            .set_default("password_reset.expiration_minutes", 60)
    }

    /// Reject values the service must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes, got {}",
                MIN_SECRET_LEN,
                self.jwt.secret.len()
            )));
        }
        if !(1..=MAX_TOKEN_HOURS).contains(&self.jwt.expiration_hours) {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_hours must be between 1 and {}",
                MAX_TOKEN_HOURS
            )));
        }
        if !(1..=MAX_RESET_MINUTES).contains(&self.password_reset.expiration_minutes) {
            return Err(ConfigError::Message(format!(
                "password_reset.expiration_minutes must be between 1 and {}",
                MAX_RESET_MINUTES
            )));
        }
        if self.timeouts.store_ms == 0 || self.timeouts.hash_ms == 0 {
            return Err(ConfigError::Message(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.session.reaper_interval_secs == 0 {
            return Err(ConfigError::Message(
                "session.reaper_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hash_params(&self) -> HashParams {
        HashParams {
            memory_kib: self.password.memory_kib,
            iterations: self.password.iterations,
            parallelism: self.password.parallelism,
        }
    }

    pub fn lifetimes(&self) -> Lifetimes {
        Lifetimes {
            token: chrono::Duration::hours(self.jwt.expiration_hours),
            password_reset: chrono::Duration::minutes(self.password_reset.expiration_minutes),
        }
    }

    pub fn deadlines(&self) -> Deadlines {
        Deadlines {
            store: Duration::from_millis(self.timeouts.store_ms),
            hash: Duration::from_millis(self.timeouts.hash_ms),
        }
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.session.reaper_interval_secs)
    }
}
