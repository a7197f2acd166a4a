use common::{MailConfig, RetryPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
    /// Base URL embedded in certificate verification links.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Bound on connecting and on waiting for a pooled connection.
    pub acquire_timeout_secs: u64,
    /// Bound on a single engine operation (one transaction or query group).
    pub operation_timeout_ms: u64,
    pub sql_logging: bool,
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Optional bootstrap administrator, created on startup when all fields are set.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("server.public_base_url", "http://127.0.0.1:3000")?
            .set_default("database.max_connections", 20)?
            .set_default("database.acquire_timeout_secs", 8)?
            .set_default("database.operation_timeout_ms", 5000)?
            .set_default("database.sql_logging", false)?
            .set_default("auth.token_ttl_days", 7)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., REGISTRAR__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("REGISTRAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
