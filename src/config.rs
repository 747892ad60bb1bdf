// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;

/// Origins allowed by CORS when `CORS_ORIGINS` is not set.
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Session lifetime when `JWT_EXPIRATION` is not set (24 hours).
const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token and cookie lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Admin credential pair. Admin login is disabled unless both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Adds the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    pub bind_addr: SocketAddr,
    pub log_dir: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, value) => write!(f, "{} has an invalid value: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = match optional("JWT_EXPIRATION") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("JWT_EXPIRATION", raw))?,
            None => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = optional("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let cookie_secure = match optional("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("COOKIE_SECURE", raw))?,
            None => false,
        };

        let bind_addr = match optional("BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("BIND_ADDR", raw))?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let cors_origins = optional("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
            cookie_secure,
            bind_addr,
            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            cors_origins,
        })
    }

    /// Whether the configured database is the in-process store.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    /// Returns the admin credential pair when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

/// Reads a variable, treating empty values as unset.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
