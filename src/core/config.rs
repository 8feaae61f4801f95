//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.
//! Every setting has a development default except the SMTP credentials; a
//! missing `JWT_SECRET` falls back to an insecure development secret.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::core::auth::jwt::{DEVELOPMENT_SECRET, JwtConfig};
use crate::core::db::DbConfig;
use crate::core::mail::SmtpConfig;

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5433;
const DEFAULT_DB_USER: &str = "tracker_user";
const DEFAULT_DB_PASSWORD: &str = "tracker_pass";
const DEFAULT_DB_NAME: &str = "internship_tracker";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a valid port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection, either `DATABASE_URL` or the `DB_*` settings
    pub database: DbConfig,

    /// Secret for signing session tokens
    pub jwt_secret: Option<String>,

    /// Outbound mail; `None` when `SMTP_HOST` is unset
    pub smtp: Option<SmtpConfig>,

    /// Base URL of the web client, used in verification links
    pub frontend_url: String,

    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,

    /// HTTP listen port
    pub port: u16,

    /// Directory for uploaded resumes
    pub upload_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match var("DATABASE_URL") {
            Some(url) => DbConfig::new(url),
            None => {
                let port = parse_port("DB_PORT", var("DB_PORT"), DEFAULT_DB_PORT)?;
                DbConfig::from_parts(
                    &var("DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                    port,
                    &var("DB_USER").unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
                    &var("DB_PASSWORD").unwrap_or_else(|| DEFAULT_DB_PASSWORD.to_string()),
                    &var("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
                )
            }
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_port("SMTP_PORT", var("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
                username: var("SMTP_USER").unwrap_or_default(),
                password: var("SMTP_PASSWORD").unwrap_or_default(),
            }),
            None => None,
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_FRONTEND_URL.to_string()]);

        Ok(Self {
            database,
            jwt_secret: var("JWT_SECRET"),
            smtp,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            cors_origins,
            port: parse_port("PORT", var("PORT"), DEFAULT_PORT)?,
            upload_dir: PathBuf::from(
                var("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            ),
        })
    }

    /// Check if a JWT secret is configured
    pub fn has_jwt_secret(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Check if SMTP is configured
    pub fn has_smtp(&self) -> bool {
        self.smtp.is_some()
    }

    pub fn db_config(&self) -> DbConfig {
        self.database.clone()
    }

    /// JWT settings, falling back to the development secret with a warning
    pub fn jwt_config(&self) -> JwtConfig {
        match &self.jwt_secret {
            Some(secret) => JwtConfig::new(secret.clone()),
            None => {
                tracing::warn!(
                    "JWT_SECRET is not set; using an insecure development secret. Do not run this in production."
                );
                JwtConfig::new(DEVELOPMENT_SECRET)
            }
        }
    }

    /// Address to listen on (all interfaces)
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_port(var: &'static str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort { var, value: raw }),
    }
}
