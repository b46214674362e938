/// Configuration management for Blog Service
///
/// Loads configuration from environment variables (and `.env` via dotenvy in
/// the binary).
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Persistence backend
    pub storage: StorageConfig,
    /// Identity provider settings
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    Postgres(DatabaseConfig),
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Bearer token verification settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

// Default values
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

const DEVELOPMENT_JWT_SECRET: &str = "blog-service-development-secret";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("BLOG_SERVICE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if app.is_production() => {
                    bail!("CORS_ALLOWED_ORIGINS must be set in production")
                }
                Err(_) => "http://localhost:3000".to_string(),
            };

            if app.is_production() && allowed_origins.trim() == "*" {
                bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
            }

            CorsConfig { allowed_origins }
        };

        let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "postgres" => StorageConfig::Postgres(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or_else(default_min_connections),
                acquire_timeout_secs: std::env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or_else(default_acquire_timeout_secs),
            }),
            "memory" => StorageConfig::Memory,
            other => bail!("Unknown STORAGE_BACKEND '{}'", other),
        };

        let auth = AuthConfig {
            jwt_secret: match std::env::var("JWT_SECRET") {
                Ok(secret) if !secret.trim().is_empty() => secret,
                _ if app.is_production() => bail!("JWT_SECRET must be set in production"),
                _ => DEVELOPMENT_JWT_SECRET.to_string(),
            },
        };

        Ok(Config {
            app,
            cors,
            storage,
            auth,
        })
    }
}
