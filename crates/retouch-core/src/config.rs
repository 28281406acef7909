//! Configuration module
//!
//! Environment-driven settings for the API server: database, auth, the image
//! CDN account and the transformation session tuning knobs.

use std::env;

use crate::constants::{DEFAULT_CREDIT_FEE, DEFAULT_DEBOUNCE_MS, DEFAULT_SESSION_IDLE_SECS};
use crate::transform_url::DEFAULT_DELIVERY_BASE_URL;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Shared secret the identity provider signs session tokens with
    pub jwt_secret: String,
    /// Image CDN account namespace
    pub cloud_name: String,
    pub delivery_base_url: String,
    /// Signed credit delta per applied transformation (negative = charge)
    pub credit_fee: i64,
    pub debounce_ms: u64,
    /// Open sessions idle for longer than this are closed
    pub session_idle_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(SERVER_PORT),
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            delivery_base_url: env::var("CDN_DELIVERY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_DELIVERY_BASE_URL.to_string()),
            credit_fee: env::var("CREDIT_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CREDIT_FEE),
            debounce_ms: env::var("DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_DEBOUNCE_MS),
            session_idle_timeout_secs: env::var("SESSION_IDLE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.cloud_name.trim().is_empty() {
            return Err(anyhow::anyhow!("CLOUDINARY_CLOUD_NAME must be set"));
        }

        if self.session_idle_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "SESSION_IDLE_TIMEOUT_SECONDS must be greater than zero"
            ));
        }

        if self.credit_fee > 0 {
            return Err(anyhow::anyhow!(
                "CREDIT_FEE must be zero or negative (it is added to the balance)"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            server_port: 3000,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: "postgresql://localhost/retouch".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 5,
            jwt_secret: "a".repeat(32),
            cloud_name: "demo".to_string(),
            delivery_base_url: DEFAULT_DELIVERY_BASE_URL.to_string(),
            credit_fee: -1,
            debounce_ms: 1000,
            session_idle_timeout_secs: 1800,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let config = Config {
            jwt_secret: "short".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_positive_fee_rejected() {
        let config = Config {
            credit_fee: 5,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_session_idle_timeout_rejected() {
        let config = Config {
            session_idle_timeout_secs: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_production() {
        let config = Config {
            environment: "Prod".to_string(),
            ..valid()
        };
        assert!(config.is_production());
        assert!(!valid().is_production());
    }
}
