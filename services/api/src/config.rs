//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use argon2::PasswordHash;
use chrono::Duration;
use lexvault_core::policy::{AdminCredential, WorkspacePolicy};
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub extraction_model: String,
    pub advisory_model: String,
    pub support_model: String,
    pub admin_email: Option<String>,
    pub admin_password_hash: Option<String>,
    pub verification_bypass_code: Option<String>,
    pub notification_retention_days: i64,
    pub audit_log_capacity: usize,
    pub vault_max_pin_attempts: u32,
    pub vault_lockout_minutes: i64,
    pub session_ttl_hours: i64,
    pub inactivity_limit_minutes: i64,
    pub cors_origin: String,
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn positive(key: &str, value: i64) -> Result<i64, ConfigError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ))
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Server and Database Settings ---
        let bind_address = parsed(&lookup, "BIND_ADDRESS", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let database_url = lookup("DATABASE_URL");

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Generative Provider ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let extraction_model = lookup("EXTRACTION_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let advisory_model = lookup("ADVISORY_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let support_model = lookup("SUPPORT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Identity ---
        let admin_email = lookup("ADMIN_EMAIL").map(|e| e.trim().to_lowercase());
        let admin_password_hash = lookup("ADMIN_PASSWORD_HASH");
        match (&admin_email, &admin_password_hash) {
            (Some(_), None) => return Err(ConfigError::MissingVar("ADMIN_PASSWORD_HASH".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingVar("ADMIN_EMAIL".to_string())),
            (Some(_), Some(hash)) => {
                PasswordHash::new(hash).map_err(|e| {
                    ConfigError::InvalidValue("ADMIN_PASSWORD_HASH".to_string(), e.to_string())
                })?;
            }
            (None, None) => {}
        }
        let verification_bypass_code = lookup("VERIFICATION_BYPASS_CODE");

        // --- Limits ---
        let notification_retention_days = positive(
            "NOTIFICATION_RETENTION_DAYS",
            parsed(&lookup, "NOTIFICATION_RETENTION_DAYS", 30)?,
        )?;
        let audit_log_capacity: usize = parsed(&lookup, "AUDIT_LOG_CAPACITY", 500)?;
        if audit_log_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "AUDIT_LOG_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let vault_max_pin_attempts = parsed(&lookup, "VAULT_MAX_PIN_ATTEMPTS", 5)?;
        if vault_max_pin_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "VAULT_MAX_PIN_ATTEMPTS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let vault_lockout_minutes = positive(
            "VAULT_LOCKOUT_MINUTES",
            parsed(&lookup, "VAULT_LOCKOUT_MINUTES", 15)?,
        )?;
        let session_ttl_hours =
            positive("SESSION_TTL_HOURS", parsed(&lookup, "SESSION_TTL_HOURS", 720)?)?;
        let inactivity_limit_minutes = positive(
            "INACTIVITY_LIMIT_MINUTES",
            parsed(&lookup, "INACTIVITY_LIMIT_MINUTES", 15)?,
        )?;
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            extraction_model,
            advisory_model,
            support_model,
            admin_email,
            admin_password_hash,
            verification_bypass_code,
            notification_retention_days,
            audit_log_capacity,
            vault_max_pin_attempts,
            vault_lockout_minutes,
            session_ttl_hours,
            inactivity_limit_minutes,
            cors_origin,
        })
    }

    /// The workspace limits and credentials this configuration describes.
    pub fn policy(&self) -> WorkspacePolicy {
        let admin = match (&self.admin_email, &self.admin_password_hash) {
            (Some(email), Some(hash)) => Some(AdminCredential {
                email: email.clone(),
                password_hash: hash.clone(),
            }),
            _ => None,
        };
        WorkspacePolicy {
            admin,
            verification_bypass_code: self.verification_bypass_code.clone(),
            notification_retention: Duration::days(self.notification_retention_days),
            audit_log_capacity: self.audit_log_capacity,
            vault_max_pin_attempts: self.vault_max_pin_attempts,
            vault_lockout: Duration::minutes(self.vault_lockout_minutes),
            session_ttl: Duration::hours(self.session_ttl_hours),
            inactivity_limit: Duration::minutes(self.inactivity_limit_minutes),
        }
    }
}
