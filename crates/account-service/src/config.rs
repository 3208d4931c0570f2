use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BCRYPT_COST: u32 = 12;
pub const MIN_BCRYPT_COST: u32 = 10;
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default access-token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900;

/// Default refresh-token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

/// Minimum accepted length for an HS256 signing secret.
pub const MIN_TOKEN_SECRET_BYTES: usize = 32;

/// Deployment environment, drives cookie `Secure` flags and whether error
/// envelopes carry diagnostic traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub asset_store_url: String,
    pub asset_store_api_key: SecretString,
    pub bcrypt_cost: u32,
    pub cors_origin: String,
    pub environment: Environment,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },

    #[error("Signing secret {0} must be at least 32 bytes")]
    WeakSecret(String),
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = require(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let access_token_secret = require_secret(vars, "ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = require_secret(vars, "REFRESH_TOKEN_SECRET")?;

        if access_token_secret.expose_secret() == refresh_token_secret.expose_secret() {
            return Err(ConfigError::InvalidValue {
                var: "REFRESH_TOKEN_SECRET".to_string(),
                reason: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }

        let access_token_ttl_secs =
            parse_or(vars, "ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?;
        let refresh_token_ttl_secs =
            parse_or(vars, "REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS)?;

        let asset_store_url = require(vars, "ASSET_STORE_URL")?;
        let asset_store_api_key = vars
            .get("ASSET_STORE_API_KEY")
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("ASSET_STORE_API_KEY".to_string()))?;

        let bcrypt_cost = parse_or(vars, "BCRYPT_COST", i64::from(DEFAULT_BCRYPT_COST))?;
        let bcrypt_cost = u32::try_from(bcrypt_cost).map_err(|_| ConfigError::InvalidValue {
            var: "BCRYPT_COST".to_string(),
            reason: "must be a small positive integer".to_string(),
        })?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                var: "BCRYPT_COST".to_string(),
                reason: format!("must be {}-{}", MIN_BCRYPT_COST, MAX_BCRYPT_COST),
            });
        }

        let cors_origin = vars
            .get("CORS_ORIGIN")
            .cloned()
            .unwrap_or_else(|| "*".to_string());

        let environment = match vars.get("APP_ENV") {
            Some(raw) => raw
                .parse::<Environment>()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "APP_ENV".to_string(),
                    reason,
                })?,
            None => Environment::Development,
        };

        Ok(AppConfig {
            database_url,
            bind_address,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            asset_store_url,
            asset_store_api_key,
            bcrypt_cost,
            cors_origin,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn require(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn require_secret(vars: &HashMap<String, String>, name: &str) -> Result<SecretString, ConfigError> {
    let raw = require(vars, name)?;
    if raw.len() < MIN_TOKEN_SECRET_BYTES {
        return Err(ConfigError::WeakSecret(name.to_string()));
    }
    Ok(SecretString::from(raw))
}

fn parse_or(vars: &HashMap<String, String>, name: &str, default: i64) -> Result<i64, ConfigError> {
    match vars.get(name) {
        Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::InvalidValue {
            var: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
