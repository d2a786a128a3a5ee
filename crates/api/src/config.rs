//! Process configuration, read from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use coffeeshop_auth::Algorithm;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Identity-provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Tenant domain, e.g. `coffee.eu.auth0.com`.
    pub domain: String,
    /// Expected `aud` of every token.
    pub audience: String,
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Drop all drinks and seed the demo drink on startup.
    pub reset: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub auth: AuthConfig,
    pub store: StoreConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key→value source (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match lookup("BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let domain = required(&lookup, "AUTH0_DOMAIN")?;
        let audience = required(&lookup, "API_AUDIENCE")?;
        let algorithm = match lookup("JWT_ALGORITHM") {
            Some(raw) => parse_algorithm(&raw)?,
            None => Algorithm::RS256,
        };

        let persistent = flag(&lookup, "USE_PERSISTENT_STORES")?;
        let database_url = if persistent {
            Some(required(&lookup, "DATABASE_URL")?)
        } else {
            None
        };
        let reset = flag(&lookup, "RESET_DATABASE")?;

        Ok(Self {
            bind_addr,
            auth: AuthConfig {
                domain,
                audience,
                algorithm,
            },
            store: StoreConfig {
                database_url,
                reset,
            },
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    match lookup(key) {
        None => Ok(false),
        Some(raw) => raw.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "JWT_ALGORITHM",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let algorithm: Algorithm = raw.trim().parse().map_err(|_| invalid("unknown algorithm"))?;
    match algorithm {
        // Key sets only publish public keys; shared-secret algorithms cannot be verified against them.
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            Err(invalid("HMAC algorithms cannot be verified with a public key set"))
        }
        other => Ok(other),
    }
}
