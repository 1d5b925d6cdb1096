//! Environment-driven server configuration.
//!
//! Every setting has a development default except `JWT_SECRET`. Values are
//! parsed and checked once at startup; a bad value is reported as a
//! [`ConfigError`] naming the offending variable.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::auth::jwt::JwtConfig;

/// A configuration variable that is missing or does not parse.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Read `var`, falling back to `default` when unset.
pub(crate) fn env_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Origins allowed by CORS, already validated as header values.
    pub cors_origins: Vec<HeaderValue>,
    pub request_timeout: Duration,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = env_or("PORT", 3000u16)?;
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        )?;
        let request_timeout = Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 30u64)?);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout,
            jwt: JwtConfig::from_env()?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Split a comma-separated origin list, skipping blanks.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.to_string(),
            })
        })
        .collect()
}
