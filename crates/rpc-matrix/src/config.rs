//! Environment-backed client configuration.

use std::{env, fmt, time::Duration};

use thiserror::Error;

use crate::transport::TransportConfig;

pub const HOMESERVER_ENV: &str = "MATRIX_RPC_HOMESERVER";
pub const TIMEOUT_MS_ENV: &str = "MATRIX_RPC_TIMEOUT_MS";
pub const USER_AGENT_ENV: &str = "MATRIX_RPC_USER_AGENT";
pub const ACCESS_TOKEN_ENV: &str = "MATRIX_RPC_ACCESS_TOKEN";

/// Connection settings for a homeserver.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL such as `https://matrix.example.org`.
    pub homeserver: String,
    /// Per-request timeout forwarded to the transport.
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
    /// Token of an existing session, used for authenticated endpoints.
    pub access_token: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("homeserver", &self.homeserver)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ClientConfig {
    pub fn new(homeserver: impl Into<String>) -> Self {
        Self {
            homeserver: homeserver.into(),
            timeout: None,
            user_agent: None,
            access_token: None,
        }
    }

    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let homeserver = optional_trimmed_env(HOMESERVER_ENV, &mut lookup)
            .ok_or(ConfigError::Missing { key: HOMESERVER_ENV })?;
        if !(homeserver.starts_with("https://") || homeserver.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                key: HOMESERVER_ENV,
                value: homeserver,
                reason: "must start with http:// or https://".to_owned(),
            });
        }

        let timeout = match parse_optional_u64(TIMEOUT_MS_ENV, &mut lookup)? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: TIMEOUT_MS_ENV,
                    value: "0".to_owned(),
                    reason: "must be at least 1".to_owned(),
                });
            }
            other => other.map(Duration::from_millis),
        };

        Ok(Self {
            homeserver,
            timeout,
            user_agent: optional_trimmed_env(USER_AGENT_ENV, &mut lookup),
            access_token: optional_trimmed_env(ACCESS_TOKEN_ENV, &mut lookup),
        })
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Errors produced while parsing client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or blank.
    #[error("missing required {key}")]
    Missing { key: &'static str },
    /// An environment variable could not be parsed.
    #[error("invalid {key}='{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Read `key`, dropping blank values.
pub fn optional_trimmed_env<F>(key: &'static str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_optional_u64<F>(key: &'static str, lookup: &mut F) -> Result<Option<u64>, ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let Some(value) = optional_trimmed_env(key, lookup) else {
        return Ok(None);
    };
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        })
}
