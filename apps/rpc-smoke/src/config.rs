//! Environment-backed configuration for `rpc-smoke`.

use std::{env, fmt};

use rpc_matrix::{
    ClientConfig, ConfigError,
    config::optional_trimmed_env,
};

const USER_ENV: &str = "MATRIX_RPC_USER";
const PASSWORD_ENV: &str = "MATRIX_RPC_PASSWORD";
const DEVICE_NAME_ENV: &str = "MATRIX_RPC_DEVICE_NAME";
const DEFAULT_DEVICE_NAME: &str = "rpc-smoke";

/// Password login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Localpart or full user ID.
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    pub client: ClientConfig,
    /// When absent only unauthenticated checks run.
    pub credentials: Option<Credentials>,
    pub device_name: String,
}

impl SmokeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let client = ClientConfig::from_lookup(&mut lookup)?;

        let user = optional_trimmed_env(USER_ENV, &mut lookup);
        let password = lookup(PASSWORD_ENV).filter(|value| !value.is_empty());
        let credentials = match (user, password) {
            (Some(user), Some(password)) => Some(Credentials { user, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing { key: PASSWORD_ENV }),
            (None, Some(_)) => return Err(ConfigError::Missing { key: USER_ENV }),
        };

        let device_name = optional_trimmed_env(DEVICE_NAME_ENV, &mut lookup)
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_owned());

        Ok(Self {
            client,
            credentials,
            device_name,
        })
    }
}
