//! Matrix client-server binding built on `rpc-core`.
//!
//! Endpoint definitions live in [`api`], discriminated payload families in
//! [`models`]. [`connect`] wires a [`ClientConfig`] into a dispatcher backed
//! by [`ReqwestTransport`] and the [`standard_registry`].

/// Client-server endpoints.
pub mod api;
/// Environment-backed client configuration.
pub mod config;
/// Tagged payload families.
pub mod models;
/// Registry assembly for this crate's payload families.
pub mod registry;
/// Default `reqwest` transport.
pub mod transport;

use std::sync::Arc;

use rpc_core::{Dispatcher, RegistryError, TransportError};
use thiserror::Error;
use tracing::debug;

pub use config::{ClientConfig, ConfigError};
pub use registry::standard_registry;
pub use transport::{DEFAULT_USER_AGENT, ReqwestTransport, TransportConfig};

/// Dispatcher specialised to the default transport.
pub type MatrixClient<T = ReqwestTransport> = Dispatcher<T>;

/// Failures while assembling a [`MatrixClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build http transport: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid payload registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Build a client for `config` with the standard payload registry.
pub fn connect(config: &ClientConfig) -> Result<MatrixClient, ClientError> {
    let transport = ReqwestTransport::new(&config.transport_config())?;
    let registry = Arc::new(standard_registry()?);
    debug!(
        homeserver = %config.homeserver,
        timeout_ms = config.timeout.map(|t| t.as_millis() as u64),
        has_token = config.access_token.is_some(),
        "matrix client configured"
    );

    let mut client = Dispatcher::new(config.homeserver.clone(), transport, registry);
    client.set_access_token(config.access_token.clone());
    Ok(client)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::{
        api::{GetLoginFlows, Login, Logout, WhoAmI},
        models::{LoginBody, UserIdentifier},
    };

    #[test]
    fn connect_applies_config() {
        let mut config = ClientConfig::new("https://matrix.example.org/");
        config.access_token = Some("abc".into());
        let client = connect(&config).expect("client builds");
        assert_eq!(client.base_url(), "https://matrix.example.org/");
        assert_eq!(client.access_token(), Some("abc"));
        assert!(client.registry().contains::<LoginBody>());
    }

    #[tokio::test]
    #[ignore = "runs against live homeserver, requires env vars"]
    async fn live_login_whoami_logout() {
        let config = ClientConfig::from_env().expect("MATRIX_RPC_HOMESERVER must be set");
        let user = env::var("MATRIX_RPC_USER").expect("MATRIX_RPC_USER must be set");
        let password = env::var("MATRIX_RPC_PASSWORD").expect("MATRIX_RPC_PASSWORD must be set");

        let mut client = connect(&config).expect("client builds");
        let flows = client.dispatch(&GetLoginFlows).await.expect("login flows");
        assert!(flows.supports("m.login.password"));

        let login = client
            .dispatch(&Login::new(LoginBody::password(
                UserIdentifier::user(user),
                password,
            )))
            .await
            .expect("password login");
        let token = login.access_token.expect("login returns a token");
        client.set_access_token(Some(token));

        let whoami = client.dispatch(&WhoAmI).await.expect("whoami");
        assert_eq!(Some(whoami.user_id), login.user_id);

        client.dispatch(&Logout).await.expect("logout");
    }
}
