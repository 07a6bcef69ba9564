mod config;
mod logging;

use std::process::ExitCode;

use rpc_core::DispatchError;
use rpc_matrix::{
    ClientError, ConfigError, MatrixClient,
    api::{GetLoginFlows, Login, Logout, WhoAmI},
    connect,
    models::{LoginBody, UserIdentifier},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{Credentials, SmokeConfig};

const PASSWORD_LOGIN: &str = "m.login.password";

#[derive(Debug, Error)]
enum SmokeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: DispatchError,
    },
    #[error("homeserver does not offer m.login.password")]
    PasswordLoginUnsupported,
    #[error("login response carried no access token")]
    MissingToken,
}

fn step(name: &'static str) -> impl FnOnce(DispatchError) -> SmokeError {
    move |source| SmokeError::Step { step: name, source }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "smoke run failed");
            eprintln!("rpc-smoke: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), SmokeError> {
    let config = SmokeConfig::from_env()?;
    let mut client = connect(&config.client)?;

    let flows = client
        .dispatch(&GetLoginFlows)
        .await
        .map_err(step("login flow discovery"))?;
    let kinds: Vec<&str> = flows.flows.iter().map(|flow| flow.kind.as_str()).collect();
    info!(homeserver = %config.client.homeserver, flows = ?kinds, "discovered login flows");

    match &config.credentials {
        Some(credentials) => {
            if !flows.supports(PASSWORD_LOGIN) {
                return Err(SmokeError::PasswordLoginUnsupported);
            }
            password_session(&mut client, credentials, &config.device_name).await
        }
        None if client.access_token().is_some() => {
            let whoami = client.dispatch(&WhoAmI).await.map_err(step("whoami"))?;
            info!(user_id = %whoami.user_id, "existing access token is valid");
            Ok(())
        }
        None => {
            info!("no credentials configured; set MATRIX_RPC_USER and MATRIX_RPC_PASSWORD for a live login");
            Ok(())
        }
    }
}

async fn password_session(
    client: &mut MatrixClient,
    credentials: &Credentials,
    device_name: &str,
) -> Result<(), SmokeError> {
    let body = LoginBody::password(
        UserIdentifier::user(credentials.user.clone()),
        credentials.password.clone(),
    )
    .with_device_display_name(device_name);
    let login = client
        .dispatch(&Login::new(body))
        .await
        .map_err(step("login"))?;
    let token = login.access_token.ok_or(SmokeError::MissingToken)?;
    info!(
        user_id = login.user_id.as_deref().unwrap_or("<unknown>"),
        device_id = login.device_id.as_deref().unwrap_or("<unknown>"),
        "logged in"
    );
    client.set_access_token(Some(token));

    let whoami = client.dispatch(&WhoAmI).await.map_err(step("whoami"))?;
    if login.user_id.as_deref() != Some(whoami.user_id.as_str()) {
        warn!(
            login_user = ?login.user_id,
            whoami_user = %whoami.user_id,
            "whoami disagrees with login response"
        );
    }

    client.dispatch(&Logout).await.map_err(step("logout"))?;
    client.set_access_token(None);
    info!("logged out");
    Ok(())
}
