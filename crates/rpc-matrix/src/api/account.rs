use rpc_core::{AuthRequirement, Endpoint, Method, NoBody, Structural};
use serde::{Deserialize, Serialize};

use super::EmptyResponse;

/// `GET /account/whoami`: owner of the access token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhoAmI;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub user_id: String,
    /// Only reported by newer homeservers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl Endpoint for WhoAmI {
    const NAME: &'static str = "whoami";
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/_matrix/client/r0/account/whoami";
    const AUTH: AuthRequirement = AuthRequirement::AccessToken;

    type Request = ();
    type RequestFormat = NoBody;
    type Response = WhoAmIResponse;
    type ResponseFormat = Structural;

    fn body(&self) -> &() {
        &()
    }
}

/// `POST /logout`: invalidate the access token and its device.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logout;

impl Endpoint for Logout {
    const NAME: &'static str = "logout";
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/_matrix/client/r0/logout";
    const AUTH: AuthRequirement = AuthRequirement::AccessToken;

    type Request = ();
    type RequestFormat = NoBody;
    type Response = EmptyResponse;
    type ResponseFormat = Structural;

    fn body(&self) -> &() {
        &()
    }
}
