use rpc_core::{AuthRequirement, Endpoint, Method, Structural};
use serde::{Deserialize, Serialize};

use crate::models::AuthenticationData;

/// Account kind selected by the `kind` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    Guest,
    User,
}

impl RegisterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
        }
    }
}

/// `POST /register`: create an account.
///
/// Protected by user-interactive authentication except for guest accounts.
/// The first attempt usually fails with a 401 challenge; see
/// [`crate::models::UserInteractiveAuth::from_error`].
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    /// `None` lets the server default to `user`.
    pub kind: Option<RegisterKind>,
    pub body: RegisterBody,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterBody {
    /// Authenticates the register call itself, not the new account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthenticationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Skip issuing an access token and device for the new account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inhibit_login: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_device_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Basis for the localpart. The registered ID may differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Absent when `inhibit_login` was set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Legacy server name of the homeserver. Derive it from `user_id` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_server: Option<String>,
    pub user_id: String,
}

impl Endpoint for Register {
    const NAME: &'static str = "register";
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/_matrix/client/r0/register";
    const AUTH: AuthRequirement = AuthRequirement::Public;

    type Request = RegisterBody;
    type RequestFormat = Structural;
    type Response = RegisterResponse;
    type ResponseFormat = Structural;

    fn body(&self) -> &RegisterBody {
        &self.body
    }

    fn query_params(&self) -> Vec<(&'static str, Option<String>)> {
        vec![("kind", self.kind.map(|kind| kind.as_str().to_owned()))]
    }
}
