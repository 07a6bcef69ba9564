use std::collections::BTreeMap;

use rpc_core::{AuthRequirement, Endpoint, JsonObject, Method, NoBody, Structural, Tagged};
use serde::{Deserialize, Serialize};

use crate::models::LoginBody;

/// `GET /login`: login types supported by the homeserver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetLoginFlows;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginFlows {
    #[serde(default)]
    pub flows: Vec<LoginFlow>,
}

impl LoginFlows {
    pub fn supports(&self, kind: &str) -> bool {
        self.flows.iter().any(|flow| flow.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginFlow {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl Endpoint for GetLoginFlows {
    const NAME: &'static str = "get_login_flows";
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/_matrix/client/r0/login";
    const AUTH: AuthRequirement = AuthRequirement::Public;

    type Request = ();
    type RequestFormat = NoBody;
    type Response = LoginFlows;
    type ResponseFormat = Structural;

    fn body(&self) -> &() {
        &()
    }
}

/// `POST /login`: authenticate and obtain an access token.
///
/// A new device is created unless the body names a known `device_id`. The
/// server may invalidate tokens previously issued to that device.
#[derive(Debug, Clone, PartialEq)]
pub struct Login {
    pub body: LoginBody,
}

impl Login {
    pub fn new(body: LoginBody) -> Self {
        Self { body }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Legacy server name of the homeserver. Derive it from `user_id` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Client configuration in `.well-known` discovery form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_known: Option<BTreeMap<String, JsonObject>>,
}

impl Endpoint for Login {
    const NAME: &'static str = "login";
    const METHOD: Method = Method::Post;
    const PATH: &'static str = "/_matrix/client/r0/login";
    const AUTH: AuthRequirement = AuthRequirement::Public;

    type Request = LoginBody;
    type RequestFormat = Tagged;
    type Response = LoginResponse;
    type ResponseFormat = Structural;

    fn body(&self) -> &LoginBody {
        &self.body
    }
}
