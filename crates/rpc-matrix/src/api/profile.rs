use rpc_core::{AuthRequirement, Endpoint, Method, NoBody, Structural};
use serde::{Deserialize, Serialize};

/// `GET /profile/{userId}/displayname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDisplayName {
    pub user_id: String,
}

impl GetDisplayName {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    #[serde(default)]
    pub displayname: Option<String>,
}

impl Endpoint for GetDisplayName {
    const NAME: &'static str = "get_display_name";
    const METHOD: Method = Method::Get;
    const PATH: &'static str = "/_matrix/client/r0/profile/{userId}/displayname";
    const AUTH: AuthRequirement = AuthRequirement::Public;

    type Request = ();
    type RequestFormat = NoBody;
    type Response = DisplayName;
    type ResponseFormat = Structural;

    fn body(&self) -> &() {
        &()
    }

    fn path_params(&self) -> Vec<(&'static str, String)> {
        vec![("userId", self.user_id.clone())]
    }
}
