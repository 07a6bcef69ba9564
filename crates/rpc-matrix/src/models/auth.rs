//! User-interactive authentication: stage payloads and the 401 challenge.

use std::collections::BTreeMap;

use rpc_core::{
    FamilyInfo, JsonObject, ProtocolError, TaggedPayload, UnknownPayload, Variant,
    payload::{from_fields, variant_fields},
};
use serde::{Deserialize, Serialize};

use super::UserIdentifier;

/// Auth data for one user-interactive authentication stage (`type`).
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationData {
    /// `m.login.password`
    Password(PasswordAuth),
    /// `m.login.recaptcha`
    Recaptcha(RecaptchaAuth),
    /// `m.login.token`
    Token(TokenAuth),
    /// `m.login.dummy`
    Dummy(DummyAuth),
    Unknown(UnknownPayload),
}

/// Members shared by every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthCommon {
    /// Session ID handed out by the homeserver's 401 challenge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordAuth {
    #[serde(flatten)]
    pub common: AuthCommon,
    pub identifier: UserIdentifier,
    pub password: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecaptchaAuth {
    #[serde(flatten)]
    pub common: AuthCommon,
    /// The captcha response.
    pub response: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAuth {
    #[serde(flatten)]
    pub common: AuthCommon,
    pub token: String,
    /// Client-generated nonce.
    pub txn_id: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DummyAuth {
    #[serde(flatten)]
    pub common: AuthCommon,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl AuthenticationData {
    /// `m.login.dummy` for the given session.
    pub fn dummy(session: Option<String>) -> Self {
        Self::Dummy(DummyAuth {
            common: AuthCommon { session },
            extra: JsonObject::new(),
        })
    }

    pub fn password(
        identifier: UserIdentifier,
        password: impl Into<String>,
        session: Option<String>,
    ) -> Self {
        Self::Password(PasswordAuth {
            common: AuthCommon { session },
            identifier,
            password: password.into(),
            extra: JsonObject::new(),
        })
    }

    /// Session the stage belongs to, `None` for unknown stages.
    pub fn session(&self) -> Option<&str> {
        let common = match self {
            Self::Password(auth) => &auth.common,
            Self::Recaptcha(auth) => &auth.common,
            Self::Token(auth) => &auth.common,
            Self::Dummy(auth) => &auth.common,
            Self::Unknown(_) => return None,
        };
        common.session.as_deref()
    }
}

impl TaggedPayload for AuthenticationData {
    const FAMILY: FamilyInfo = FamilyInfo {
        name: "authentication_data",
        discriminator: "type",
    };
    const VARIANTS: &'static [Variant<Self>] = &[
        Variant::new("m.login.password", |raw| from_fields(raw).map(Self::Password)),
        Variant::new("m.login.recaptcha", |raw| from_fields(raw).map(Self::Recaptcha)),
        Variant::new("m.login.token", |raw| from_fields(raw).map(Self::Token)),
        Variant::new("m.login.dummy", |raw| from_fields(raw).map(Self::Dummy)),
    ];

    fn kind(&self) -> &str {
        match self {
            Self::Password(_) => "m.login.password",
            Self::Recaptcha(_) => "m.login.recaptcha",
            Self::Token(_) => "m.login.token",
            Self::Dummy(_) => "m.login.dummy",
            Self::Unknown(unknown) => unknown.kind(),
        }
    }

    fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
        match self {
            Self::Password(auth) => variant_fields(auth),
            Self::Recaptcha(auth) => variant_fields(auth),
            Self::Token(auth) => variant_fields(auth),
            Self::Dummy(auth) => variant_fields(auth),
            Self::Unknown(unknown) => Ok(unknown.raw().clone()),
        }
    }

    fn from_unknown(unknown: UnknownPayload) -> Self {
        Self::Unknown(unknown)
    }
}

rpc_core::tagged_payload_serde!(AuthenticationData);
rpc_core::variant_record!(PasswordAuth, RecaptchaAuth, TokenAuth, DummyAuth);

/// One acceptable sequence of stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFlow {
    pub stages: Vec<String>,
}

/// Challenge returned with HTTP 401 by endpoints behind user-interactive
/// authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInteractiveAuth {
    pub flows: Vec<AuthFlow>,
    /// Per-stage parameters, keyed by stage type.
    #[serde(default)]
    pub params: BTreeMap<String, JsonObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Stages already completed in this session.
    #[serde(default)]
    pub completed: Vec<String>,
}

impl UserInteractiveAuth {
    /// Parse the challenge carried by a 401 response. Other errors yield `None`.
    pub fn from_error(error: &ProtocolError) -> Option<Self> {
        if error.status() != 401 {
            return None;
        }
        serde_json::from_slice(error.raw()).ok()
    }

    /// Stages of `flow` not completed yet.
    pub fn remaining_stages<'a>(&'a self, flow: &'a AuthFlow) -> impl Iterator<Item = &'a str> {
        flow.stages
            .iter()
            .map(String::as_str)
            .filter(|stage| !self.completed.iter().any(|done| done == stage))
    }
}

#[cfg(test)]
mod tests {
    use rpc_core::map_error_response;

    use super::*;

    #[test]
    fn parses_challenge_from_401() {
        let body = br#"{
            "flows": [{"stages": ["m.login.recaptcha", "m.login.dummy"]}],
            "params": {"m.login.recaptcha": {"public_key": "abc"}},
            "session": "xxxxxx",
            "completed": ["m.login.recaptcha"]
        }"#;
        let error = map_error_response(401, body);
        assert_eq!(error.code(), "M_UNKNOWN");

        let uia = UserInteractiveAuth::from_error(&error).expect("challenge parses");
        assert_eq!(uia.session.as_deref(), Some("xxxxxx"));
        assert_eq!(
            uia.params["m.login.recaptcha"].get("public_key"),
            Some(&serde_json::json!("abc"))
        );
        let remaining: Vec<_> = uia.remaining_stages(&uia.flows[0]).collect();
        assert_eq!(remaining, ["m.login.dummy"]);
    }

    #[test]
    fn ignores_non_401_errors() {
        let error = map_error_response(403, br#"{"errcode":"M_FORBIDDEN","flows":[]}"#);
        assert!(UserInteractiveAuth::from_error(&error).is_none());
    }

    #[test]
    fn dummy_stage_carries_session() {
        let auth = AuthenticationData::dummy(Some("s1".into()));
        assert_eq!(auth.session(), Some("s1"));
        let value = serde_json::to_value(&auth).expect("encode");
        assert_eq!(
            value,
            serde_json::json!({"type": "m.login.dummy", "session": "s1"})
        );
    }
}
