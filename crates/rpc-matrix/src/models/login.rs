use rpc_core::{
    FamilyInfo, JsonObject, TaggedPayload, UnknownPayload, Variant,
    payload::{from_fields, variant_fields},
};
use serde::{Deserialize, Serialize};

use super::UserIdentifier;

/// Request body of `POST /login`, discriminated by `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginBody {
    /// `m.login.password`
    Password(PasswordLogin),
    /// `m.login.token`
    Token(TokenLogin),
    Unknown(UnknownPayload),
}

/// Members shared by every login type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginCommon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<UserIdentifier>,
    /// Existing device to log in to. The server generates one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Ignored when `device_id` names a known device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_device_display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordLogin {
    #[serde(flatten)]
    pub common: LoginCommon,
    pub password: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLogin {
    #[serde(flatten)]
    pub common: LoginCommon,
    pub token: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl LoginBody {
    /// Password login for `identifier`.
    pub fn password(identifier: UserIdentifier, password: impl Into<String>) -> Self {
        Self::Password(PasswordLogin {
            common: LoginCommon {
                identifier: Some(identifier),
                ..LoginCommon::default()
            },
            password: password.into(),
            extra: JsonObject::new(),
        })
    }

    /// Token login, for example with a token obtained through SSO.
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(TokenLogin {
            common: LoginCommon::default(),
            token: token.into(),
            extra: JsonObject::new(),
        })
    }

    /// Shared members, `None` for unknown login types.
    pub fn common(&self) -> Option<&LoginCommon> {
        match self {
            Self::Password(login) => Some(&login.common),
            Self::Token(login) => Some(&login.common),
            Self::Unknown(_) => None,
        }
    }

    /// Set the display name of the device created by this login.
    pub fn with_device_display_name(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Self::Password(login) => login.common.initial_device_display_name = Some(name.into()),
            Self::Token(login) => login.common.initial_device_display_name = Some(name.into()),
            Self::Unknown(_) => {}
        }
        self
    }
}

impl TaggedPayload for LoginBody {
    const FAMILY: FamilyInfo = FamilyInfo {
        name: "login",
        discriminator: "type",
    };
    const VARIANTS: &'static [Variant<Self>] = &[
        Variant::new("m.login.password", |raw| from_fields(raw).map(Self::Password)),
        Variant::new("m.login.token", |raw| from_fields(raw).map(Self::Token)),
    ];

    fn kind(&self) -> &str {
        match self {
            Self::Password(_) => "m.login.password",
            Self::Token(_) => "m.login.token",
            Self::Unknown(unknown) => unknown.kind(),
        }
    }

    fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
        match self {
            Self::Password(login) => variant_fields(login),
            Self::Token(login) => variant_fields(login),
            Self::Unknown(unknown) => Ok(unknown.raw().clone()),
        }
    }

    fn from_unknown(unknown: UnknownPayload) -> Self {
        Self::Unknown(unknown)
    }
}

rpc_core::tagged_payload_serde!(LoginBody);
rpc_core::variant_record!(PasswordLogin, TokenLogin);
