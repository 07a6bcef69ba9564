use rpc_core::{
    FamilyInfo, JsonObject, TaggedPayload, UnknownPayload, Variant,
    payload::{from_fields, variant_fields},
};
use serde::{Deserialize, Serialize};

/// Identification of the user logging in (`type` discriminated).
#[derive(Debug, Clone, PartialEq)]
pub enum UserIdentifier {
    /// `m.id.user`
    User(MatrixUserId),
    /// `m.id.thirdparty`
    ThirdParty(ThirdPartyId),
    /// `m.id.phone`
    Phone(PhoneNumber),
    Unknown(UnknownPayload),
}

impl UserIdentifier {
    /// `m.id.user` identifier for a localpart or fully-qualified user ID.
    pub fn user(user: impl Into<String>) -> Self {
        Self::User(MatrixUserId {
            user: user.into(),
            extra: JsonObject::new(),
        })
    }

    pub fn third_party(medium: impl Into<String>, address: impl Into<String>) -> Self {
        Self::ThirdParty(ThirdPartyId {
            medium: medium.into(),
            address: address.into(),
            extra: JsonObject::new(),
        })
    }

    pub fn phone(country: impl Into<String>, phone: impl Into<String>) -> Self {
        Self::Phone(PhoneNumber {
            country: country.into(),
            phone: phone.into(),
            extra: JsonObject::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixUserId {
    pub user: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A third-party identifier such as an email address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdPartyId {
    /// Medium of the identifier, for example `email`.
    pub medium: String,
    pub address: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// Two-letter ISO-3166-1 alpha-2 country code the number is local to.
    pub country: String,
    pub phone: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl TaggedPayload for UserIdentifier {
    const FAMILY: FamilyInfo = FamilyInfo {
        name: "user_identifier",
        discriminator: "type",
    };
    const VARIANTS: &'static [Variant<Self>] = &[
        Variant::new("m.id.user", |raw| from_fields(raw).map(Self::User)),
        Variant::new("m.id.thirdparty", |raw| from_fields(raw).map(Self::ThirdParty)),
        Variant::new("m.id.phone", |raw| from_fields(raw).map(Self::Phone)),
    ];

    fn kind(&self) -> &str {
        match self {
            Self::User(_) => "m.id.user",
            Self::ThirdParty(_) => "m.id.thirdparty",
            Self::Phone(_) => "m.id.phone",
            Self::Unknown(unknown) => unknown.kind(),
        }
    }

    fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
        match self {
            Self::User(id) => variant_fields(id),
            Self::ThirdParty(id) => variant_fields(id),
            Self::Phone(id) => variant_fields(id),
            Self::Unknown(unknown) => Ok(unknown.raw().clone()),
        }
    }

    fn from_unknown(unknown: UnknownPayload) -> Self {
        Self::Unknown(unknown)
    }
}

rpc_core::tagged_payload_serde!(UserIdentifier);
rpc_core::variant_record!(MatrixUserId, ThirdPartyId, PhoneNumber);
