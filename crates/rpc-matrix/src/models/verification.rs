use rpc_core::{
    FamilyInfo, JsonObject, TaggedPayload, UnknownPayload, Variant,
    payload::{from_fields, variant_fields},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type of the to-device message carrying [`StartContent`].
pub const VERIFICATION_START_EVENT: &str = "m.key.verification.start";

/// Content of `m.key.verification.start`, discriminated by `method`.
#[derive(Debug, Clone, PartialEq)]
pub enum StartContent {
    /// `m.sas.v1`
    SasV1(SasV1Content),
    /// `m.reciprocate.v1`
    ReciprocateV1(ReciprocateV1Content),
    Unknown(UnknownPayload),
}

/// Members shared by every verification method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCommon {
    /// Device initiating the process.
    pub from_device: String,
    /// Opaque ID of the verification process, unique between the two devices.
    pub transaction_id: String,
    /// Method used to verify the other user's key when `method` only
    /// verifies one side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_method: Option<String>,
}

impl VerificationCommon {
    /// Start a new process from `from_device` with a fresh transaction ID.
    pub fn new(from_device: impl Into<String>) -> Self {
        Self {
            from_device: from_device.into(),
            transaction_id: new_transaction_id(),
            next_method: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SasV1Content {
    #[serde(flatten)]
    pub common: VerificationCommon,
    /// Must include at least `curve25519`.
    pub key_agreement_protocols: Vec<String>,
    /// Must include at least `sha256`.
    pub hashes: Vec<String>,
    /// Must include at least `hkdf-hmac-sha256`.
    pub message_authentication_codes: Vec<String>,
    /// `decimal`, optionally `emoji`.
    pub short_authentication_string: Vec<String>,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl SasV1Content {
    /// Content advertising the mandatory SAS algorithms.
    pub fn with_defaults(common: VerificationCommon) -> Self {
        Self {
            common,
            key_agreement_protocols: vec!["curve25519".to_owned()],
            hashes: vec!["sha256".to_owned()],
            message_authentication_codes: vec!["hkdf-hmac-sha256".to_owned()],
            short_authentication_string: vec!["decimal".to_owned(), "emoji".to_owned()],
            extra: JsonObject::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReciprocateV1Content {
    #[serde(flatten)]
    pub common: VerificationCommon,
    /// Shared secret from the scanned QR code, unpadded base64.
    pub secret: String,
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl StartContent {
    /// Shared members, `None` for unknown methods.
    pub fn common(&self) -> Option<&VerificationCommon> {
        match self {
            Self::SasV1(content) => Some(&content.common),
            Self::ReciprocateV1(content) => Some(&content.common),
            Self::Unknown(_) => None,
        }
    }
}

impl TaggedPayload for StartContent {
    const FAMILY: FamilyInfo = FamilyInfo {
        name: "verification_start",
        discriminator: "method",
    };
    const VARIANTS: &'static [Variant<Self>] = &[
        Variant::new("m.sas.v1", |raw| from_fields(raw).map(Self::SasV1)),
        Variant::new("m.reciprocate.v1", |raw| {
            from_fields(raw).map(Self::ReciprocateV1)
        }),
    ];

    fn kind(&self) -> &str {
        match self {
            Self::SasV1(_) => "m.sas.v1",
            Self::ReciprocateV1(_) => "m.reciprocate.v1",
            Self::Unknown(unknown) => unknown.kind(),
        }
    }

    fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
        match self {
            Self::SasV1(content) => variant_fields(content),
            Self::ReciprocateV1(content) => variant_fields(content),
            Self::Unknown(unknown) => Ok(unknown.raw().clone()),
        }
    }

    fn from_unknown(unknown: UnknownPayload) -> Self {
        Self::Unknown(unknown)
    }
}

rpc_core::tagged_payload_serde!(StartContent);
rpc_core::variant_record!(SasV1Content, ReciprocateV1Content);

/// Random transaction ID for verification processes and to-device sends.
pub fn new_transaction_id() -> String {
    Uuid::new_v4().simple().to_string()
}
