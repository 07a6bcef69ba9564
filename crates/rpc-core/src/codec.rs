//! Body wire formats selected per endpoint at the type level.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    payload::{PayloadError, TaggedPayload},
    registry::PayloadRegistry,
};

/// Encodes a request body; `Ok(None)` means the request carries no body.
pub trait EncodeBody<T> {
    fn encode(registry: &PayloadRegistry, body: &T) -> Result<Option<Vec<u8>>, PayloadError>;
}

/// Decodes a success response body.
pub trait DecodeBody<T> {
    fn decode(registry: &PayloadRegistry, bytes: &[u8]) -> Result<T, PayloadError>;
}

/// Plain serde encoding of the body type.
#[derive(Debug, Clone, Copy)]
pub struct Structural;

/// Encoding through a registered [`TaggedPayload`] family.
#[derive(Debug, Clone, Copy)]
pub struct Tagged;

/// No request body.
#[derive(Debug, Clone, Copy)]
pub struct NoBody;

impl<T: Serialize> EncodeBody<T> for Structural {
    fn encode(_: &PayloadRegistry, body: &T) -> Result<Option<Vec<u8>>, PayloadError> {
        Ok(Some(serde_json::to_vec(body)?))
    }
}

impl<T: DeserializeOwned> DecodeBody<T> for Structural {
    /// Empty bodies are read as `{}`.
    fn decode(_: &PayloadRegistry, bytes: &[u8]) -> Result<T, PayloadError> {
        let bytes: &[u8] = if bytes.trim_ascii().is_empty() {
            b"{}"
        } else {
            bytes
        };
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl<T: TaggedPayload> EncodeBody<T> for Tagged {
    fn encode(registry: &PayloadRegistry, body: &T) -> Result<Option<Vec<u8>>, PayloadError> {
        let object = registry.encode(body)?;
        Ok(Some(serde_json::to_vec(&object)?))
    }
}

impl<T: TaggedPayload> DecodeBody<T> for Tagged {
    fn decode(registry: &PayloadRegistry, bytes: &[u8]) -> Result<T, PayloadError> {
        let value = serde_json::from_slice(bytes)?;
        registry.decode_value(value)
    }
}

impl EncodeBody<()> for NoBody {
    fn encode(_: &PayloadRegistry, _: &()) -> Result<Option<Vec<u8>>, PayloadError> {
        Ok(None)
    }
}
