use std::collections::BTreeMap;

use rpc_core::{AuthRequirement, Endpoint, JsonObject, Method, Structural, payload::to_object};
use serde::{Deserialize, Serialize};

use super::EmptyResponse;
use crate::models::{StartContent, VERIFICATION_START_EVENT, new_transaction_id};

/// Device key addressing every device of a user.
pub const ALL_DEVICES: &str = "*";

/// `PUT /sendToDevice/{eventType}/{txnId}`: send events straight to devices.
#[derive(Debug, Clone, PartialEq)]
pub struct SendToDevice {
    pub event_type: String,
    /// Idempotency key. Retries must reuse it.
    pub txn_id: String,
    pub body: ToDeviceMessages,
}

/// Message contents keyed by user ID, then by device ID or [`ALL_DEVICES`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToDeviceMessages {
    pub messages: BTreeMap<String, BTreeMap<String, JsonObject>>,
}

impl ToDeviceMessages {
    /// Add `content` for one device of `user_id`.
    pub fn insert<C: Serialize>(
        &mut self,
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        content: &C,
    ) -> Result<(), serde_json::Error> {
        let content = to_object(content)?;
        self.messages
            .entry(user_id.into())
            .or_default()
            .insert(device_id.into(), content);
        Ok(())
    }
}

impl SendToDevice {
    /// New send of `event_type` with a freshly generated transaction ID.
    pub fn new(event_type: impl Into<String>, body: ToDeviceMessages) -> Self {
        Self {
            event_type: event_type.into(),
            txn_id: new_transaction_id(),
            body,
        }
    }

    /// Send `m.key.verification.start` to one device.
    pub fn verification_start(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        content: &StartContent,
    ) -> Result<Self, serde_json::Error> {
        let mut body = ToDeviceMessages::default();
        body.insert(user_id, device_id, content)?;
        Ok(Self::new(VERIFICATION_START_EVENT, body))
    }
}

impl Endpoint for SendToDevice {
    const NAME: &'static str = "send_to_device";
    const METHOD: Method = Method::Put;
    const PATH: &'static str = "/_matrix/client/r0/sendToDevice/{eventType}/{txnId}";
    const AUTH: AuthRequirement = AuthRequirement::AccessToken;

    type Request = ToDeviceMessages;
    type RequestFormat = Structural;
    type Response = EmptyResponse;
    type ResponseFormat = Structural;

    fn body(&self) -> &ToDeviceMessages {
        &self.body
    }

    fn path_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("eventType", self.event_type.clone()),
            ("txnId", self.txn_id.clone()),
        ]
    }
}
