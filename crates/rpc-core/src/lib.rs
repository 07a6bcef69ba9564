//! Transport-agnostic typed RPC contract for the Matrix client-server API.
//!
//! This crate defines endpoint descriptors with URL templating, the
//! polymorphic payload registry for discriminated JSON unions, the typed
//! dispatcher, and the error taxonomy shared by every endpoint.

/// Request/response body wire formats.
pub mod codec;
/// Typed Build → Transmit → Resolve dispatcher.
pub mod dispatch;
/// HTTP methods, URL templates and the `Endpoint` trait.
pub mod endpoint;
/// Stable error types and HTTP classification helpers.
pub mod error;
/// Normalization of non-success responses.
pub mod error_mapper;
/// Tagged-union payload families.
pub mod payload;
/// Immutable registry of payload families.
pub mod registry;
/// Transport seam and the scripted in-memory transport.
pub mod transport;

pub use codec::{DecodeBody, EncodeBody, NoBody, Structural, Tagged};
pub use dispatch::Dispatcher;
pub use endpoint::{
    AuthRequirement, DescriptorBuilder, DescriptorError, Endpoint, EndpointDescriptor, Method,
    Segment, UrlTemplate,
};
pub use error::{
    DispatchError, ErrorCategory, LIMIT_EXCEEDED_ERRCODE, ProtocolError, classify_http_status,
};
pub use error_mapper::{UNKNOWN_ERRCODE, map_error_response, retry_after_from_header};
pub use payload::{
    FamilyInfo, JsonObject, PayloadError, TaggedPayload, UnknownPayload, Variant, VariantRecord,
};
pub use registry::{PayloadRegistry, RegistryBuilder, RegistryError};
pub use transport::{
    HttpRequest, HttpResponse, ScriptedTransport, Transport, TransportError, TransportErrorKind,
};
pub use tokio_util::sync::CancellationToken;
