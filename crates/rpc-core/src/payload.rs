//! Tagged-union payloads distinguished by a string discriminator member.
//!
//! Each family is a closed Rust enum with an extra `Unknown` case. Known
//! discriminator values are registered through [`TaggedPayload::VARIANTS`];
//! anything else decodes to [`UnknownPayload`], which keeps the raw object so
//! it re-encodes unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// A JSON object as decoded by `serde_json`.
pub type JsonObject = serde_json::Map<String, Value>;

/// Static description of a payload family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Human-readable family name, unique within a registry.
    pub name: &'static str,
    /// JSON member holding the discriminator, for example `"type"`.
    pub discriminator: &'static str,
}

/// Registration of one discriminator value and its decoder.
pub struct Variant<P> {
    kind: &'static str,
    decode: fn(JsonObject) -> Result<P, serde_json::Error>,
}

impl<P> Variant<P> {
    pub const fn new(
        kind: &'static str,
        decode: fn(JsonObject) -> Result<P, serde_json::Error>,
    ) -> Self {
        Self { kind, decode }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

/// A payload whose discriminator is not registered in its family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPayload {
    kind: String,
    raw: JsonObject,
}

impl UnknownPayload {
    /// Discriminator value as received.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The full object as received, discriminator included.
    pub fn raw(&self) -> &JsonObject {
        &self.raw
    }

    pub fn into_raw(self) -> JsonObject {
        self.raw
    }
}

/// A closed sum type encoded as a JSON object with a discriminator member.
pub trait TaggedPayload: Sized + 'static {
    const FAMILY: FamilyInfo;
    /// Known variants. Discriminator values must be unique.
    const VARIANTS: &'static [Variant<Self>];

    /// Discriminator value for this value.
    fn kind(&self) -> &str;

    /// Variant members without the discriminator.
    ///
    /// Unknown payloads return their raw object.
    fn to_fields(&self) -> Result<JsonObject, serde_json::Error>;

    fn from_unknown(unknown: UnknownPayload) -> Self;
}

/// Errors raised while encoding or decoding payload bodies.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The discriminator member is absent (or `null`), so the payload cannot
    /// be classified.
    #[error("{family} payload is missing its '{field}' discriminator")]
    MissingDiscriminator {
        family: &'static str,
        field: &'static str,
    },
    /// The discriminator member is not a string.
    #[error("{family} payload has a non-string '{field}' discriminator")]
    InvalidDiscriminator {
        family: &'static str,
        field: &'static str,
    },
    #[error("{family} payload must be a JSON object")]
    NotAnObject { family: &'static str },
    /// A known variant's members did not match its shape.
    #[error("invalid '{kind}' {family} payload: {source}")]
    Variant {
        family: &'static str,
        kind: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("payload family '{family}' is not registered")]
    UnregisteredFamily { family: &'static str },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classify `raw` by its discriminator and decode it into the family type.
pub fn decode<P: TaggedPayload>(mut raw: JsonObject) -> Result<P, PayloadError> {
    let family = P::FAMILY;
    let kind = match raw.get(family.discriminator) {
        None | Some(Value::Null) => {
            return Err(PayloadError::MissingDiscriminator {
                family: family.name,
                field: family.discriminator,
            });
        }
        Some(Value::String(kind)) => kind.clone(),
        Some(_) => {
            return Err(PayloadError::InvalidDiscriminator {
                family: family.name,
                field: family.discriminator,
            });
        }
    };

    let Some(variant) = P::VARIANTS.iter().find(|variant| variant.kind == kind) else {
        return Ok(P::from_unknown(UnknownPayload { kind, raw }));
    };

    raw.remove(family.discriminator);
    (variant.decode)(raw).map_err(|source| PayloadError::Variant {
        family: family.name,
        kind,
        source,
    })
}

/// Decode from an arbitrary JSON value, rejecting non-objects.
pub fn decode_value<P: TaggedPayload>(value: Value) -> Result<P, PayloadError> {
    match value {
        Value::Object(raw) => decode(raw),
        _ => Err(PayloadError::NotAnObject {
            family: P::FAMILY.name,
        }),
    }
}

/// Encode `payload` as an object carrying its discriminator.
pub fn encode<P: TaggedPayload>(payload: &P) -> Result<JsonObject, PayloadError> {
    let mut object = payload.to_fields()?;
    object.insert(
        P::FAMILY.discriminator.to_owned(),
        Value::String(payload.kind().to_owned()),
    );
    Ok(object)
}

/// A variant record whose unrecognised members live in a flattened `extra`
/// map. Declared members that may be skipped on output must be `Option`s.
/// The family discriminator is written by [`encode`] and overrides any
/// `extra` entry of the same name.
pub trait VariantRecord: Serialize + DeserializeOwned + Clone {
    fn extra(&self) -> &JsonObject;
    fn extra_mut(&mut self) -> &mut JsonObject;
}

/// Serialize any value that must become a JSON object.
pub fn to_object<T: Serialize>(value: &T) -> Result<JsonObject, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(object) => Ok(object),
        _ => Err(serde::ser::Error::custom(
            "variant records must serialize to JSON objects",
        )),
    }
}

/// Serialize a variant record into an object of members.
///
/// Declared members win over `extra`: a residual key naming a declared
/// member is dropped, whether or not that member is set.
pub fn variant_fields<T: VariantRecord>(value: &T) -> Result<JsonObject, serde_json::Error> {
    if value.extra().is_empty() {
        return to_object(value);
    }

    let mut declared = value.clone();
    let extra = std::mem::take(declared.extra_mut());
    let mut object = to_object(&declared)?;

    // Unset declared members accept `null`; whatever the record does not
    // absorb is a true residual.
    let mut shape = object.clone();
    for key in extra.keys() {
        shape.entry(key.clone()).or_insert(Value::Null);
    }
    let residual = from_fields::<T>(shape)?;

    for (key, member) in extra {
        if !object.contains_key(&key) && residual.extra().contains_key(&key) {
            object.insert(key, member);
        }
    }
    Ok(object)
}

/// Deserialize a variant record from its members.
pub fn from_fields<T: DeserializeOwned>(raw: JsonObject) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(raw))
}

#[doc(hidden)]
pub fn serialize_tagged<P, S>(payload: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: TaggedPayload,
    S: Serializer,
{
    let object = encode(payload).map_err(<S::Error as serde::ser::Error>::custom)?;
    object.serialize(serializer)
}

#[doc(hidden)]
pub fn deserialize_tagged<'de, P, D>(deserializer: D) -> Result<P, D::Error>
where
    P: TaggedPayload,
    D: Deserializer<'de>,
{
    let raw = JsonObject::deserialize(deserializer)?;
    decode(raw).map_err(<D::Error as serde::de::Error>::custom)
}

/// Implement `Serialize`/`Deserialize` for [`TaggedPayload`] families so they
/// can nest inside ordinary serde structs.
#[macro_export]
macro_rules! tagged_payload_serde {
    ($($ty:ty),+ $(,)?) => {$(
        impl ::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $crate::payload::serialize_tagged(self, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::payload::deserialize_tagged(deserializer)
            }
        }
    )+};
}

/// Implement [`VariantRecord`] for records that keep residual members in a
/// field named `extra`.
#[macro_export]
macro_rules! variant_record {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::payload::VariantRecord for $ty {
            fn extra(&self) -> &$crate::payload::JsonObject {
                &self.extra
            }

            fn extra_mut(&mut self) -> &mut $crate::payload::JsonObject {
                &mut self.extra
            }
        }
    )+};
}

#[cfg(test)]
pub(crate) mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Circle {
        pub radius: u32,
        #[serde(flatten)]
        pub extra: JsonObject,
    }

    crate::variant_record!(Circle);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Square {
        pub side: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Shape {
        Circle(Circle),
        Square(Square),
        Unknown(UnknownPayload),
    }

    impl TaggedPayload for Shape {
        const FAMILY: FamilyInfo = FamilyInfo {
            name: "shape",
            discriminator: "kind",
        };
        const VARIANTS: &'static [Variant<Self>] = &[
            Variant::new("circle", |raw| from_fields(raw).map(Self::Circle)),
            Variant::new("square", |raw| from_fields(raw).map(Self::Square)),
        ];

        fn kind(&self) -> &str {
            match self {
                Self::Circle(_) => "circle",
                Self::Square(_) => "square",
                Self::Unknown(unknown) => unknown.kind(),
            }
        }

        fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
            match self {
                Self::Circle(circle) => variant_fields(circle),
                Self::Square(square) => to_object(square),
                Self::Unknown(unknown) => Ok(unknown.raw().clone()),
            }
        }

        fn from_unknown(unknown: UnknownPayload) -> Self {
            Self::Unknown(unknown)
        }
    }

    crate::tagged_payload_serde!(Shape);

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(object) => object,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn known_variants_round_trip() {
        let shapes = [
            Shape::Circle(Circle {
                radius: 3,
                extra: JsonObject::new(),
            }),
            Shape::Square(Square { side: 2 }),
        ];
        for shape in shapes {
            let encoded = encode(&shape).expect("encode");
            let decoded: Shape = decode(encoded).expect("decode");
            assert_eq!(decoded, shape);
        }
    }

    #[test]
    fn encode_writes_registered_discriminator() {
        let encoded = encode(&Shape::Square(Square { side: 9 })).expect("encode");
        assert_eq!(Value::Object(encoded), json!({"kind": "square", "side": 9}));
    }

    #[test]
    fn unknown_discriminator_keeps_raw_object() {
        let raw = object(json!({"kind": "hexagon", "sides": 6, "nested": {"a": [1, 2]}}));
        let decoded: Shape = decode(raw.clone()).expect("unknown kinds decode");

        match &decoded {
            Shape::Unknown(unknown) => {
                assert_eq!(unknown.kind(), "hexagon");
                assert_eq!(unknown.raw(), &raw);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(encode(&decoded).expect("re-encode"), raw);
    }

    #[test]
    fn missing_discriminator_is_fatal() {
        for raw in [json!({"radius": 1}), json!({"kind": null, "radius": 1})] {
            let err = decode::<Shape>(object(raw)).expect_err("must fail");
            assert!(matches!(
                err,
                PayloadError::MissingDiscriminator {
                    family: "shape",
                    field: "kind"
                }
            ));
        }
    }

    #[test]
    fn non_string_discriminator_is_rejected() {
        let err = decode::<Shape>(object(json!({"kind": 7}))).expect_err("must fail");
        assert!(matches!(err, PayloadError::InvalidDiscriminator { .. }));
    }

    #[test]
    fn known_variant_with_bad_fields_reports_kind() {
        let err = decode::<Shape>(object(json!({"kind": "square", "side": "wide"})))
            .expect_err("must fail");
        match err {
            PayloadError::Variant { kind, .. } => assert_eq!(kind, "square"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn residual_members_survive_round_trip() {
        let raw = object(json!({"kind": "circle", "radius": 1, "org.example.color": "red"}));
        let decoded: Shape = decode(raw.clone()).expect("decode");
        match &decoded {
            Shape::Circle(circle) => {
                assert_eq!(circle.extra.get("org.example.color"), Some(&json!("red")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(encode(&decoded).expect("encode"), raw);
    }

    #[test]
    fn declared_members_win_over_colliding_residuals() {
        let mut extra = JsonObject::new();
        extra.insert("radius".into(), json!(99));
        extra.insert("org.example.color".into(), json!("red"));
        let shape = Shape::Circle(Circle { radius: 3, extra });

        let encoded = encode(&shape).expect("encode");
        assert_eq!(
            Value::Object(encoded.clone()),
            json!({"kind": "circle", "radius": 3, "org.example.color": "red"})
        );
        match decode::<Shape>(encoded).expect("decode") {
            Shape::Circle(circle) => {
                assert_eq!(circle.radius, 3);
                assert!(!circle.extra.contains_key("radius"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn nests_inside_serde_structs() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Drawing {
            shapes: Vec<Shape>,
        }

        let text = r#"{"shapes":[{"kind":"square","side":1},{"kind":"blob"}]}"#;
        let drawing: Drawing = serde_json::from_str(text).expect("decode drawing");
        assert!(matches!(drawing.shapes[1], Shape::Unknown(_)));

        let reencoded = serde_json::to_value(&drawing).expect("encode drawing");
        assert_eq!(
            reencoded,
            json!({"shapes": [{"kind": "square", "side": 1}, {"kind": "blob"}]})
        );

        let err = serde_json::from_str::<Drawing>(r#"{"shapes":[{"side":1}]}"#)
            .expect_err("missing discriminator must fail");
        assert!(err.to_string().contains("discriminator"));
    }

    #[test]
    fn decode_value_rejects_non_objects() {
        let err = decode_value::<Shape>(json!([1, 2])).expect_err("must fail");
        assert!(matches!(err, PayloadError::NotAnObject { family: "shape" }));
    }
}
