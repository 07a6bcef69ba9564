use std::{any::TypeId, collections::BTreeMap};

use serde_json::Value;
use thiserror::Error;

use crate::payload::{self, FamilyInfo, JsonObject, PayloadError, TaggedPayload};

/// Errors raised while assembling a [`PayloadRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("payload family '{family}' is registered twice")]
    DuplicateFamily { family: &'static str },
    #[error("payload family '{family}' registers discriminator '{kind}' twice")]
    DuplicateDiscriminator {
        family: &'static str,
        kind: &'static str,
    },
}

#[derive(Debug, Clone)]
struct RegisteredFamily {
    info: FamilyInfo,
    type_id: TypeId,
    kinds: Vec<&'static str>,
}

/// The set of payload families known to a dispatcher.
///
/// Built once through [`RegistryBuilder`] and read-only afterwards, so a
/// single instance can be shared across concurrent dispatches.
#[derive(Debug, Clone)]
pub struct PayloadRegistry {
    families: BTreeMap<&'static str, RegisteredFamily>,
}

impl PayloadRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Metadata for a registered family.
    pub fn family(&self, name: &str) -> Option<FamilyInfo> {
        self.families.get(name).map(|family| family.info)
    }

    /// Registered discriminator values of a family, in registration order.
    pub fn kinds(&self, name: &str) -> Option<&[&'static str]> {
        self.families.get(name).map(|family| family.kinds.as_slice())
    }

    pub fn families(&self) -> impl Iterator<Item = FamilyInfo> + '_ {
        self.families.values().map(|family| family.info)
    }

    pub fn contains<P: TaggedPayload>(&self) -> bool {
        self.families
            .get(P::FAMILY.name)
            .is_some_and(|family| family.type_id == TypeId::of::<P>())
    }

    /// Decode a raw object as a member of family `P`.
    pub fn decode<P: TaggedPayload>(&self, raw: JsonObject) -> Result<P, PayloadError> {
        self.ensure_registered::<P>()?;
        payload::decode(raw)
    }

    pub fn decode_value<P: TaggedPayload>(&self, value: Value) -> Result<P, PayloadError> {
        self.ensure_registered::<P>()?;
        payload::decode_value(value)
    }

    pub fn encode<P: TaggedPayload>(&self, value: &P) -> Result<JsonObject, PayloadError> {
        self.ensure_registered::<P>()?;
        payload::encode(value)
    }

    fn ensure_registered<P: TaggedPayload>(&self) -> Result<(), PayloadError> {
        if self.contains::<P>() {
            Ok(())
        } else {
            Err(PayloadError::UnregisteredFamily {
                family: P::FAMILY.name,
            })
        }
    }
}

/// Collects families before freezing them into a [`PayloadRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    families: BTreeMap<&'static str, RegisteredFamily>,
}

impl RegistryBuilder {
    /// Register family `P`, validating that its discriminators are unique.
    pub fn register<P: TaggedPayload>(mut self) -> Result<Self, RegistryError> {
        let info = P::FAMILY;
        if self.families.contains_key(info.name) {
            return Err(RegistryError::DuplicateFamily { family: info.name });
        }

        let mut kinds: Vec<&'static str> = Vec::with_capacity(P::VARIANTS.len());
        for variant in P::VARIANTS {
            if kinds.contains(&variant.kind()) {
                return Err(RegistryError::DuplicateDiscriminator {
                    family: info.name,
                    kind: variant.kind(),
                });
            }
            kinds.push(variant.kind());
        }

        self.families.insert(
            info.name,
            RegisteredFamily {
                info,
                type_id: TypeId::of::<P>(),
                kinds,
            },
        );
        Ok(self)
    }

    pub fn build(self) -> PayloadRegistry {
        PayloadRegistry {
            families: self.families,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::payload::{
        UnknownPayload, Variant, from_fields,
        tests::{Shape, Square},
    };

    #[derive(Debug)]
    struct Clashing;

    impl TaggedPayload for Clashing {
        const FAMILY: FamilyInfo = FamilyInfo {
            name: "clashing",
            discriminator: "type",
        };
        const VARIANTS: &'static [Variant<Self>] = &[
            Variant::new("a", |_| Ok(Clashing)),
            Variant::new("a", |_| Ok(Clashing)),
        ];

        fn kind(&self) -> &str {
            "a"
        }

        fn to_fields(&self) -> Result<JsonObject, serde_json::Error> {
            Ok(JsonObject::new())
        }

        fn from_unknown(_: UnknownPayload) -> Self {
            Clashing
        }
    }

    fn shapes() -> PayloadRegistry {
        PayloadRegistry::builder()
            .register::<Shape>()
            .expect("shape family registers")
            .build()
    }

    #[test]
    fn rejects_duplicate_discriminators() {
        let err = PayloadRegistry::builder()
            .register::<Clashing>()
            .expect_err("duplicate kinds must be rejected");
        assert_eq!(
            err,
            RegistryError::DuplicateDiscriminator {
                family: "clashing",
                kind: "a"
            }
        );
    }

    #[test]
    fn rejects_duplicate_families() {
        let err = PayloadRegistry::builder()
            .register::<Shape>()
            .and_then(|builder| builder.register::<Shape>())
            .expect_err("second registration must fail");
        assert_eq!(err, RegistryError::DuplicateFamily { family: "shape" });
    }

    #[test]
    fn exposes_family_metadata() {
        let registry = shapes();
        let info = registry.family("shape").expect("family is registered");
        assert_eq!(info.discriminator, "kind");
        assert_eq!(registry.kinds("shape"), Some(&["circle", "square"][..]));
        assert_eq!(registry.families().count(), 1);
        assert!(registry.family("colour").is_none());
    }

    #[test]
    fn refuses_unregistered_families() {
        let registry = PayloadRegistry::builder().build();
        let err = registry
            .encode(&Shape::Square(Square { side: 1 }))
            .expect_err("unregistered family must fail");
        assert!(matches!(
            err,
            PayloadError::UnregisteredFamily { family: "shape" }
        ));
    }

    #[test]
    fn decodes_through_registered_family() {
        let registry = shapes();
        let decoded: Shape = registry
            .decode_value(json!({"kind": "square", "side": 4}))
            .expect("decode");
        assert_eq!(decoded, Shape::Square(Square { side: 4 }));

        let square: Square = from_fields(
            registry
                .encode(&decoded)
                .map(|mut object| {
                    object.remove("kind");
                    object
                })
                .expect("encode"),
        )
        .expect("fields decode");
        assert_eq!(square.side, 4);
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PayloadRegistry>();
    }
}
