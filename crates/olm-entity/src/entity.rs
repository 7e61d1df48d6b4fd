use crate::error::{Error, Result};
use crate::property::{keys, Channel, Gvk, PackageRequired, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier for a catalog-provided entity. Stable and deterministic:
/// the same catalog bundle always yields the same `EntityId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for EntityId {
    fn from(s: S) -> Self {
        EntityId(s.into())
    }
}

/// A catalog-provided candidate: a uniform representation of a bundle
/// carrying typed properties (package, version, channel, provided/required
/// GVKs, required packages, bundle path). Property values are opaque to the
/// model itself; see [`PropertyValue`] for the typed accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    properties: BTreeMap<String, PropertyValue>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, properties: BTreeMap<String, PropertyValue>) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn package_name(&self) -> Result<&str> {
        self.property(keys::PACKAGE_NAME)
            .map(|v| v.as_string("entity", "olm.package.name"))
            .unwrap_or_else(|| {
                crate::error::MissingPropertySnafu {
                    key: "olm.package.name",
                    what: self.id.to_string(),
                }
                .fail()
                .map_err(Error::from)
            })
    }

    pub fn version(&self) -> Result<semver::Version> {
        match self.property(keys::PACKAGE_VERSION) {
            Some(v) => v.as_version("entity", "olm.package.version"),
            None => crate::error::MissingPropertySnafu {
                key: "olm.package.version",
                what: self.id.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.property(keys::PACKAGE_CHANNEL)
            .and_then(|v| v.as_channel("entity", "olm.package.channel").ok())
    }

    pub fn bundle_path(&self) -> Result<&str> {
        match self.property(keys::BUNDLE_PATH) {
            Some(v) => v.as_string("entity", "olm.package.bundlePath"),
            None => crate::error::MissingPropertySnafu {
                key: "olm.package.bundlePath",
                what: self.id.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn provided_gvks(&self) -> &[Gvk] {
        self.property(keys::GVK_PROVIDED)
            .and_then(|v| v.as_gvk_list("entity", "olm.gvk.provided").ok())
            .unwrap_or(&[])
    }

    pub fn required_gvks(&self) -> &[Gvk] {
        self.property(keys::GVK_REQUIRED)
            .and_then(|v| v.as_gvk_list("entity", "olm.gvk.required").ok())
            .unwrap_or(&[])
    }

    pub fn required_packages(&self) -> &[PackageRequired] {
        self.property(keys::PACKAGE_REQUIRED)
            .and_then(|v| v.as_package_required_list("entity", "olm.package.required").ok())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_name_is_an_error() {
        let e = Entity::new("pkg/a@1.0.0", BTreeMap::new());
        assert!(e.package_name().is_err());
    }

    #[test]
    fn provided_gvks_defaults_to_empty() {
        let e = Entity::new("pkg/a@1.0.0", BTreeMap::new());
        assert!(e.provided_gvks().is_empty());
    }
}
