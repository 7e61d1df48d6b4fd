//! Typed accessors over the otherwise open-typed entity/variable property map.
//!
//! The model deliberately does not interpret property values beyond the
//! documented keys in spec.md §4.1. `PropertyValue` is the tagged-union
//! accessor called for in Design Notes §9: callers ask for `as_string()`,
//! `as_gvk_list()`, etc. rather than pattern-matching raw JSON.

use crate::error::{self, Error, Result};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::fmt;

/// A Kubernetes Group-Version-Kind triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gvk {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl Gvk {
    pub fn new<S: Into<String>>(group: S, version: S, kind: S) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Used to build identifiers like `required-gvk/<group>:<version>:<kind>`.
    pub fn colon_triple(&self) -> String {
        format!("{}:{}:{}", self.group, self.version, self.kind)
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.colon_triple())
    }
}

/// A package's channel membership: the channel name plus the name of the
/// bundle this one replaces within that channel, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub replaces: Option<String>,
}

/// A transitive package requirement: a package name plus an acceptable
/// semver range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRequired {
    pub package_name: String,
    #[serde(with = "version_req_serde")]
    pub version_range: VersionReq,
}

impl PartialEq for PackageRequired {
    fn eq(&self, other: &Self) -> bool {
        self.package_name == other.package_name
            && self.version_range.to_string() == other.version_range.to_string()
    }
}

mod version_req_serde {
    use semver::VersionReq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(req: &VersionReq, s: S) -> Result<S::Ok, S::Error> {
        req.to_string().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<VersionReq, D::Error> {
        let raw = String::deserialize(d)?;
        VersionReq::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The closed set of value shapes a property can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum PropertyValue {
    String(String),
    Gvk(Gvk),
    GvkList(Vec<Gvk>),
    Channel(Channel),
    PackageRequiredList(Vec<PackageRequired>),
}

impl PropertyValue {
    pub fn as_string(&self, what: &str, key: &'static str) -> Result<&str> {
        match self {
            PropertyValue::String(s) => Ok(s.as_str()),
            _ => error::WrongPropertyTypeSnafu {
                key,
                what: what.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn as_gvk(&self, what: &str, key: &'static str) -> Result<&Gvk> {
        match self {
            PropertyValue::Gvk(g) => Ok(g),
            _ => error::WrongPropertyTypeSnafu {
                key,
                what: what.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn as_gvk_list(&self, what: &str, key: &'static str) -> Result<&[Gvk]> {
        match self {
            PropertyValue::GvkList(list) => Ok(list.as_slice()),
            _ => error::WrongPropertyTypeSnafu {
                key,
                what: what.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn as_channel(&self, what: &str, key: &'static str) -> Result<&Channel> {
        match self {
            PropertyValue::Channel(c) => Ok(c),
            _ => error::WrongPropertyTypeSnafu {
                key,
                what: what.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn as_package_required_list(&self, what: &str, key: &'static str) -> Result<&[PackageRequired]> {
        match self {
            PropertyValue::PackageRequiredList(list) => Ok(list.as_slice()),
            _ => error::WrongPropertyTypeSnafu {
                key,
                what: what.to_string(),
            }
            .fail()
            .map_err(Error::from),
        }
    }

    pub fn as_version(&self, what: &str, key: &'static str) -> Result<Version> {
        let raw = self.as_string(what, key)?;
        Version::parse(raw)
            .context(error::InvalidSemverSnafu {
                version: raw.to_string(),
            })
            .map_err(Error::from)
    }
}

/// Parses a semver range string, used when a variable source turns a
/// user-supplied version constraint (e.g. from a `Desire`) into a
/// `VersionReq` for an [`crate::predicate::InSemverRange`] predicate.
pub fn parse_version_req(range: &str) -> Result<VersionReq> {
    VersionReq::parse(range)
        .context(error::InvalidSemverRangeSnafu {
            range: range.to_string(),
        })
        .map_err(Error::from)
}

/// Well-known property keys, per spec.md §4.1.
pub mod keys {
    pub const PACKAGE_NAME: &str = "olm.package.name";
    pub const PACKAGE_VERSION: &str = "olm.package.version";
    pub const PACKAGE_CHANNEL: &str = "olm.package.channel";
    pub const GVK_PROVIDED: &str = "olm.gvk.provided";
    pub const GVK_REQUIRED: &str = "olm.gvk.required";
    pub const PACKAGE_REQUIRED: &str = "olm.package.required";
    pub const BUNDLE_PATH: &str = "olm.package.bundlePath";
}
