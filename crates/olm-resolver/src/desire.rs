//! A caller's declarative request for a package, per spec.md §1: "given a
//! declarative desire for a named operator package (version range and
//! channel)".

use semver::VersionReq;

/// One top-level package a caller wants installed.
#[derive(Debug, Clone)]
pub struct Desire {
    pub package_name: String,
    pub version_range: Option<VersionReq>,
    pub channel: Option<String>,
}

impl Desire {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version_range: None,
            channel: None,
        }
    }

    pub fn with_version_range(mut self, range: VersionReq) -> Self {
        self.version_range = Some(range);
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn variable_id(&self) -> String {
        format!("required-package/{}", self.package_name)
    }
}
