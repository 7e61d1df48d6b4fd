//! Reads an unpacked registry+v1 bundle filesystem into a typed
//! [`RegistryV1`] value — spec.md §2 component G.

pub mod bundlefs;
pub mod error;
pub mod registry_v1;

pub use bundlefs::{parse, BundleFs, InMemoryBundleFs};
pub use error::{Error, Result};
pub use registry_v1::{
    ClusterServiceVersion, CustomResourceDefinition, DeploymentSpec, InstallMode, InstallModeType,
    InstallStrategy, ObjectRef, OtherManifest, Permission, PolicyRule, RegistryV1, WebhookAdmissionType,
    WebhookDefinition,
};
