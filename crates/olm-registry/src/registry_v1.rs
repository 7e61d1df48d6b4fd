//! The parsed "registry+v1" bundle, per spec.md §3 (`RegistryV1`) and
//! §6 ("Bundle FS"): a package name, a ClusterServiceVersion, any CRDs,
//! any other manifests, and parsed properties.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Kubernetes Group-Version-Kind plus a name, enough to identify an
/// object without fully typing its spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

/// The install mode a CSV declares support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum InstallModeType {
    OwnNamespace,
    SingleNamespace,
    MultiNamespace,
    AllNamespaces,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallMode {
    #[serde(rename = "type")]
    pub kind: InstallModeType,
    pub supported: bool,
}

/// One RBAC permission entry (namespaced or cluster-scoped, distinguished
/// by which `StrategyDetailsDeployment` list it's drawn from).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "serviceAccountName")]
    pub service_account_name: String,
    pub rules: Vec<PolicyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    #[serde(default, rename = "apiGroups")]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub verbs: Vec<String>,
    #[serde(default, rename = "resourceNames")]
    pub resource_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub name: String,
    #[serde(default)]
    pub label: BTreeMap<String, String>,
    /// The raw `appsv1.DeploymentSpec` (pod template, replicas, etc.) —
    /// kept as opaque JSON since this crate does not reinterpret pod
    /// scheduling semantics, only the handful of fields the converter
    /// needs (annotations, service account, containers for cert mounts).
    pub spec: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAdmissionType {
    ValidatingAdmissionWebhook,
    MutatingAdmissionWebhook,
    ConversionWebhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDefinition {
    pub generate_name: String,
    #[serde(rename = "type")]
    pub kind: WebhookAdmissionType,
    pub deployment_name: String,
    pub container_port: u16,
    #[serde(default)]
    pub target_port: Option<u16>,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    #[serde(default)]
    pub conversion_crds: Vec<String>,
    #[serde(default = "default_conversion_review_versions")]
    pub conversion_review_versions: Vec<String>,
}

fn default_webhook_path() -> String {
    "/".to_string()
}

fn default_conversion_review_versions() -> Vec<String> {
    vec!["v1".to_string()]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallStrategy {
    #[serde(default, rename = "deployments")]
    pub deployment_specs: Vec<DeploymentSpec>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default, rename = "clusterPermissions")]
    pub cluster_permissions: Vec<Permission>,
}

/// The subset of a ClusterServiceVersion the converter and revision
/// pipeline need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterServiceVersion {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub install_modes: Vec<InstallMode>,
    pub install_strategy: InstallStrategy,
    #[serde(default)]
    pub webhook_definitions: Vec<WebhookDefinition>,
}

/// A CRD manifest from `manifests/`, kept opaque apart from its name and
/// group, which the phase engine and conversion-webhook rewrite need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomResourceDefinition {
    pub name: String,
    pub group: String,
    pub raw: Value,
}

/// Any other manifest kind from `manifests/` (Services, ConfigMaps,
/// PrometheusRules, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherManifest {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub raw: Value,
}

/// The fully parsed bundle: package name, CSV, CRDs, everything else,
/// and the property list from `metadata/properties.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryV1 {
    pub package_name: String,
    pub csv: ClusterServiceVersion,
    pub crds: Vec<CustomResourceDefinition>,
    pub others: Vec<OtherManifest>,
    pub properties: Vec<olm_entity::PropertyValue>,
}
