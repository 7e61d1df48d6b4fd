//! The static GroupKind → Phase table and intra-phase sort, per
//! spec.md §4.5. Grounded verbatim on `phaseGKMap`/`determinePhase`/
//! `compareClusterExtensionRevisionObjects`/`PhaseSort` in
//! `internal/operator-controller/applier/phase.go`. `PhaseName` reuses
//! the teacher's validated-newtype idiom (`model/src/agent.rs::SecretName`):
//! a `lazy_static` regex, a `Snafu`-reported validation error, and a
//! hand-written `JsonSchema` impl so the CRD's OpenAPI schema still
//! carries the pattern constraint.

use crate::error::{self, Error, Result};
use olm_convert::RenderedObject;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::cmp::Ordering;

/// The 13 well-known phases, in their fixed rollout order.
pub const PHASE_ORDER: &[&str] = &[
    "namespaces",
    "policies",
    "identity",
    "configuration",
    "storage",
    "crds",
    "roles",
    "bindings",
    "infrastructure",
    "deploy",
    "scaling",
    "publish",
    "admission",
];

/// Objects whose GroupKind isn't in the table default here — the
/// lowest-risk catch-all, since runtime-installed CRDs may depend on
/// e.g. cert-manager `Certificate`s being created alongside deployments.
pub const DEFAULT_PHASE: &str = "deploy";

/// `(group, kind)` → phase name, exactly the `phaseGKMap` table.
const GK_TABLE: &[(&str, &str, &str)] = &[
    ("", "Namespace", "namespaces"),
    ("networking.k8s.io", "NetworkPolicy", "policies"),
    ("policy", "PodDisruptionBudget", "policies"),
    ("scheduling.k8s.io", "PriorityClass", "policies"),
    ("", "ServiceAccount", "identity"),
    ("", "Secret", "configuration"),
    ("", "ConfigMap", "configuration"),
    ("", "PersistentVolume", "storage"),
    ("", "PersistentVolumeClaim", "storage"),
    ("storage.k8s.io", "StorageClass", "storage"),
    ("apiextensions.k8s.io", "CustomResourceDefinition", "crds"),
    ("rbac.authorization.k8s.io", "ClusterRole", "roles"),
    ("rbac.authorization.k8s.io", "Role", "roles"),
    ("rbac.authorization.k8s.io", "ClusterRoleBinding", "bindings"),
    ("rbac.authorization.k8s.io", "RoleBinding", "bindings"),
    ("", "Service", "infrastructure"),
    ("cert-manager.io", "Issuer", "infrastructure"),
    ("cert-manager.io", "Certificate", "deploy"),
    ("apps", "Deployment", "deploy"),
    ("autoscaling.k8s.io", "VerticalPodAutoscaler", "scaling"),
    ("monitoring.coreos.com", "PrometheusRule", "publish"),
    ("monitoring.coreos.com", "ServiceMonitor", "publish"),
    ("monitoring.coreos.com", "PodMonitor", "publish"),
    ("networking.k8s.io", "Ingress", "publish"),
    ("route.openshift.io", "Route", "publish"),
    ("console.openshift.io", "ConsoleYAMLSample", "publish"),
    ("console.openshift.io", "ConsoleQuickStart", "publish"),
    ("console.openshift.io", "ConsoleCLIDownload", "publish"),
    ("console.openshift.io", "ConsoleLink", "publish"),
    ("console.openshift.io", "ConsolePlugin", "publish"),
    ("admissionregistration.k8s.io", "ValidatingWebhookConfiguration", "admission"),
    ("admissionregistration.k8s.io", "MutatingWebhookConfiguration", "admission"),
];

/// Returns the phase name for `(group, kind)`, defaulting to
/// [`DEFAULT_PHASE`] for anything not in the table.
pub fn determine_phase(group: &str, kind: &str) -> &'static str {
    GK_TABLE
        .iter()
        .find(|(g, k, _)| *g == group && *k == kind)
        .map(|(_, _, phase)| *phase)
        .unwrap_or(DEFAULT_PHASE)
}

/// A validated phase name: a DNS label, `^[a-z]([-a-z0-9]*[a-z0-9])?$`,
/// at most 63 characters, per `clusterextensionrevision_types.go`'s
/// `ClusterExtensionRevisionPhase.Name` marker comments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PhaseName(String);

const PHASE_NAME_PATTERN: &str = r"^[a-z]([-a-z0-9]*[a-z0-9])?$";

lazy_static::lazy_static! {
    static ref PHASE_NAME_REGEX: regex::Regex = regex::Regex::new(PHASE_NAME_PATTERN).expect("static pattern is valid");
}

impl PhaseName {
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        ensure!(
            name.len() <= 63 && PHASE_NAME_REGEX.is_match(&name),
            error::InvalidPhaseNameSnafu {
                name: name.clone(),
                pattern: PHASE_NAME_PATTERN,
            }
        );
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for PhaseName {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        PhaseName::new(raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for PhaseName {
    fn schema_name() -> String {
        "PhaseName".into()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                max_length: Some(63),
                min_length: None,
                pattern: Some(PHASE_NAME_PATTERN.to_string()),
            })),
            ..SchemaObject::default()
        }
        .into()
    }
}

/// A single phase: its validated name and the objects assigned to it,
/// already sorted by `(Group, Version, Kind, Namespace, Name)`.
#[derive(Debug, Clone)]
pub struct SortedPhase {
    pub name: PhaseName,
    pub objects: Vec<RenderedObject>,
}

fn object_sort_key(o: &RenderedObject) -> (String, String, String, String, String) {
    let (group, version) = match o.api_version.split_once('/') {
        Some((g, v)) => (g.to_string(), v.to_string()),
        None => (String::new(), o.api_version.clone()),
    };
    (group, version, o.kind.clone(), o.namespace.clone().unwrap_or_default(), o.name.clone())
}

fn compare_objects(a: &RenderedObject, b: &RenderedObject) -> Ordering {
    object_sort_key(a).cmp(&object_sort_key(b))
}

/// Groups `objects` into phases by GroupKind, sorts each phase
/// deterministically, and emits only the phases (in fixed order) that
/// have at least one object — `PhaseSort` in `phase.go`.
pub fn phase_sort(objects: Vec<RenderedObject>) -> Vec<SortedPhase> {
    use std::collections::BTreeMap;

    let mut by_phase: BTreeMap<&'static str, Vec<RenderedObject>> = BTreeMap::new();
    for obj in objects {
        let (group, _) = obj.group_kind();
        let phase = determine_phase(&group, &obj.kind);
        by_phase.entry(phase).or_default().push(obj);
    }

    let mut out = Vec::new();
    for &phase in PHASE_ORDER {
        if let Some(mut objs) = by_phase.remove(phase) {
            objs.sort_by(compare_objects);
            out.push(SortedPhase {
                name: PhaseName::new(phase).expect("built-in phase names are always valid"),
                objects: objs,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn namespace_and_deployment_land_in_expected_phases() {
        assert_eq!(determine_phase("", "Namespace"), "namespaces");
        assert_eq!(determine_phase("apps", "Deployment"), "deploy");
        assert_eq!(determine_phase("cert-manager.io", "Issuer"), "infrastructure");
        assert_eq!(determine_phase("cert-manager.io", "Certificate"), "deploy");
    }

    #[test]
    fn unknown_group_kind_defaults_to_deploy() {
        assert_eq!(determine_phase("example.com", "Widget"), DEFAULT_PHASE);
    }

    #[test]
    fn phase_name_rejects_uppercase_and_overlong_names() {
        assert!(PhaseName::new("Namespaces").is_err());
        assert!(PhaseName::new("a".repeat(64)).is_err());
        assert!(PhaseName::new("namespaces").is_ok());
    }

    #[test]
    fn phase_sort_orders_by_fixed_phase_sequence_then_intra_phase_key() {
        let deployment = RenderedObject::new("apps/v1", "Deployment", "z-app", json!({}));
        let namespace = RenderedObject::new("v1", "Namespace", "my-ns", json!({}));
        let crd = RenderedObject::new("apiextensions.k8s.io/v1", "CustomResourceDefinition", "widgets.example.com", json!({}));

        let phases = phase_sort(vec![deployment, crd, namespace]);
        let names: Vec<&str> = phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["namespaces", "crds", "deploy"]);
    }

    #[test]
    fn intra_phase_objects_are_sorted_deterministically() {
        let b = RenderedObject::new("v1", "ConfigMap", "b", json!({})).with_namespace("ns");
        let a = RenderedObject::new("v1", "ConfigMap", "a", json!({})).with_namespace("ns");
        let phases = phase_sort(vec![b, a]);
        let names: Vec<&str> = phases[0].objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
