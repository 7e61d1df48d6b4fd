//! The `ClusterExtensionRevision` CRD, per spec.md §6. Grounded on
//! `model/src/test.rs`/`model/src/resource.rs`'s
//! `#[derive(CustomResource)]` + `schemars::JsonSchema` pattern; the
//! condition reason-string table is carried verbatim from
//! `clusterextensionrevision_types.go`'s constants (Design Notes §9:
//! "stable string formats ... are part of the public surface").

use crate::phase::PhaseName;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const CONDITION_TYPE_AVAILABLE: &str = "Available";
pub const CONDITION_TYPE_SUCCEEDED: &str = "Succeeded";
pub const CONDITION_TYPE_PROGRESSING: &str = "Progressing";

pub const REASON_AVAILABLE: &str = "Available";
pub const REASON_RECONCILE_FAILURE: &str = "ReconcileFailure";
pub const REASON_REVISION_VALIDATION_FAILURE: &str = "RevisionValidationFailure";
pub const REASON_PHASE_VALIDATION_ERROR: &str = "PhaseValidationError";
pub const REASON_OBJECT_COLLISIONS: &str = "ObjectCollisions";
pub const REASON_ROLLOUT_SUCCESS: &str = "RolloutSuccess";
pub const REASON_PROBE_FAILURE: &str = "ProbeFailure";
pub const REASON_INCOMPLETE: &str = "Incomplete";
pub const REASON_PROGRESSING: &str = "Progressing";
pub const REASON_ARCHIVED: &str = "Archived";
pub const REASON_MIGRATED: &str = "Migrated";

/// `spec.lifecycleState` — Active (default) and Paused are freely
/// interchangeable; Archived is a one-way terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum LifecycleState {
    Active,
    Paused,
    Archived,
}

impl Default for LifecycleState {
    fn default() -> Self {
        LifecycleState::Active
    }
}

/// `collisionProtection` on an embedded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum CollisionProtection {
    Prevent,
    IfNoController,
    None,
}

impl Default for CollisionProtection {
    fn default() -> Self {
        CollisionProtection::Prevent
    }
}

/// One embedded object: a whitelisted metadata subset plus
/// `collisionProtection`. Status fields are never carried.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisionObject {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// The object's `spec` (and any other non-metadata, non-status
    /// top-level fields), kept opaque.
    pub raw: Value,
    #[serde(default)]
    pub collision_protection: CollisionProtection,
}

/// A group of objects applied simultaneously.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RevisionPhase {
    pub name: PhaseName,
    pub objects: Vec<RevisionObject>,
}

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, Serialize)]
#[kube(
    derive = "PartialEq",
    group = "olm.operatorframework.io",
    kind = "ClusterExtensionRevision",
    plural = "clusterextensionrevisions",
    singular = "clusterextensionrevision",
    status = "ClusterExtensionRevisionStatus",
    version = "v1",
    printcolumn = r#"{"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type=='Available')].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterExtensionRevisionSpec {
    #[serde(default)]
    pub lifecycle_state: LifecycleState,
    /// Positive, unique per owning `ClusterExtension`, monotonically
    /// increasing by exactly one — enforced in `olm-core`'s pipeline,
    /// not by the CRD schema (cross-object invariants aren't
    /// expressible in OpenAPI validation alone).
    pub revision: i64,
    #[serde(default)]
    pub phases: Vec<RevisionPhase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterExtensionRevisionStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// A minimal stand-in for `metav1.Condition` — `kube`'s own `Condition`
/// type requires a full `k8s_openapi` apimachinery dependency wiring
/// this crate doesn't otherwise need; the four fields here are exactly
/// what spec.md §4.6/§6 reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}
