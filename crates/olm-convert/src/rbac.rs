//! RBAC object synthesis, grounded on `converter.go`'s
//! `newServiceAccount`/`newRole`/`newClusterRole`/`newRoleBinding`/
//! `newClusterRoleBinding`/`generateName` helpers.

use crate::object::RenderedObject;
use olm_registry::PolicyRule;
use serde_json::json;

/// A stable, deterministic FNV-1a hex digest of `rules`, truncated to 10
/// hex characters — stands in for `util.DeepHashObject` (no hashing
/// crate is in the teacher's dependency set; FNV-1a is a one-function,
/// dependency-free way to keep name suffixes deterministic and distinct
/// enough for this purpose).
pub fn hash_rules(rules: &[PolicyRule]) -> String {
    let canonical = serde_json::to_string(rules).unwrap_or_default();
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in canonical.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{hash:016x}")[..10].to_string()
}

/// `base-<hash>`, truncating `base` so the whole name stays within
/// `max_name_length`, per `converter.go::generateName`.
pub fn generate_name(base: &str, rules: &[PolicyRule], max_name_length: usize) -> String {
    let hash = hash_rules(rules);
    let base = if base.len() + hash.len() + 1 > max_name_length {
        let keep = max_name_length.saturating_sub(hash.len() + 1);
        &base[..base.len().min(keep)]
    } else {
        base
    };
    format!("{base}-{hash}")
}

pub fn sa_name_or_default(sa_name: &str) -> &str {
    if sa_name.is_empty() {
        "default"
    } else {
        sa_name
    }
}

pub fn service_account(namespace: &str, name: &str) -> RenderedObject {
    RenderedObject::new(
        "v1",
        "ServiceAccount",
        name,
        json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"namespace": namespace, "name": name},
        }),
    )
    .with_namespace(namespace)
}

fn rules_json(rules: &[PolicyRule]) -> serde_json::Value {
    serde_json::to_value(rules).unwrap_or_default()
}

pub fn role(namespace: &str, name: &str, rules: &[PolicyRule]) -> RenderedObject {
    RenderedObject::new(
        "rbac.authorization.k8s.io/v1",
        "Role",
        name,
        json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "Role",
            "metadata": {"namespace": namespace, "name": name},
            "rules": rules_json(rules),
        }),
    )
    .with_namespace(namespace)
}

pub fn cluster_role(name: &str, rules: &[PolicyRule]) -> RenderedObject {
    RenderedObject::new(
        "rbac.authorization.k8s.io/v1",
        "ClusterRole",
        name,
        json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRole",
            "metadata": {"name": name},
            "rules": rules_json(rules),
        }),
    )
}

pub fn role_binding(namespace: &str, name: &str, role_name: &str, sa_namespace: &str, sa_name: &str) -> RenderedObject {
    RenderedObject::new(
        "rbac.authorization.k8s.io/v1",
        "RoleBinding",
        name,
        json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "RoleBinding",
            "metadata": {"namespace": namespace, "name": name},
            "subjects": [{"kind": "ServiceAccount", "namespace": sa_namespace, "name": sa_name}],
            "roleRef": {"apiGroup": "rbac.authorization.k8s.io", "kind": "Role", "name": role_name},
        }),
    )
    .with_namespace(namespace)
}

pub fn cluster_role_binding(name: &str, role_name: &str, sa_namespace: &str, sa_name: &str) -> RenderedObject {
    RenderedObject::new(
        "rbac.authorization.k8s.io/v1",
        "ClusterRoleBinding",
        name,
        json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRoleBinding",
            "metadata": {"name": name},
            "subjects": [{"kind": "ServiceAccount", "namespace": sa_namespace, "name": sa_name}],
            "roleRef": {"apiGroup": "rbac.authorization.k8s.io", "kind": "ClusterRole", "name": role_name},
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_name_truncates_to_fit() {
        let rules = vec![PolicyRule {
            api_groups: vec!["".into()],
            resources: vec!["pods".into()],
            verbs: vec!["get".into()],
            resource_names: vec![],
        }];
        let long_base = "x".repeat(100);
        let name = generate_name(&long_base, &rules, 63);
        assert!(name.len() <= 63, "name {} exceeds 63 chars", name.len());
        assert!(name.ends_with(&hash_rules(&rules)));
    }

    #[test]
    fn hash_is_stable_for_identical_rules() {
        let rules = vec![PolicyRule {
            api_groups: vec!["apps".into()],
            resources: vec!["deployments".into()],
            verbs: vec!["get".into(), "list".into()],
            resource_names: vec![],
        }];
        assert_eq!(hash_rules(&rules), hash_rules(&rules));
    }
}
