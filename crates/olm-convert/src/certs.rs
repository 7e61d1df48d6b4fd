//! cert-manager wiring for webhook-bearing deployments, per spec.md
//! §4.4 "Certificate wiring". Grounded on the teacher's pattern of
//! layering small, single-purpose JSON-builder helpers over an opaque
//! `serde_json::Value` pod spec (`DeploymentSpec::spec` in
//! `olm-registry::registry_v1`), the same way `model/src/resource.rs`
//! builds CRD manifests by hand rather than typing every nested field.

use crate::object::RenderedObject;
use serde_json::{json, Value};

pub const CA_INJECT_ANNOTATION: &str = "cert-manager.io/inject-ca-from";

pub const APISERVICE_CERT_MOUNT: &str = "/apiserver.local.config/certificates";
pub const WEBHOOK_CERT_MOUNT: &str = "/tmp/k8s-webhook-server/serving-certs";

pub fn issuer_name(csv_name: &str, deployment_name: &str) -> String {
    format!("{csv_name}-{deployment_name}-selfsigned")
}

pub fn certificate_name(csv_name: &str, deployment_name: &str) -> String {
    format!("{csv_name}-{deployment_name}-cert")
}

/// A self-signed `Issuer`, one per webhook-bearing deployment.
pub fn self_signed_issuer(namespace: &str, name: &str) -> RenderedObject {
    RenderedObject::new(
        "cert-manager.io/v1",
        "Issuer",
        name,
        json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Issuer",
            "metadata": {"namespace": namespace, "name": name},
            "spec": {"selfSigned": {}},
        }),
    )
    .with_namespace(namespace)
}

/// A `Certificate` for `dns_name` (`<service>.<namespace>.svc`), issued
/// by `issuer_name`, written to `secret_name`.
pub fn certificate(namespace: &str, name: &str, dns_name: &str, secret_name: &str, issuer_name: &str) -> RenderedObject {
    RenderedObject::new(
        "cert-manager.io/v1",
        "Certificate",
        name,
        json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Certificate",
            "metadata": {"namespace": namespace, "name": name},
            "spec": {
                "dnsNames": [dns_name],
                "secretName": secret_name,
                "issuerRef": {"name": issuer_name, "kind": "Issuer"},
            },
        }),
    )
    .with_namespace(namespace)
}

/// Adds the `cert-manager.io/inject-ca-from: <namespace>/<cert-name>`
/// annotation to `annotations`.
pub fn inject_ca_from(annotations: &mut std::collections::BTreeMap<String, String>, install_namespace: &str, cert_name: &str) {
    annotations.insert(CA_INJECT_ANNOTATION.to_string(), format!("{install_namespace}/{cert_name}"));
}

/// Mounts `apiservice-cert` at [`APISERVICE_CERT_MOUNT`] and
/// `webhook-cert` at [`WEBHOOK_CERT_MOUNT`] into every container of the
/// pod template embedded in `deployment_spec`, and adds the matching
/// `secret`-backed volumes at the pod-spec level, remapping
/// `tls.crt`/`tls.key` to the conventional serving-cert item names.
pub fn mount_cert_volumes(deployment_spec: &mut Value, secret_name: &str) {
    let pod_spec = deployment_spec
        .pointer_mut("/template/spec")
        .and_then(|v| v.as_object_mut());
    let Some(pod_spec) = pod_spec else { return };

    let volumes = pod_spec.entry("volumes").or_insert_with(|| json!([]));
    if let Some(arr) = volumes.as_array_mut() {
        arr.push(cert_volume("apiservice-cert", secret_name));
        arr.push(cert_volume("webhook-cert", secret_name));
    }

    let containers = pod_spec.get_mut("containers").and_then(|v| v.as_array_mut());
    if let Some(containers) = containers {
        for container in containers {
            let Some(container) = container.as_object_mut() else { continue };
            let mounts = container.entry("volumeMounts").or_insert_with(|| json!([]));
            if let Some(arr) = mounts.as_array_mut() {
                arr.push(cert_volume_mount("apiservice-cert", APISERVICE_CERT_MOUNT));
                arr.push(cert_volume_mount("webhook-cert", WEBHOOK_CERT_MOUNT));
            }
        }
    }
}

fn cert_volume(name: &str, secret_name: &str) -> Value {
    json!({
        "name": name,
        "secret": {
            "secretName": secret_name,
            "items": [
                {"key": "tls.crt", "path": "apiserver.crt"},
                {"key": "tls.key", "path": "apiserver.key"},
            ],
        },
    })
}

fn cert_volume_mount(name: &str, mount_path: &str) -> Value {
    json!({"name": name, "mountPath": mount_path})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounts_both_cert_volumes_into_every_container() {
        let mut spec = json!({
            "template": {
                "spec": {
                    "containers": [{"name": "manager"}, {"name": "sidecar"}],
                },
            },
        });
        mount_cert_volumes(&mut spec, "my-cert-secret");
        let volumes = spec.pointer("/template/spec/volumes").unwrap().as_array().unwrap();
        assert_eq!(volumes.len(), 2);
        let containers = spec.pointer("/template/spec/containers").unwrap().as_array().unwrap();
        for c in containers {
            assert_eq!(c["volumeMounts"].as_array().unwrap().len(), 2);
        }
    }
}
