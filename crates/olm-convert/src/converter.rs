//! The main bundle→plain-objects transform, per spec.md §4.4. Grounded
//! directly on `converter.go::Convert`, generalized to also implement
//! the webhook + cert-manager wiring that file rejects outright (see
//! DESIGN.md on why the richer `spec.md` generation is followed here).

use crate::certs;
use crate::config::ConverterConfig;
use crate::error::{self, Error, Result};
use crate::object::{Plain, RenderedObject};
use crate::rbac;
use olm_registry::{InstallModeType, RegistryV1, WebhookAdmissionType, WebhookDefinition};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Renders `rv1` into a flat list of plain Kubernetes objects targeting
/// `install_namespace` (or its spec-mandated default) and
/// `target_namespaces` (or an install-mode-inferred default).
pub fn convert(
    rv1: &RegistryV1,
    install_namespace: Option<&str>,
    target_namespaces: &[String],
    config: &ConverterConfig,
) -> Result<Plain> {
    let install_namespace = resolve_install_namespace(rv1, install_namespace);

    let supported_modes: BTreeSet<InstallModeType> = rv1
        .csv
        .install_modes
        .iter()
        .filter(|m| m.supported)
        .map(|m| m.kind)
        .collect();

    let target_namespaces = infer_target_namespaces(&supported_modes, &install_namespace, target_namespaces);
    validate_target_namespaces(&supported_modes, &install_namespace, &target_namespaces)?;

    let mut objects = Vec::new();

    let mut deployment_specs: BTreeMap<String, Value> = BTreeMap::new();
    for dep in &rv1.csv.install_strategy.deployment_specs {
        deployment_specs.insert(dep.name.clone(), dep.spec.clone());
    }

    let crd_conversions = render_webhooks_and_certs(rv1, &install_namespace, &mut deployment_specs, &mut objects)?;

    render_deployments(rv1, &install_namespace, &target_namespaces, &deployment_specs, &mut objects);
    render_rbac(rv1, &install_namespace, &target_namespaces, config, &mut objects);
    render_crds(rv1, &install_namespace, &crd_conversions, &mut objects);

    for other in &rv1.others {
        objects.push(render_other(other, &install_namespace)?);
    }

    Ok(Plain { objects })
}

fn resolve_install_namespace(rv1: &RegistryV1, install_namespace: Option<&str>) -> String {
    if let Some(ns) = install_namespace {
        if !ns.is_empty() {
            return ns.to_string();
        }
    }
    if let Some(suggested) = rv1.csv.annotations.get("operatorframework.io/suggested-namespace") {
        if !suggested.is_empty() {
            return suggested.clone();
        }
    }
    format!("{}-system", rv1.package_name)
}

fn infer_target_namespaces(supported: &BTreeSet<InstallModeType>, install_namespace: &str, given: &[String]) -> Vec<String> {
    if !given.is_empty() {
        return given.to_vec();
    }
    if supported.contains(&InstallModeType::AllNamespaces) {
        vec![String::new()]
    } else if supported.contains(&InstallModeType::OwnNamespace) {
        vec![install_namespace.to_string()]
    } else {
        Vec::new()
    }
}

fn validate_target_namespaces(supported: &BTreeSet<InstallModeType>, install_namespace: &str, targets: &[String]) -> Result<()> {
    let reject = |mode: InstallModeType, reason: &str| -> Result<()> {
        error::UnsupportedInstallModeSnafu {
            mode: format!("{mode:?}"),
            target_namespaces: targets.to_vec(),
            reason: reason.to_string(),
        }
        .fail()
        .map_err(Error::from)
    };

    if targets.len() == 1 && targets[0].is_empty() {
        if !supported.contains(&InstallModeType::AllNamespaces) {
            return reject(InstallModeType::AllNamespaces, "AllNamespaces not declared supported");
        }
        return Ok(());
    }
    if targets.len() == 1 {
        if targets[0] == install_namespace {
            if !supported.contains(&InstallModeType::OwnNamespace) {
                return reject(InstallModeType::OwnNamespace, "OwnNamespace not declared supported");
            }
        } else if !supported.contains(&InstallModeType::SingleNamespace) {
            return reject(InstallModeType::SingleNamespace, "SingleNamespace not declared supported");
        }
        return Ok(());
    }
    if targets.len() > 1 {
        if !supported.contains(&InstallModeType::MultiNamespace) {
            return reject(InstallModeType::MultiNamespace, "MultiNamespace not declared supported");
        }
        return Ok(());
    }
    reject(InstallModeType::OwnNamespace, "no install mode could be inferred from an empty target-namespace list")
}

fn render_deployments(
    rv1: &RegistryV1,
    install_namespace: &str,
    target_namespaces: &[String],
    deployment_specs: &BTreeMap<String, Value>,
    objects: &mut Vec<RenderedObject>,
) {
    let joined = target_namespaces.join(",");
    for dep in &rv1.csv.install_strategy.deployment_specs {
        let mut spec = deployment_specs.get(&dep.name).cloned().unwrap_or_else(|| dep.spec.clone());
        if let Some(template) = spec.pointer_mut("/template/metadata") {
            if let Some(obj) = template.as_object_mut() {
                let mut annotations: BTreeMap<String, String> = obj
                    .get("annotations")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                for (k, v) in &rv1.csv.annotations {
                    annotations.entry(k.clone()).or_insert_with(|| v.clone());
                }
                annotations.insert("olm.targetNamespaces".to_string(), joined.clone());
                obj.insert("annotations".to_string(), json!(annotations));
            }
        }
        objects.push(
            RenderedObject::new(
                "apps/v1",
                "Deployment",
                dep.name.clone(),
                json!({
                    "apiVersion": "apps/v1",
                    "kind": "Deployment",
                    "metadata": {"namespace": install_namespace, "name": dep.name, "labels": dep.label},
                    "spec": spec,
                }),
            )
            .with_namespace(install_namespace)
            .with_labels(dep.label.clone()),
        );
    }
}

fn render_rbac(
    rv1: &RegistryV1,
    install_namespace: &str,
    target_namespaces: &[String],
    config: &ConverterConfig,
    objects: &mut Vec<RenderedObject>,
) {
    let mut service_accounts: BTreeMap<String, RenderedObject> = BTreeMap::new();
    for dep in &rv1.csv.install_strategy.deployment_specs {
        let sa_name = deployment_service_account(&dep.spec);
        let sa_name = rbac::sa_name_or_default(&sa_name).to_string();
        service_accounts.entry(sa_name.clone()).or_insert_with(|| rbac::service_account(install_namespace, &sa_name));
    }

    let mut permissions = rv1.csv.install_strategy.permissions.clone();
    let mut cluster_permissions = rv1.csv.install_strategy.cluster_permissions.clone();

    for p in permissions.iter().chain(cluster_permissions.iter()) {
        let sa_name = rbac::sa_name_or_default(&p.service_account_name).to_string();
        service_accounts.entry(sa_name.clone()).or_insert_with(|| rbac::service_account(install_namespace, &sa_name));
    }

    let all_namespaces_mode = target_namespaces.len() == 1 && target_namespaces[0].is_empty();
    if all_namespaces_mode {
        if config.inject_namespace_watch_rule {
            for p in permissions.iter_mut() {
                p.rules.push(olm_registry::PolicyRule {
                    api_groups: vec!["".to_string()],
                    resources: vec!["namespaces".to_string()],
                    verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
                    resource_names: Vec::new(),
                });
            }
        }
        cluster_permissions.extend(permissions.drain(..));
    }

    for obj in service_accounts.into_values() {
        if obj.name != "default" {
            objects.push(obj);
        }
    }

    for ns in target_namespaces {
        if ns.is_empty() {
            continue;
        }
        for p in &permissions {
            let sa_name = rbac::sa_name_or_default(&p.service_account_name);
            let name = rbac::generate_name(&format!("{}-{}", rv1.csv.name, sa_name), &p.rules, config.max_name_length);
            objects.push(rbac::role(ns, &name, &p.rules));
            objects.push(rbac::role_binding(ns, &name, &name, install_namespace, sa_name));
        }
    }

    for p in &cluster_permissions {
        let sa_name = rbac::sa_name_or_default(&p.service_account_name);
        let name = rbac::generate_name(&format!("{}-{}", rv1.csv.name, sa_name), &p.rules, config.max_name_length);
        objects.push(rbac::cluster_role(&name, &p.rules));
        objects.push(rbac::cluster_role_binding(&name, &name, install_namespace, sa_name));
    }
}

fn deployment_service_account(spec: &Value) -> String {
    spec.pointer("/template/spec/serviceAccountName")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Groups webhook definitions by deployment, aggregates one `Service`
/// per deployment, emits the admission-webhook configuration objects,
/// rewrites conversion-bearing CRDs, and wires a self-signed `Issuer` +
/// `Certificate` (mounted into the deployment's pod template) for every
/// deployment that hosts at least one webhook.
fn render_webhooks_and_certs(
    rv1: &RegistryV1,
    install_namespace: &str,
    deployment_specs: &mut BTreeMap<String, Value>,
    objects: &mut Vec<RenderedObject>,
) -> Result<BTreeMap<String, (Value, String)>> {
    if rv1.csv.webhook_definitions.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut by_deployment: BTreeMap<String, Vec<&WebhookDefinition>> = BTreeMap::new();
    for wh in &rv1.csv.webhook_definitions {
        if !deployment_specs.contains_key(&wh.deployment_name) {
            return error::UnknownWebhookDeploymentSnafu {
                name: wh.generate_name.clone(),
                deployment: wh.deployment_name.clone(),
            }
            .fail()
            .map_err(Error::from);
        }
        by_deployment.entry(wh.deployment_name.clone()).or_default().push(wh);
    }

    let crd_index: BTreeMap<&str, usize> = rv1.crds.iter().enumerate().map(|(i, c)| (c.name.as_str(), i)).collect();
    let mut crd_conversions: BTreeMap<String, (Value, String)> = BTreeMap::new();

    for (deployment_name, webhooks) in &by_deployment {
        let service_name = format!("{deployment_name}-service");
        let cert_name = certs::certificate_name(&rv1.csv.name, deployment_name);
        let issuer_name = certs::issuer_name(&rv1.csv.name, deployment_name);
        let dns_name = format!("{service_name}.{install_namespace}.svc");
        let secret_name = cert_name.clone();

        let mut ports: BTreeMap<u16, u16> = BTreeMap::new();
        for wh in webhooks {
            ports.insert(wh.container_port, wh.target_port.unwrap_or(wh.container_port));
        }
        let mut service = service_with_ports(install_namespace, &service_name, &ports);
        certs::inject_ca_from(&mut service.annotations, install_namespace, &cert_name);
        objects.push(service);

        objects.push(certs::self_signed_issuer(install_namespace, &issuer_name));
        objects.push(certs::certificate(install_namespace, &cert_name, &dns_name, &secret_name, &issuer_name));

        if let Some(spec) = deployment_specs.get_mut(deployment_name) {
            certs::mount_cert_volumes(spec, &secret_name);
        }

        for wh in webhooks {
            match wh.kind {
                WebhookAdmissionType::ValidatingAdmissionWebhook => {
                    objects.push(admission_webhook_config(
                        "ValidatingWebhookConfiguration",
                        wh,
                        install_namespace,
                        &service_name,
                        &cert_name,
                    ));
                }
                WebhookAdmissionType::MutatingAdmissionWebhook => {
                    objects.push(admission_webhook_config(
                        "MutatingWebhookConfiguration",
                        wh,
                        install_namespace,
                        &service_name,
                        &cert_name,
                    ));
                }
                WebhookAdmissionType::ConversionWebhook => {
                    for crd_name in &wh.conversion_crds {
                        if !crd_index.contains_key(crd_name.as_str()) {
                            return error::UnknownConversionCrdSnafu {
                                name: wh.generate_name.clone(),
                                crd: crd_name.clone(),
                            }
                            .fail()
                            .map_err(Error::from);
                        }
                        crd_conversions.insert(
                            crd_name.clone(),
                            (
                                json!({
                                    "strategy": "Webhook",
                                    "webhook": {
                                        "clientConfig": {
                                            "service": {
                                                "namespace": install_namespace,
                                                "name": service_name,
                                                "path": wh.webhook_path,
                                                "port": wh.container_port,
                                            },
                                        },
                                        "conversionReviewVersions": wh.conversion_review_versions,
                                    },
                                }),
                                cert_name.clone(),
                            ),
                        );
                    }
                }
            }
        }
    }

    Ok(crd_conversions)
}

/// Renders every CRD, rewriting `spec.conversion` and annotating
/// `cert-manager.io/inject-ca-from` for the ones with a conversion
/// webhook attached.
fn render_crds(rv1: &RegistryV1, install_namespace: &str, crd_conversions: &BTreeMap<String, (Value, String)>, objects: &mut Vec<RenderedObject>) {
    for crd in &rv1.crds {
        let mut raw = crd.raw.clone();
        let conversion_cert = crd_conversions.get(&crd.name);
        if let Some((conversion, _)) = conversion_cert {
            if let Some(spec) = raw.get_mut("spec").and_then(|v| v.as_object_mut()) {
                spec.insert("conversion".to_string(), conversion.clone());
            }
        }
        let mut rendered = RenderedObject::new("apiextensions.k8s.io/v1", "CustomResourceDefinition", crd.name.clone(), raw);
        if let Some((_, cert_name)) = conversion_cert {
            certs::inject_ca_from(&mut rendered.annotations, install_namespace, cert_name);
        }
        objects.push(rendered);
    }
}

fn service_with_ports(namespace: &str, name: &str, ports: &BTreeMap<u16, u16>) -> RenderedObject {
    let port_entries: Vec<Value> = ports
        .iter()
        .map(|(port, target)| json!({"name": port.to_string(), "port": port, "targetPort": target}))
        .collect();
    RenderedObject::new(
        "v1",
        "Service",
        name,
        json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"namespace": namespace, "name": name},
            "spec": {"ports": port_entries},
        }),
    )
    .with_namespace(namespace)
}

fn admission_webhook_config(kind: &str, wh: &WebhookDefinition, namespace: &str, service_name: &str, cert_name: &str) -> RenderedObject {
    let mut rendered = RenderedObject::new(
        "admissionregistration.k8s.io/v1",
        kind,
        wh.generate_name.clone(),
        json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": kind,
            "metadata": {"name": wh.generate_name},
            "webhooks": [{
                "name": wh.generate_name,
                "clientConfig": {
                    "service": {
                        "namespace": namespace,
                        "name": service_name,
                        "path": wh.webhook_path,
                        "port": wh.container_port,
                    },
                },
            }],
        }),
    );
    certs::inject_ca_from(&mut rendered.annotations, namespace, cert_name);
    rendered
}

/// Supported registry+v1 "Other" kinds, `(kind, namespaced)` — stands in
/// for `operator-registry`'s `bundle.IsSupported`.
const ALLOWED_OTHER_KINDS: &[(&str, bool)] = &[
    ("Service", true),
    ("ConfigMap", true),
    ("Secret", true),
    ("PrometheusRule", true),
    ("ServiceMonitor", true),
    ("PodMonitor", true),
    ("PodDisruptionBudget", true),
    ("NetworkPolicy", true),
    ("VerticalPodAutoscaler", true),
    ("Ingress", true),
    ("PriorityClass", false),
    ("ConsoleYAMLSample", false),
    ("ConsoleQuickStart", false),
    ("ConsoleCLIDownload", false),
    ("ConsoleLink", false),
];

#[cfg(test)]
mod tests {
    use super::*;
    use olm_registry::{
        ClusterServiceVersion, CustomResourceDefinition, DeploymentSpec, InstallMode, InstallModeType, InstallStrategy,
        OtherManifest, Permission, PolicyRule, RegistryV1,
    };
    use std::collections::BTreeMap;

    fn base_rv1() -> RegistryV1 {
        RegistryV1 {
            package_name: "etcd".to_string(),
            csv: ClusterServiceVersion {
                name: "etcd-operator.v0.9.4".to_string(),
                annotations: BTreeMap::new(),
                install_modes: vec![InstallMode { kind: InstallModeType::AllNamespaces, supported: true }],
                install_strategy: InstallStrategy {
                    deployment_specs: vec![DeploymentSpec {
                        name: "etcd-operator".to_string(),
                        label: BTreeMap::new(),
                        spec: json!({"template": {"metadata": {}, "spec": {"containers": [{"name": "operator"}]}}}),
                    }],
                    permissions: vec![Permission {
                        service_account_name: "etcd-operator".to_string(),
                        rules: vec![PolicyRule {
                            api_groups: vec!["".to_string()],
                            resources: vec!["pods".to_string()],
                            verbs: vec!["get".to_string(), "list".to_string()],
                            resource_names: vec![],
                        }],
                    }],
                    cluster_permissions: vec![],
                },
                webhook_definitions: vec![],
            },
            crds: vec![CustomResourceDefinition {
                name: "etcdclusters.etcd.database.coreos.com".to_string(),
                group: "etcd.database.coreos.com".to_string(),
                raw: json!({"apiVersion": "apiextensions.k8s.io/v1", "kind": "CustomResourceDefinition", "metadata": {"name": "etcdclusters.etcd.database.coreos.com"}, "spec": {"group": "etcd.database.coreos.com"}}),
            }],
            others: vec![],
            properties: vec![],
        }
    }

    #[test]
    fn all_namespaces_promotes_permissions_to_cluster_scope() {
        let rv1 = base_rv1();
        let plain = convert(&rv1, None, &[], &ConverterConfig::default()).expect("convert should succeed");
        let cluster_roles: Vec<_> = plain.objects.iter().filter(|o| o.kind == "ClusterRole").collect();
        assert_eq!(cluster_roles.len(), 1);
        let roles: Vec<_> = plain.objects.iter().filter(|o| o.kind == "Role").collect();
        assert!(roles.is_empty(), "AllNamespaces mode should not emit namespaced Roles");

        let rules = cluster_roles[0].raw["rules"].as_array().unwrap();
        let has_namespace_watch = rules.iter().any(|r| {
            r["resources"].as_array().map(|a| a.iter().any(|v| v == "namespaces")).unwrap_or(false)
        });
        assert!(has_namespace_watch, "expected the injected namespaces watch rule");
    }

    #[test]
    fn own_namespace_without_support_is_rejected() {
        let mut rv1 = base_rv1();
        rv1.csv.install_modes = vec![InstallMode { kind: InstallModeType::OwnNamespace, supported: false }];
        let err = convert(&rv1, None, &[], &ConverterConfig::default()).expect_err("should reject unsupported install mode");
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn single_namespace_emits_role_per_target_namespace() {
        let mut rv1 = base_rv1();
        rv1.csv.install_modes = vec![InstallMode { kind: InstallModeType::MultiNamespace, supported: true }];
        let targets = vec!["team-a".to_string(), "team-b".to_string()];
        let plain = convert(&rv1, Some("etcd-system"), &targets, &ConverterConfig::default()).expect("convert should succeed");
        let roles: Vec<_> = plain.objects.iter().filter(|o| o.kind == "Role").collect();
        assert_eq!(roles.len(), 2);
    }

    #[test]
    fn unsupported_other_kind_is_rejected() {
        let mut rv1 = base_rv1();
        rv1.others.push(OtherManifest {
            api_version: "v1".to_string(),
            kind: "Pod".to_string(),
            name: "stray".to_string(),
            namespace: None,
            raw: json!({}),
        });
        let err = convert(&rv1, None, &[], &ConverterConfig::default()).expect_err("Pod should be unsupported");
        assert!(err.to_string().contains("unsupported resource"));
    }

    #[test]
    fn webhook_deployment_gets_service_issuer_certificate_and_mounted_volumes() {
        let mut rv1 = base_rv1();
        rv1.csv.webhook_definitions = vec![WebhookDefinition {
            generate_name: "vetcdclusters.kb.io".to_string(),
            kind: WebhookAdmissionType::ValidatingAdmissionWebhook,
            deployment_name: "etcd-operator".to_string(),
            container_port: 443,
            target_port: Some(9443),
            webhook_path: "/validate".to_string(),
            conversion_crds: vec![],
            conversion_review_versions: vec!["v1".to_string()],
        }];
        let plain = convert(&rv1, None, &[], &ConverterConfig::default()).expect("convert should succeed");

        assert!(plain.objects.iter().any(|o| o.kind == "Issuer"));
        assert!(plain.objects.iter().any(|o| o.kind == "Certificate"));
        assert!(plain.objects.iter().any(|o| o.kind == "ValidatingWebhookConfiguration"));

        let service = plain.objects.iter().find(|o| o.kind == "Service").expect("service should be rendered");
        assert_eq!(service.annotations.get(certs::CA_INJECT_ANNOTATION).map(String::as_str), Some("etcd-system/etcd-operator.v0.9.4-etcd-operator-cert"));

        let deployment = plain.objects.iter().find(|o| o.kind == "Deployment").expect("deployment should be rendered");
        let mounts = deployment.raw.pointer("/spec/template/spec/containers/0/volumeMounts").and_then(|v| v.as_array());
        assert_eq!(mounts.map(|v| v.len()), Some(2));
    }
}

fn render_other(other: &olm_registry::OtherManifest, install_namespace: &str) -> Result<RenderedObject> {
    let namespaced = ALLOWED_OTHER_KINDS
        .iter()
        .find(|(kind, _)| *kind == other.kind)
        .map(|(_, namespaced)| *namespaced)
        .ok_or(())
        .map_err(|_| {
            Error::from(
                error::UnsupportedResourceSnafu {
                    name: other.name.clone(),
                    kind: other.kind.clone(),
                }
                .build(),
            )
        })?;

    let mut raw = other.raw.clone();
    if namespaced {
        if let Some(meta) = raw.get_mut("metadata").and_then(|v| v.as_object_mut()) {
            meta.insert("namespace".to_string(), json!(install_namespace));
        }
    }
    let mut rendered = RenderedObject::new(other.api_version.clone(), other.kind.clone(), other.name.clone(), raw);
    if namespaced {
        rendered = rendered.with_namespace(install_namespace);
    }
    Ok(rendered)
}
