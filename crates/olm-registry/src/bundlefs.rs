//! A filesystem view over an unpacked bundle, per spec.md §6: required
//! layout is `metadata/annotations.yaml` (must carry the package
//! annotation), optional `metadata/properties.yaml`, and `manifests/`
//! (one CSV, any CRDs, any other kinds). Missing any required piece is a
//! parse error.

use crate::error::{self, Error, Result};
use crate::registry_v1::{ClusterServiceVersion, CustomResourceDefinition, OtherManifest, RegistryV1};
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::BTreeMap;

pub const PATH_ANNOTATIONS: &str = "metadata/annotations.yaml";
pub const PATH_PROPERTIES: &str = "metadata/properties.yaml";
pub const PATH_MANIFESTS: &str = "manifests";

const PACKAGE_ANNOTATION_KEY: &str = "operators.operatorframework.io.bundle.package.v1";

/// Read-only filesystem view over an unpacked bundle. Implementations
/// may be backed by an extracted tarball on disk, an in-memory fixture
/// (tests), or any other store; the converter and resolver never depend
/// on the concrete backing.
pub trait BundleFs {
    /// Returns the raw bytes at `path`, or `None` if it doesn't exist.
    fn read(&self, path: &str) -> Option<Vec<u8>>;

    /// Lists the file paths directly under `manifests/`.
    fn manifest_paths(&self) -> Vec<String>;
}

/// A `BundleFs` backed by an in-memory map, used by tests and by callers
/// that have already unpacked a bundle image into memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBundleFs {
    files: BTreeMap<String, Vec<u8>>,
}

impl InMemoryBundleFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl BundleFs for InMemoryBundleFs {
    fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }

    fn manifest_paths(&self) -> Vec<String> {
        let prefix = format!("{PATH_MANIFESTS}/");
        self.files.keys().filter(|k| k.starts_with(&prefix)).cloned().collect()
    }
}

#[derive(Debug, Deserialize)]
struct Annotations {
    annotations: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "type")]
    kind: String,
    value: serde_json::Value,
}

/// A manifest file is either the CSV (`kind: ClusterServiceVersion`), a
/// CRD (`kind: CustomResourceDefinition`), or anything else.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(rename = "apiVersion")]
    api_version: String,
    kind: String,
    metadata: RawMetadata,
    #[serde(flatten)]
    rest: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

/// Parses `fs` into a [`RegistryV1`].
pub fn parse(fs: &dyn BundleFs) -> Result<RegistryV1> {
    let annotations_bytes = match fs.read(PATH_ANNOTATIONS) {
        Some(bytes) => bytes,
        None => return error::MissingPathSnafu { path: PATH_ANNOTATIONS }.fail().map_err(Error::from),
    };
    let annotations: Annotations = serde_yaml::from_slice(&annotations_bytes).context(error::YamlSnafu {
        path: PATH_ANNOTATIONS.to_string(),
    })?;
    let package_name = match annotations.annotations.get(PACKAGE_ANNOTATION_KEY) {
        Some(name) => name.clone(),
        None => {
            return error::MissingPackageAnnotationSnafu {
                path: PATH_ANNOTATIONS,
                key: PACKAGE_ANNOTATION_KEY,
            }
            .fail()
            .map_err(Error::from)
        }
    };

    let properties = match fs.read(PATH_PROPERTIES) {
        Some(bytes) => {
            #[derive(Deserialize)]
            struct PropertiesFile {
                #[serde(default)]
                properties: Vec<RawProperty>,
            }
            let parsed: PropertiesFile = serde_yaml::from_slice(&bytes).context(error::YamlSnafu {
                path: PATH_PROPERTIES.to_string(),
            })?;
            parsed.properties
        }
        None => Vec::new(),
    };
    let properties = properties.into_iter().map(raw_property_to_value).collect();

    let manifest_paths = fs.manifest_paths();
    if manifest_paths.is_empty() {
        return error::MissingPathSnafu { path: PATH_MANIFESTS }.fail().map_err(Error::from);
    }

    let mut csvs = Vec::new();
    let mut crds = Vec::new();
    let mut others = Vec::new();

    for path in &manifest_paths {
        let bytes = fs.read(path).expect("path came from manifest_paths");
        let raw: RawManifest = serde_yaml::from_slice(&bytes).context(error::YamlSnafu { path: path.clone() })?;
        match raw.kind.as_str() {
            "ClusterServiceVersion" => csvs.push(parse_csv(raw)?),
            "CustomResourceDefinition" => crds.push(parse_crd(raw)),
            _ => others.push(parse_other(raw)),
        }
    }

    if csvs.len() != 1 {
        return error::WrongCsvCountSnafu { count: csvs.len() }.fail().map_err(Error::from);
    }

    Ok(RegistryV1 {
        package_name,
        csv: csvs.remove(0),
        crds,
        others,
        properties,
    })
}

/// Bundle-declared properties (`{type: ..., value: ...}` entries in
/// `metadata/properties.yaml`) arrive as loosely-typed JSON; only the raw
/// string form is kept here; `olm-convert` reinterprets the handful of
/// well-known types (`olm.gvk`, `olm.package.required`, ...) into typed
/// [`olm_entity::PropertyValue`] entries on the bundle's entity.
fn raw_property_to_value(p: RawProperty) -> olm_entity::PropertyValue {
    let rendered = match p.value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    olm_entity::PropertyValue::String(format!("{}={}", p.kind, rendered))
}

fn parse_csv(raw: RawManifest) -> Result<ClusterServiceVersion> {
    #[derive(Deserialize)]
    struct Spec {
        #[serde(default)]
        annotations: BTreeMap<String, String>,
        #[serde(rename = "installModes", default)]
        install_modes: Vec<crate::registry_v1::InstallMode>,
        install: InstallSpec,
        #[serde(rename = "webhookdefinitions", default)]
        webhook_definitions: Vec<crate::registry_v1::WebhookDefinition>,
        #[serde(rename = "apiservicedefinitions", default)]
        api_service_definitions: serde_json::Value,
    }
    #[derive(Deserialize)]
    struct InstallSpec {
        spec: crate::registry_v1::InstallStrategy,
    }
    #[derive(Deserialize)]
    struct Wrapper {
        spec: Spec,
    }
    let wrapper: Wrapper = serde_json::from_value(raw.rest).context(error::YamlSnafu {
        path: "manifests/<csv>".to_string(),
    })?;
    let has_api_service_definitions = match &wrapper.spec.api_service_definitions {
        serde_json::Value::Object(m) => m.get("owned").map(|v| !v.as_array().map(|a| a.is_empty()).unwrap_or(true)).unwrap_or(false),
        _ => false,
    };
    if has_api_service_definitions {
        return error::UnsupportedApiServiceDefinitionsSnafu { csv_name: raw.metadata.name }
            .fail()
            .map_err(Error::from);
    }
    Ok(ClusterServiceVersion {
        name: raw.metadata.name,
        annotations: wrapper.spec.annotations,
        install_modes: wrapper.spec.install_modes,
        install_strategy: wrapper.spec.install.spec,
        webhook_definitions: wrapper.spec.webhook_definitions,
    })
}

fn parse_crd(raw: RawManifest) -> CustomResourceDefinition {
    let group = raw.rest.get("spec").and_then(|s| s.get("group")).and_then(|g| g.as_str()).unwrap_or_default().to_string();
    CustomResourceDefinition {
        name: raw.metadata.name,
        group,
        raw: raw.rest,
    }
}

fn parse_other(raw: RawManifest) -> OtherManifest {
    OtherManifest {
        api_version: raw.api_version,
        kind: raw.kind,
        name: raw.metadata.name,
        namespace: raw.metadata.namespace,
        raw: raw.rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_csv() -> &'static str {
        r#"
apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcd-operator.v0.9.4
spec:
  installModes:
    - type: AllNamespaces
      supported: true
  install:
    strategy: deployment
    spec:
      deployments:
        - name: etcd-operator
          spec: {}
"#
    }

    fn bundle_with(manifests: &[(&str, &str)]) -> InMemoryBundleFs {
        let mut fs = InMemoryBundleFs::new().with_file(
            PATH_ANNOTATIONS,
            "annotations:\n  operators.operatorframework.io.bundle.package.v1: etcd\n",
        );
        for (name, contents) in manifests {
            fs = fs.with_file(format!("{PATH_MANIFESTS}/{name}"), *contents);
        }
        fs
    }

    #[test]
    fn parses_package_name_and_single_csv() {
        let fs = bundle_with(&[("csv.yaml", minimal_csv())]);
        let parsed = parse(&fs).expect("parse should succeed");
        assert_eq!(parsed.package_name, "etcd");
        assert_eq!(parsed.csv.name, "etcd-operator.v0.9.4");
        assert_eq!(parsed.csv.install_strategy.deployment_specs.len(), 1);
    }

    #[test]
    fn missing_package_annotation_is_an_error() {
        let fs = InMemoryBundleFs::new()
            .with_file(PATH_ANNOTATIONS, "annotations:\n  some.other.key: v\n")
            .with_file(format!("{PATH_MANIFESTS}/csv.yaml"), minimal_csv());
        let err = parse(&fs).expect_err("missing package annotation should fail");
        assert!(err.to_string().contains("package annotation"));
    }

    #[test]
    fn zero_or_many_csvs_is_an_error() {
        let fs = bundle_with(&[("csv.yaml", minimal_csv()), ("csv2.yaml", minimal_csv())]);
        let err = parse(&fs).expect_err("two CSVs should fail");
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn owned_api_service_definitions_are_rejected() {
        let csv = r#"
apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcd-operator.v0.9.4
spec:
  installModes:
    - type: AllNamespaces
      supported: true
  install:
    strategy: deployment
    spec:
      deployments:
        - name: etcd-operator
          spec: {}
  apiservicedefinitions:
    owned:
      - group: etcd.database.coreos.com
        version: v1
        kind: EtcdBackup
"#;
        let fs = bundle_with(&[("csv.yaml", csv)]);
        let err = parse(&fs).expect_err("owned apiServiceDefinitions should be rejected");
        assert!(err.to_string().contains("apiServiceDefinitions"));
    }

    #[test]
    fn crds_and_other_manifests_are_classified() {
        let crd = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: etcdclusters.etcd.database.coreos.com
spec:
  group: etcd.database.coreos.com
"#;
        let svc = r#"
apiVersion: v1
kind: Service
metadata:
  name: etcd-operator-metrics
  namespace: placeholder
"#;
        let fs = bundle_with(&[("csv.yaml", minimal_csv()), ("crd.yaml", crd), ("svc.yaml", svc)]);
        let parsed = parse(&fs).expect("parse should succeed");
        assert_eq!(parsed.crds.len(), 1);
        assert_eq!(parsed.crds[0].group, "etcd.database.coreos.com");
        assert_eq!(parsed.others.len(), 1);
        assert_eq!(parsed.others[0].kind, "Service");
    }
}
