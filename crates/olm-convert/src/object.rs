//! The converter's output shape: a flat list of plain Kubernetes objects
//! (no CSV, no bundle metadata), each carrying just enough identity for
//! the phase engine to route it — grounded on `convert.Plain` in
//! `converter.go`, which is itself a thin `[]client.Object` wrapper.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One rendered object. `raw` holds the full JSON body (including
/// `metadata`/`spec`); the identity fields are duplicated out for cheap
/// access by the phase engine and tests, the same convenience-accessor
/// idiom the teacher applies over its raw CRD blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedObject {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub raw: Value,
}

impl RenderedObject {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, name: impl Into<String>, raw: Value) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            namespace: None,
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            raw,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// `(group, kind)` — the key the phase engine's static table is
    /// indexed by. `api_version` is `group/version` or just `version`
    /// for the core group.
    pub fn group_kind(&self) -> (String, String) {
        let group = self.api_version.split_once('/').map(|(g, _)| g).unwrap_or("").to_string();
        (group, self.kind.clone())
    }
}

/// The full converter output: every object the bundle renders to,
/// ungrouped and unsorted — `olm-revision::phase` does the grouping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plain {
    pub objects: Vec<RenderedObject>,
}
