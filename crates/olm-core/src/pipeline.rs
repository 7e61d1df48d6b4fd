//! Ties the resolver, bundle reader, converter, and phase/revision
//! machinery into the single end-to-end flow spec.md §1 describes:
//! "resolve a declarative package desire into a bundle, convert
//! registry+v1 bundle content into plain objects, and phase those
//! objects into a `ClusterExtensionRevision`."

use crate::config::CoreConfig;
use crate::error::{self, Error, Result};
use async_trait::async_trait;
use olm_entity::{Entity, WithPackageName};
use olm_registry::BundleFs;
use olm_resolver::{Desire, EntitySource, Resolver};
use olm_revision::crd::{CollisionProtection, RevisionPhase};
use olm_revision::{next_revision_number, phase_sort, validate_revision_sequence, PhaseName, Revision};
use snafu::ResultExt;
use std::future::Future;

/// Fetches the unpacked bundle filesystem for a selected entity.
/// Implementations own however bundle content actually gets pulled
/// (registry image, local cache, test fixture); this crate only needs
/// the resulting [`BundleFs`] view.
#[async_trait]
pub trait BundleProvider: Send + Sync {
    async fn fetch(&self, bundle_id: &str) -> std::result::Result<Box<dyn BundleFs>, String>;
}

fn revision_object_from(o: &olm_convert::RenderedObject) -> olm_revision::crd::RevisionObject {
    olm_revision::crd::RevisionObject {
        api_version: o.api_version.clone(),
        kind: o.kind.clone(),
        name: o.name.clone(),
        namespace: o.namespace.clone(),
        labels: o.labels.clone(),
        annotations: o.annotations.clone(),
        raw: o.raw.clone(),
        collision_protection: CollisionProtection::default(),
    }
}

/// Resolves `desire` against `entities`, fetches the bundle content for
/// the bundle selected to satisfy it, converts that bundle into plain
/// objects, and phase-sorts them into a fresh [`Revision`] numbered per
/// `existing_revision_numbers`.
///
/// Dependency bundles the resolver pulls in to satisfy constraints are
/// validated for existence but are not themselves rendered here — each
/// `ClusterExtension` owns only its own bundle's revision, matching
/// spec.md §1's singular "a bundle".
pub async fn resolve_and_render<C>(
    desire: &Desire,
    entities: &dyn EntitySource,
    bundles: &dyn BundleProvider,
    install_namespace: Option<&str>,
    target_namespaces: &[String],
    config: &CoreConfig,
    existing_revision_numbers: &[i64],
    cancel: C,
) -> Result<Revision>
where
    C: Future<Output = ()> + Unpin,
{
    let resolver = Resolver::new();
    let solution = resolver
        .resolve(std::slice::from_ref(desire), entities, cancel)
        .await
        .context(error::ResolveSnafu)?;

    let anchor = find_anchor_bundle(entities, &desire.package_name, solution.selected_bundles()).await?;

    let bundle_fs = bundles
        .fetch(anchor.id().0.as_str())
        .await
        .map_err(|reason| error::BundleFetchSnafu { bundle_id: anchor.id().0.clone(), reason }.build())
        .map_err(Error::from)?;

    let registry_v1 = olm_registry::parse(bundle_fs.as_ref()).context(error::BundleParseSnafu)?;

    let converter_config = config.converter_config();
    let plain = olm_convert::convert(&registry_v1, install_namespace, target_namespaces, &converter_config)
        .context(error::ConvertSnafu)?;

    let sorted = phase_sort(plain.objects);
    let phases: Vec<RevisionPhase> = sorted
        .into_iter()
        .map(|p| RevisionPhase {
            name: p.name,
            objects: p.objects.iter().map(revision_object_from).collect(),
        })
        .collect();

    let revision_number = next_revision_number(existing_revision_numbers);
    validate_revision_sequence(existing_revision_numbers, revision_number)
        .context(error::InvalidRevisionSequenceSnafu)?;

    log::info!(
        "rendered revision {} for package '{}' across {} phase(s)",
        revision_number,
        desire.package_name,
        phases.len()
    );

    Ok(Revision::new(revision_number, phases))
}

/// Finds which selected bundle entity satisfies `package_name` itself
/// (as opposed to a transitive dependency also present in the
/// solution).
async fn find_anchor_bundle(
    entities: &dyn EntitySource,
    package_name: &str,
    selected: &[olm_entity::VariableId],
) -> Result<Entity> {
    let candidates = entities
        .filter(&WithPackageName(package_name.to_string()))
        .await
        .context(error::ResolveSnafu)?;

    candidates
        .into_iter()
        .find(|e| selected.iter().any(|id| id.0 == e.id().0))
        .ok_or_else(|| error::NoBundleSelectedSnafu { package_name: package_name.to_string() }.build())
        .map_err(Error::from)
}

/// A validated, caller-supplied rollout namespace set, mirroring the
/// `PhaseName` validated-newtype idiom for the one other free-text input
/// this pipeline accepts from outside.
pub fn validate_target_namespaces(target_namespaces: &[String]) -> Result<()> {
    for ns in target_namespaces {
        if ns.is_empty() {
            continue;
        }
        PhaseName::new(ns.clone()).map_err(|_| {
            Error::from(error::InvalidInputSnafu { reason: format!("'{ns}' is not a valid namespace name") }.build())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use olm_entity::{keys, PropertyValue};
    use std::collections::BTreeMap;
    use std::future::ready;

    struct StaticCatalog(Vec<Entity>);

    #[async_trait]
    impl EntitySource for StaticCatalog {
        async fn filter(&self, predicate: &dyn olm_entity::Predicate) -> olm_resolver::Result<Vec<Entity>> {
            Ok(self.0.iter().filter(|e| predicate.matches(e)).cloned().collect())
        }
    }

    struct NoopBundles;

    #[async_trait]
    impl BundleProvider for NoopBundles {
        async fn fetch(&self, _bundle_id: &str) -> std::result::Result<Box<dyn BundleFs>, String> {
            Err("not implemented in this test".to_string())
        }
    }

    fn bundle_entity(name: &str, version: &str) -> Entity {
        let mut props = BTreeMap::new();
        props.insert(keys::PACKAGE_NAME.to_string(), PropertyValue::String(name.to_string()));
        props.insert(keys::PACKAGE_VERSION.to_string(), PropertyValue::String(version.to_string()));
        Entity::new(format!("{name}/{version}"), props)
    }

    #[tokio::test]
    async fn missing_bundle_fetch_surfaces_as_bundle_fetch_error() {
        let catalog = StaticCatalog(vec![bundle_entity("etcd", "1.0.0")]);
        let desire = Desire::new("etcd");
        let config = CoreConfig::default();
        let err = resolve_and_render(&desire, &catalog, &NoopBundles, None, &[], &config, &[], ready(()))
            .await
            .unwrap_err();
        assert!(format!("{err}").contains("fetch"));
    }

    #[test]
    fn empty_and_blank_namespaces_are_always_valid() {
        assert!(validate_target_namespaces(&["".to_string()]).is_ok());
        assert!(validate_target_namespaces(&["team-a".to_string()]).is_ok());
        assert!(validate_target_namespaces(&["Not Valid".to_string()]).is_err());
    }
}
