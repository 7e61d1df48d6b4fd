//! Orchestrates the variable sources, builds the problem, invokes the
//! search, and returns a `Solution` — spec.md §4.3 ("Resolver façade").

use crate::desire::Desire;
use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::{Builder, Solution};
use crate::search;
use crate::sources::{
    BundleGvkDependencies, BundlePackageDependencies, GvkUniqueness, PackageUniqueness, RequiredPackageBundles,
    RequiredPackages, VariableSource,
};
use olm_entity::Variable;
use std::future::Future;

/// Runs every non-seed variable source, in the declared order, to a
/// fixpoint: each source is offered every variable currently activated
/// that passes its `filter`, repeating until a full pass activates
/// nothing new.
pub struct Resolver {
    sources: Vec<Box<dyn VariableSource>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            sources: vec![
                Box::new(RequiredPackageBundles),
                Box::new(BundlePackageDependencies),
                Box::new(BundleGvkDependencies),
                Box::new(PackageUniqueness),
                Box::new(GvkUniqueness),
            ],
        }
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `desires` against `entities`, returning a satisfiable
    /// `Solution` or an `Error` (including `ResolutionUnsatisfiable` with
    /// its core attached).
    pub async fn resolve<C>(&self, desires: &[Desire], entities: &dyn EntitySource, cancel: C) -> Result<Solution>
    where
        C: Future<Output = ()> + Unpin,
    {
        let mut builder = Builder::new();
        RequiredPackages::seed(&mut builder, desires);

        let mut offered: Vec<olm_entity::VariableId> = Vec::new();
        loop {
            let pending: Vec<Variable> = builder
                .build_snapshot_variables()
                .into_iter()
                .filter(|v| !offered.contains(v.id()))
                .collect();
            if pending.is_empty() {
                break;
            }
            for var in &pending {
                offered.push(var.id().clone());
                for source in &self.sources {
                    if source.filter(var) {
                        source.update(&mut builder, var, entities).await?;
                    }
                }
            }
        }
        for source in &self.sources {
            source.finalize(&mut builder, entities).await?;
        }

        let problem = builder.build();
        search::solve(&problem, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use olm_entity::{keys, Entity, PropertyValue};
    use std::collections::BTreeMap;
    use std::future::ready;

    struct StaticCatalog(Vec<Entity>);

    #[async_trait]
    impl EntitySource for StaticCatalog {
        async fn filter(&self, predicate: &dyn olm_entity::Predicate) -> Result<Vec<Entity>> {
            Ok(self.0.iter().filter(|e| predicate.matches(e)).cloned().collect())
        }
    }

    fn bundle_entity(name: &str, version: &str) -> Entity {
        let mut props = BTreeMap::new();
        props.insert(keys::PACKAGE_NAME.to_string(), PropertyValue::String(name.to_string()));
        props.insert(keys::PACKAGE_VERSION.to_string(), PropertyValue::String(version.to_string()));
        Entity::new(format!("{name}/{version}"), props)
    }

    #[tokio::test]
    async fn resolves_newest_in_range() {
        let catalog = StaticCatalog(vec![
            bundle_entity("p", "1.0.0"),
            bundle_entity("p", "1.1.0"),
            bundle_entity("p", "2.0.0"),
        ]);
        let resolver = Resolver::new();
        let desire = Desire::new("p").with_version_range(semver::VersionReq::parse("^1.0.0").unwrap());
        let solution = resolver.resolve(&[desire], &catalog, ready(())).await.unwrap();
        assert_eq!(solution.selected_bundles(), &["p/1.1.0".into()]);
    }

    #[tokio::test]
    async fn two_packages_providing_the_same_gvk_are_unsatisfiable() {
        use olm_entity::Gvk;

        let gvk = Gvk::new("g", "v", "K");
        let gvk_providing_bundle = |name: &str| {
            let mut props = BTreeMap::new();
            props.insert(keys::PACKAGE_NAME.to_string(), PropertyValue::String(name.to_string()));
            props.insert(keys::PACKAGE_VERSION.to_string(), PropertyValue::String("1.0.0".to_string()));
            props.insert(keys::GVK_PROVIDED.to_string(), PropertyValue::GvkList(vec![gvk.clone()]));
            Entity::new(format!("{name}/1.0.0"), props)
        };
        let b1 = gvk_providing_bundle("b1");
        let b2 = gvk_providing_bundle("b2");

        let catalog = StaticCatalog(vec![b1, b2]);
        let resolver = Resolver::new();
        let desires = vec![Desire::new("b1"), Desire::new("b2")];
        let err = resolver.resolve(&desires, &catalog, ready(())).await.unwrap_err();

        let core = err.unsatisfiable_core().expect("expected an unsatisfiable-core error");
        assert!(core.iter().any(|id| id == &format!("gvk-uniqueness/{}", gvk.colon_triple())));
    }
}
