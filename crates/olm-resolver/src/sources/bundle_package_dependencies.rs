//! Activates bundles satisfying a selected bundle's transitive package
//! requirements, per spec.md §4.3 ("BundlePackageDependencies").

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use crate::sources::{with_entity_properties, VariableSource};
use olm_entity::{keys, And, ByChannelAndVersion, Constraint, InSemverRange, MutableVariable, Variable, VariableKind, WithPackageName};

pub struct BundlePackageDependencies;

#[async_trait::async_trait]
impl VariableSource for BundlePackageDependencies {
    fn id(&self) -> &'static str {
        "bundle-package-dependencies"
    }

    fn filter(&self, var: &Variable) -> bool {
        var.kind() == VariableKind::Bundle
    }

    async fn update(&self, builder: &mut Builder, var: &Variable, entities: &dyn EntitySource) -> Result<()> {
        let requirements = var
            .property(keys::PACKAGE_REQUIRED)
            .and_then(|v| v.as_package_required_list("bundle", keys::PACKAGE_REQUIRED).ok())
            .map(|l| l.to_vec())
            .unwrap_or_default();

        for req in &requirements {
            let predicate = And(WithPackageName(req.package_name.clone()), InSemverRange(req.version_range.clone()));
            let mut candidates = entities.filter(&predicate).await?;
            ByChannelAndVersion.sort(&mut candidates);

            let mut candidate_ids = Vec::with_capacity(candidates.len());
            for entity in &candidates {
                let bundle_id = entity.id().to_string();
                candidate_ids.push(bundle_id.clone().into());
                let bundle_var = with_entity_properties(MutableVariable::new(bundle_id, VariableKind::Bundle), entity);
                builder.activate(bundle_var);
            }

            // constraint id "required-package/<name>" per spec.md §4.3 is the
            // label on this Dependency, not a separate variable: the bundle
            // itself carries the requirement that one of `candidate_ids` also
            // be selected.
            if let Some(mv) = builder.get_mut(var.id()) {
                mv.add_constraint(Constraint::Dependency { of: candidate_ids });
            }
        }
        Ok(())
    }
}
