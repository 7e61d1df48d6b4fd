//! Activates bundles providing a selected bundle's required GVKs, per
//! spec.md §4.3 ("BundleGVKDependencies") — analogous to
//! [`super::BundlePackageDependencies`] but keyed on `ProvidesGVK`.

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use crate::sources::{with_entity_properties, VariableSource};
use olm_entity::{keys, ByChannelAndVersion, Constraint, MutableVariable, ProvidesGvk, Variable, VariableKind};

pub struct BundleGvkDependencies;

#[async_trait::async_trait]
impl VariableSource for BundleGvkDependencies {
    fn id(&self) -> &'static str {
        "bundle-gvk-dependencies"
    }

    fn filter(&self, var: &Variable) -> bool {
        var.kind() == VariableKind::Bundle
    }

    async fn update(&self, builder: &mut Builder, var: &Variable, entities: &dyn EntitySource) -> Result<()> {
        let required_gvks = var.property(keys::GVK_REQUIRED).and_then(|v| v.as_gvk_list("bundle", keys::GVK_REQUIRED).ok()).map(|l| l.to_vec()).unwrap_or_default();

        for gvk in &required_gvks {
            let predicate = ProvidesGvk(gvk.clone());
            let mut candidates = entities.filter(&predicate).await?;
            ByChannelAndVersion.sort(&mut candidates);

            let mut candidate_ids = Vec::with_capacity(candidates.len());
            for entity in &candidates {
                let bundle_id = entity.id().to_string();
                candidate_ids.push(bundle_id.clone().into());
                let bundle_var = with_entity_properties(MutableVariable::new(bundle_id, VariableKind::Bundle), entity);
                builder.activate(bundle_var);
            }

            // constraint id "required-gvk/<group>:<version>:<kind>" per
            // spec.md §4.3 labels this Dependency; the bundle carries the
            // requirement directly.
            if let Some(mv) = builder.get_mut(var.id()) {
                mv.add_constraint(Constraint::Dependency { of: candidate_ids });
            }
        }
        Ok(())
    }
}
