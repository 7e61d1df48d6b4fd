//! One provider per GVK, per spec.md §4.3 ("GVKUniqueness"): for each
//! GVK provided by an activated bundle, create or reuse a
//! `gvk-uniqueness` variable carrying `AtMost(1, …)`.

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use crate::sources::VariableSource;
use olm_entity::{keys, Constraint, MutableVariable, Variable, VariableKind};

pub struct GvkUniqueness;

#[async_trait::async_trait]
impl VariableSource for GvkUniqueness {
    fn id(&self) -> &'static str {
        "gvk-uniqueness"
    }

    fn filter(&self, var: &Variable) -> bool {
        var.kind() == VariableKind::Bundle
    }

    async fn update(&self, builder: &mut Builder, var: &Variable, _entities: &dyn EntitySource) -> Result<()> {
        let provided = var.property(keys::GVK_PROVIDED).and_then(|v| v.as_gvk_list("bundle", keys::GVK_PROVIDED).ok()).map(|l| l.to_vec()).unwrap_or_default();

        for gvk in &provided {
            let uniqueness_id: olm_entity::VariableId = format!("gvk-uniqueness/{}", gvk.colon_triple()).into();

            if !builder.contains(&uniqueness_id) {
                let mut uniq = MutableVariable::new(uniqueness_id.clone(), VariableKind::GvkUniqueness);
                uniq.add_constraint(Constraint::AtMost { of: Vec::new(), max: 1 });
                builder.activate(uniq);
            }

            if let Some(mv) = builder.get_mut(&uniqueness_id) {
                for c in mv.constraints_mut() {
                    if let Constraint::AtMost { of, .. } = c {
                        if !of.contains(var.id()) {
                            of.push(var.id().clone());
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
