//! One bundle per package, per spec.md §4.3 ("PackageUniqueness"): for
//! each package name seen among activated bundle variables, create or
//! reuse a `package-uniqueness` variable carrying `AtMost(1, …)`.

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use crate::sources::VariableSource;
use olm_entity::{keys, Constraint, MutableVariable, Variable, VariableKind};

pub struct PackageUniqueness;

#[async_trait::async_trait]
impl VariableSource for PackageUniqueness {
    fn id(&self) -> &'static str {
        "package-uniqueness"
    }

    fn filter(&self, var: &Variable) -> bool {
        var.kind() == VariableKind::Bundle
    }

    async fn update(&self, builder: &mut Builder, var: &Variable, _entities: &dyn EntitySource) -> Result<()> {
        let package_name = match var.property(keys::PACKAGE_NAME).and_then(|v| v.as_string("bundle", keys::PACKAGE_NAME).ok()) {
            Some(n) => n.to_string(),
            None => return Ok(()),
        };

        let uniqueness_id: olm_entity::VariableId = format!("package-uniqueness/{package_name}").into();

        if !builder.contains(&uniqueness_id) {
            let mut uniq = MutableVariable::new(uniqueness_id.clone(), VariableKind::PackageUniqueness);
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
        Ok(())
    }
}
