//! Seeds the problem with one anchor variable per caller-declared
//! package desire, per spec.md §4.3 ("RequiredPackages").

use crate::desire::Desire;
use crate::problem::Builder;
use olm_entity::{keys, Channel, Constraint, MutableVariable, PropertyValue, VariableKind};

pub struct RequiredPackages;

impl RequiredPackages {
    /// Activates a `required-package/<name>` variable for each `desire`,
    /// carrying package name, version range, channel, and a `Mandatory`
    /// constraint. The `Dependency("choose-from", …)` constraint
    /// listing candidate bundles is attached later by
    /// [`super::RequiredPackageBundles`].
    pub fn seed(builder: &mut Builder, desires: &[Desire]) {
        for desire in desires {
            let mut var = MutableVariable::new(desire.variable_id(), VariableKind::RequiredPackage)
                .with_property(keys::PACKAGE_NAME, PropertyValue::String(desire.package_name.clone()));

            if let Some(range) = &desire.version_range {
                var = var.with_property(keys::PACKAGE_VERSION, PropertyValue::String(range.to_string()));
            }
            if let Some(channel) = &desire.channel {
                var = var.with_property(
                    keys::PACKAGE_CHANNEL,
                    PropertyValue::Channel(Channel {
                        name: channel.clone(),
                        replaces: None,
                    }),
                );
            }

            var.add_constraint(Constraint::Mandatory);
            builder.activate(var);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_one_mandatory_variable_per_desire() {
        let mut builder = Builder::new();
        RequiredPackages::seed(&mut builder, &[Desire::new("acme-operator")]);
        let problem = builder.build();
        assert_eq!(problem.anchors().len(), 1);
        assert_eq!(problem.anchors()[0].to_string(), "required-package/acme-operator");
    }
}
