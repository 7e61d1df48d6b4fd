//! Queries the entity source for bundles satisfying a `required-package`
//! variable, per spec.md §4.3 ("RequiredPackageBundles").

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use crate::sources::{with_entity_properties, VariableSource};
use olm_entity::{keys, ByChannelAndVersion, Constraint, Entity, MutableVariable, Predicate, Variable, VariableKind};
use semver::VersionReq;

/// Matches candidate bundles for one `required-package` variable: package
/// name always, version range and channel only when the desire specified
/// them. Kept as a single predicate (rather than nesting the generic
/// `And`/`Or` combinators) because the optional fields would otherwise
/// need a different combinator type per combination.
struct CandidateFilter {
    package_name: String,
    version_range: Option<VersionReq>,
    channel: Option<String>,
}

impl Predicate for CandidateFilter {
    fn matches(&self, entity: &Entity) -> bool {
        if entity.package_name().map(|n| n != self.package_name).unwrap_or(true) {
            return false;
        }
        if let Some(range) = &self.version_range {
            if !entity.version().map(|v| range.matches(&v)).unwrap_or(false) {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if entity.channel().map(|c| &c.name != channel).unwrap_or(true) {
                return false;
            }
        }
        true
    }
}

pub struct RequiredPackageBundles;

#[async_trait::async_trait]
impl VariableSource for RequiredPackageBundles {
    fn id(&self) -> &'static str {
        "required-package-bundles"
    }

    fn filter(&self, var: &Variable) -> bool {
        var.kind() == VariableKind::RequiredPackage
    }

    async fn update(&self, builder: &mut Builder, var: &Variable, entities: &dyn EntitySource) -> Result<()> {
        let package_name = match var
            .property(keys::PACKAGE_NAME)
            .and_then(|v| v.as_string("required-package", keys::PACKAGE_NAME).ok())
        {
            Some(n) => n.to_string(),
            None => return Ok(()),
        };

        let version_range = var
            .property(keys::PACKAGE_VERSION)
            .and_then(|v| v.as_string("required-package", keys::PACKAGE_VERSION).ok())
            .and_then(|range| olm_entity::parse_version_req(range).ok());

        let channel = var
            .property(keys::PACKAGE_CHANNEL)
            .and_then(|v| v.as_channel("required-package", keys::PACKAGE_CHANNEL).ok())
            .map(|c| c.name.clone());

        let filter = CandidateFilter {
            package_name: package_name.clone(),
            version_range,
            channel,
        };

        let mut candidates = entities.filter(&filter).await?;
        ByChannelAndVersion.sort(&mut candidates);

        let mut candidate_ids = Vec::with_capacity(candidates.len());
        for entity in &candidates {
            let bundle_id = entity.id().to_string();
            candidate_ids.push(bundle_id.clone().into());

            let bundle_var = with_entity_properties(MutableVariable::new(bundle_id, VariableKind::Bundle), entity);
            builder.activate(bundle_var);
        }

        if let Some(mv) = builder.get_mut(var.id()) {
            mv.add_constraint(Constraint::Dependency { of: candidate_ids });
        }

        Ok(())
    }
}
