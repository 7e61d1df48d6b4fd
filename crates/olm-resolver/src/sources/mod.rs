//! Variable sources, per spec.md §4.3: each seeds or augments the
//! resolution problem in a declared order, filtering which already-active
//! variables trigger its own `update`. The builder drives every source to
//! completion (`update` for each matching variable, then `finalize`)
//! before moving to the next source.

mod bundle_gvk_dependencies;
mod bundle_package_dependencies;
mod gvk_uniqueness;
mod package_uniqueness;
mod required_package_bundles;
mod required_packages;

pub use bundle_gvk_dependencies::BundleGvkDependencies;
pub use bundle_package_dependencies::BundlePackageDependencies;
pub use gvk_uniqueness::GvkUniqueness;
pub use package_uniqueness::PackageUniqueness;
pub use required_package_bundles::RequiredPackageBundles;
pub use required_packages::RequiredPackages;

/// `RequiredPackages` seeds the problem directly from the caller's
/// `Desire` list rather than reacting to already-activated variables, so
/// it does not implement [`VariableSource`] — there is nothing for it to
/// `filter` on. It runs once, before the generic source loop.

use crate::entity_source::EntitySource;
use crate::error::Result;
use crate::problem::Builder;
use olm_entity::{keys, Entity, MutableVariable, PropertyValue, Variable};

/// Copies every bundle-relevant property off `entity` onto `var`, so that
/// later sources (`BundlePackageDependencies`, `BundleGvkDependencies`,
/// `GvkUniqueness`) can read it straight off the activated bundle
/// variable rather than needing the catalog `Entity` again.
pub(crate) fn with_entity_properties(mut var: MutableVariable, entity: &Entity) -> MutableVariable {
    if let Ok(name) = entity.package_name() {
        var = var.with_property(keys::PACKAGE_NAME, PropertyValue::String(name.to_string()));
    }
    if let Ok(path) = entity.bundle_path() {
        var = var.with_property(keys::BUNDLE_PATH, PropertyValue::String(path.to_string()));
    }
    if let Some(version) = entity.property(keys::PACKAGE_VERSION) {
        var = var.with_property(keys::PACKAGE_VERSION, version.clone());
    }
    if let Some(channel) = entity.property(keys::PACKAGE_CHANNEL) {
        var = var.with_property(keys::PACKAGE_CHANNEL, channel.clone());
    }
    if !entity.provided_gvks().is_empty() {
        var = var.with_property(keys::GVK_PROVIDED, PropertyValue::GvkList(entity.provided_gvks().to_vec()));
    }
    if !entity.required_gvks().is_empty() {
        var = var.with_property(keys::GVK_REQUIRED, PropertyValue::GvkList(entity.required_gvks().to_vec()));
    }
    if !entity.required_packages().is_empty() {
        var = var.with_property(keys::PACKAGE_REQUIRED, PropertyValue::PackageRequiredList(entity.required_packages().to_vec()));
    }
    var
}

/// A single pass over the resolution problem under construction. Sources
/// run in declaration order; each sees every variable already activated
/// by itself or an earlier source whose id passes its own `filter`.
#[async_trait::async_trait]
pub trait VariableSource: Send + Sync {
    /// Stable identifier, used only for diagnostics/logging.
    fn id(&self) -> &'static str;

    /// Whether `var` should be passed to `update`.
    fn filter(&self, var: &Variable) -> bool;

    /// Inspects `var` (already activated) and may activate further
    /// variables into `builder`, attaching constraints as it goes.
    async fn update(&self, builder: &mut Builder, var: &Variable, entities: &dyn EntitySource) -> Result<()>;

    /// Runs once after every already-activated variable has been offered
    /// to `update` and no new variables were activated in the pass. Most
    /// sources have nothing to do here.
    async fn finalize(&self, _builder: &mut Builder, _entities: &dyn EntitySource) -> Result<()> {
        Ok(())
    }
}
