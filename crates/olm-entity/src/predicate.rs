//! Predicate combinators over [`Entity`], per spec.md §4.1. Variable
//! sources filter the entity universe with these instead of writing ad
//! hoc boolean logic, so the same four primitives end up driving every
//! source in `olm-resolver`.

use crate::entity::Entity;
use semver::VersionReq;

/// A reusable, composable test over an [`Entity`].
pub trait Predicate {
    fn matches(&self, entity: &Entity) -> bool;

    fn and<P: Predicate>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And(self, other)
    }

    fn or<P: Predicate>(self, other: P) -> Or<Self, P>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    fn negate(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

pub struct And<A, B>(A, B);
impl<A: Predicate, B: Predicate> Predicate for And<A, B> {
    fn matches(&self, entity: &Entity) -> bool {
        self.0.matches(entity) && self.1.matches(entity)
    }
}

pub struct Or<A, B>(A, B);
impl<A: Predicate, B: Predicate> Predicate for Or<A, B> {
    fn matches(&self, entity: &Entity) -> bool {
        self.0.matches(entity) || self.1.matches(entity)
    }
}

pub struct Not<A>(A);
impl<A: Predicate> Predicate for Not<A> {
    fn matches(&self, entity: &Entity) -> bool {
        !self.0.matches(entity)
    }
}

/// Matches entities whose `olm.package.name` equals `name`.
pub struct WithPackageName(pub String);
impl Predicate for WithPackageName {
    fn matches(&self, entity: &Entity) -> bool {
        entity.package_name().map(|n| n == self.0).unwrap_or(false)
    }
}

/// Matches entities whose `olm.package.version` falls inside `range`.
pub struct InSemverRange(pub VersionReq);
impl Predicate for InSemverRange {
    fn matches(&self, entity: &Entity) -> bool {
        entity
            .version()
            .map(|v| self.0.matches(&v))
            .unwrap_or(false)
    }
}

/// Matches entities whose `olm.package.channel` name equals `channel`.
pub struct InChannel(pub String);
impl Predicate for InChannel {
    fn matches(&self, entity: &Entity) -> bool {
        entity
            .channel()
            .map(|c| c.name == self.0)
            .unwrap_or(false)
    }
}

/// Matches entities that provide the given GVK among `olm.gvk.provided`.
pub struct ProvidesGvk(pub crate::property::Gvk);
impl Predicate for ProvidesGvk {
    fn matches(&self, entity: &Entity) -> bool {
        entity.provided_gvks().iter().any(|g| g == &self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{keys, PropertyValue};
    use std::collections::BTreeMap;

    fn bundle(name: &str, version: &str) -> Entity {
        let mut props = BTreeMap::new();
        props.insert(
            keys::PACKAGE_NAME.to_string(),
            PropertyValue::String(name.to_string()),
        );
        props.insert(
            keys::PACKAGE_VERSION.to_string(),
            PropertyValue::String(version.to_string()),
        );
        Entity::new(format!("{name}/{version}"), props)
    }

    #[test]
    fn and_combinator_requires_both() {
        let e = bundle("acme", "1.2.0");
        let p = WithPackageName("acme".into())
            .and(InSemverRange(VersionReq::parse(">=1.0.0, <2.0.0").unwrap()));
        assert!(p.matches(&e));

        let p2 = WithPackageName("acme".into())
            .and(InSemverRange(VersionReq::parse(">=2.0.0").unwrap()));
        assert!(!p2.matches(&e));
    }

    #[test]
    fn negate_flips_result() {
        let e = bundle("acme", "1.2.0");
        let p = WithPackageName("other".into()).negate();
        assert!(p.matches(&e));
    }
}
