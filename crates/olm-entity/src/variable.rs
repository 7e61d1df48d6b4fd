//! Variables are the mutable build-time counterpart to the frozen
//! [`crate::entity::Entity`]: each one carries the constraints a variable
//! source attached to it while the resolution problem is being assembled.
//! Once assembly finishes, [`MutableVariable::freeze`] produces the
//! immutable [`Variable`] the search actually runs over.

use crate::constraint::Constraint;
use crate::property::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier for a variable. Distinct variable sources mint
/// their own ids; the resolver never interprets the string itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableId(pub String);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for VariableId {
    fn from(s: S) -> Self {
        VariableId(s.into())
    }
}

/// The variable sources that can contribute a variable to a resolution
/// problem, per spec.md §4.3. Every variable id the facade hands back to
/// a caller is tagged with the kind that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    /// A catalog bundle candidate for installation.
    Bundle,
    /// The requirement that some bundle satisfying a user-requested
    /// package be installed.
    RequiredPackage,
    /// At-most-one constraint enforcing a single installed version per
    /// package name.
    PackageUniqueness,
    /// At-most-one constraint enforcing a single provider per GVK.
    GvkUniqueness,
}

/// A variable under construction. Variable sources push constraints onto
/// it as they inspect the entity universe; nothing is frozen until
/// [`MutableVariable::freeze`] is called by the resolver facade.
#[derive(Debug, Clone)]
pub struct MutableVariable {
    id: VariableId,
    kind: VariableKind,
    properties: BTreeMap<String, PropertyValue>,
    constraints: Vec<Constraint>,
}

impl MutableVariable {
    pub fn new(id: impl Into<VariableId>, kind: VariableKind) -> Self {
        Self {
            id: id.into(),
            kind,
            properties: BTreeMap::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn id(&self) -> &VariableId {
        &self.id
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut Vec<Constraint> {
        &mut self.constraints
    }

    /// Consumes the builder, producing the immutable [`Variable`] the
    /// search operates on.
    pub fn freeze(self) -> Variable {
        Variable {
            id: self.id,
            kind: self.kind,
            properties: self.properties,
            constraints: self.constraints,
        }
    }
}

/// An immutable variable: one boolean unknown in the resolution problem,
/// plus the constraints attached to it at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    id: VariableId,
    kind: VariableKind,
    properties: BTreeMap<String, PropertyValue>,
    constraints: Vec<Constraint>,
}

impl Variable {
    pub fn id(&self) -> &VariableId {
        &self.id
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_preserves_constraints() {
        let mut mv = MutableVariable::new("bundle/a@1.0.0", VariableKind::Bundle);
        mv.add_constraint(Constraint::Mandatory);
        let v = mv.freeze();
        assert_eq!(v.constraints().len(), 1);
        assert_eq!(v.kind(), VariableKind::Bundle);
    }
}
