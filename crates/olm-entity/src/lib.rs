//! Data model shared by every stage of the resolution and rollout
//! pipeline: entities, variables, constraints, and the literal mapping
//! and ordering the search and facade build on top of.
//!
//! This crate is pure data — no I/O, no search. Behavior lives in
//! `olm-resolver`, `olm-registry`, `olm-convert`, and `olm-revision`.

pub mod constraint;
pub mod entity;
pub mod error;
pub mod litmap;
pub mod predicate;
pub mod property;
pub mod sort;
pub mod variable;

pub use constraint::Constraint;
pub use entity::{Entity, EntityId};
pub use error::{Error, Result};
pub use litmap::{Lit, LitMapping};
pub use predicate::{And, InChannel, InSemverRange, Not, Or, Predicate, ProvidesGvk, WithPackageName};
pub use property::{keys, parse_version_req, Channel, Gvk, PackageRequired, PropertyValue};
pub use sort::ByChannelAndVersion;
pub use variable::{MutableVariable, Variable, VariableId, VariableKind};
