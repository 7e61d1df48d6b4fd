//! The closed set of constraint shapes a variable can carry, per
//! spec.md §4.3. Variable sources attach these; the search (in
//! `olm-resolver`) is the only thing that interprets them.

use crate::variable::VariableId;
use serde::{Deserialize, Serialize};

/// A constraint attached to a [`crate::variable::Variable`].
///
/// `Dependency` and `Conflict`/`AtMost` carry the *other* variables the
/// constraint relates to by id, not by reference — the search resolves
/// ids against the frozen [`crate::litmap::LitMapping`] at solve time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// This variable must be true in every solution.
    Mandatory,
    /// This variable must be false in every solution.
    Prohibited,
    /// If this variable is true, at least one of `of` must also be true.
    Dependency { of: Vec<VariableId> },
    /// This variable cannot be true at the same time as any of `with`.
    Conflict { with: Vec<VariableId> },
    /// At most one variable among `of` (which may or may not include the
    /// variable this constraint is attached to) may be true at once.
    AtMost { of: Vec<VariableId>, max: usize },
}

impl Constraint {
    /// Human-readable reason string, used when a variable with this
    /// constraint ends up in an unsatisfiable core.
    pub fn describe(&self) -> String {
        match self {
            Constraint::Mandatory => "mandatory".to_string(),
            Constraint::Prohibited => "prohibited".to_string(),
            Constraint::Dependency { of } => {
                format!(
                    "requires one of [{}]",
                    of.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Constraint::Conflict { with } => {
                format!(
                    "conflicts with [{}]",
                    with.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Constraint::AtMost { of, max } => {
                format!(
                    "at most {} of [{}]",
                    max,
                    of.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_dependency() {
        let c = Constraint::Dependency {
            of: vec![VariableId::from("a"), VariableId::from("b")],
        };
        assert_eq!(c.describe(), "requires one of [a, b]");
    }
}
