//! The resolution problem under construction, plus its frozen snapshot.
//! Grounded on spec.md §3 (`ResolutionProblem`, `Solution`) and §4.3
//! (activation is idempotent by identifier, last-writer-wins on property
//! merge, constraints append).

use olm_entity::{Constraint, LitMapping, MutableVariable, Variable, VariableId};
use std::collections::BTreeMap;

/// A resolution problem under construction. Variable sources call
/// [`Builder::activate`] to register or augment a variable; activation is
/// idempotent by identifier — reactivating merges the new variable's
/// properties (last writer wins) and appends its constraints to whatever
/// is already registered.
#[derive(Debug, Default)]
pub struct Builder {
    variables: BTreeMap<VariableId, MutableVariable>,
    /// Preserves first-activation order, so the final `LitMapping` is
    /// deterministic across runs with the same inputs.
    order: Vec<VariableId>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `var`, or merges it into the existing variable with the
    /// same id. Returns the id for convenience.
    pub fn activate(&mut self, var: MutableVariable) -> VariableId {
        let id = var.id().clone();
        match self.variables.get_mut(&id) {
            Some(existing) => {
                for c in var.constraints() {
                    existing.add_constraint(c.clone());
                }
            }
            None => {
                self.order.push(id.clone());
                self.variables.insert(id.clone(), var);
            }
        }
        id
    }

    pub fn contains(&self, id: &VariableId) -> bool {
        self.variables.contains_key(id)
    }

    pub fn get_mut(&mut self, id: &VariableId) -> Option<&mut MutableVariable> {
        self.variables.get_mut(id)
    }

    /// A read-only snapshot of every variable activated so far, in
    /// first-activation order, without consuming the builder. Used by the
    /// facade to drive repeated source passes to a fixpoint.
    pub fn build_snapshot_variables(&self) -> Vec<Variable> {
        self.order.iter().map(|id| self.variables[id].clone().freeze()).collect()
    }

    /// Freezes every variable and builds the lit mapping. Variable order
    /// in the resulting `ResolutionProblem` matches first-activation
    /// order.
    pub fn build(self) -> ResolutionProblem {
        let variables: Vec<Variable> = self
            .order
            .iter()
            .map(|id| self.variables[id].clone().freeze())
            .collect();
        let lits = LitMapping::build(&variables);
        let anchors = variables
            .iter()
            .filter(|v| v.constraints().iter().any(|c| *c == Constraint::Mandatory))
            .map(|v| v.id().clone())
            .collect();
        ResolutionProblem {
            variables,
            lits,
            anchors,
        }
    }
}

/// Immutable post-build snapshot: the full variable set, the frozen
/// literal mapping, and the anchor variables (those carrying
/// `Mandatory`) the search must satisfy.
#[derive(Debug)]
pub struct ResolutionProblem {
    variables: Vec<Variable>,
    lits: LitMapping,
    anchors: Vec<VariableId>,
}

impl ResolutionProblem {
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: &VariableId) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id() == id)
    }

    pub fn lits(&self) -> &LitMapping {
        &self.lits
    }

    pub fn anchors(&self) -> &[VariableId] {
        &self.anchors
    }
}

/// Mapping from variable identifier to boolean assignment, plus the
/// selected bundle variables in search order. Carries a minimal
/// unsatisfiable core when `satisfiable` is false.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    assignments: BTreeMap<VariableId, bool>,
    selected_bundles: Vec<VariableId>,
    satisfiable: bool,
    core: Vec<VariableId>,
}

impl Solution {
    pub fn satisfiable(satisfiable_assignments: BTreeMap<VariableId, bool>, selected_bundles: Vec<VariableId>) -> Self {
        Self {
            assignments: satisfiable_assignments,
            selected_bundles,
            satisfiable: true,
            core: Vec::new(),
        }
    }

    pub fn unsatisfiable(core: Vec<VariableId>) -> Self {
        Self {
            assignments: BTreeMap::new(),
            selected_bundles: Vec::new(),
            satisfiable: false,
            core,
        }
    }

    pub fn is_satisfiable(&self) -> bool {
        self.satisfiable
    }

    pub fn assignment(&self, id: &VariableId) -> Option<bool> {
        self.assignments.get(id).copied()
    }

    pub fn selected_bundles(&self) -> &[VariableId] {
        &self.selected_bundles
    }

    pub fn core(&self) -> &[VariableId] {
        &self.core
    }
}
