//! Bijection between variable ids and the boolean literals the search
//! core works with, per spec.md §4.2. The search never sees a
//! `VariableId` directly; it only ever sees small integers.

use crate::variable::{Variable, VariableId};
use std::collections::BTreeMap;

/// A positive integer naming one boolean unknown. Literal `0` is never
/// issued; `Lit` values are always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(pub u32);

/// Frozen bijection from [`VariableId`] to [`Lit`], built once when a
/// resolution problem is assembled and never mutated afterward.
#[derive(Debug, Clone)]
pub struct LitMapping {
    id_to_lit: BTreeMap<VariableId, Lit>,
    lit_to_id: Vec<VariableId>,
}

impl LitMapping {
    /// Builds the mapping from an ordered list of variables. Order is
    /// preserved: the first variable gets `Lit(1)`, the second `Lit(2)`,
    /// and so on, matching the iteration order variable sources
    /// contributed them in.
    pub fn build(variables: &[Variable]) -> Self {
        let mut id_to_lit = BTreeMap::new();
        let mut lit_to_id = Vec::with_capacity(variables.len());
        for (idx, v) in variables.iter().enumerate() {
            let lit = Lit((idx + 1) as u32);
            id_to_lit.insert(v.id().clone(), lit);
            lit_to_id.push(v.id().clone());
        }
        Self {
            id_to_lit,
            lit_to_id,
        }
    }

    pub fn lit_of(&self, id: &VariableId) -> Option<Lit> {
        self.id_to_lit.get(id).copied()
    }

    pub fn id_of(&self, lit: Lit) -> Option<&VariableId> {
        self.lit_to_id.get((lit.0 - 1) as usize)
    }

    pub fn len(&self) -> usize {
        self.lit_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lit_to_id.is_empty()
    }

    pub fn lits(&self) -> impl Iterator<Item = Lit> + '_ {
        (1..=self.lit_to_id.len() as u32).map(Lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{MutableVariable, VariableKind};

    #[test]
    fn round_trips_ids() {
        let vars: Vec<Variable> = vec![
            MutableVariable::new("a", VariableKind::Bundle).freeze(),
            MutableVariable::new("b", VariableKind::Bundle).freeze(),
        ];
        let map = LitMapping::build(&vars);
        let lit_a = map.lit_of(&VariableId::from("a")).unwrap();
        assert_eq!(map.id_of(lit_a).unwrap(), &VariableId::from("a"));
        assert_eq!(map.len(), 2);
    }
}
