//! The SAT search core, per spec.md §4.2. Constraints are compiled once
//! into CNF clauses; the search then alternates **assume → propagate →
//! extend or backtrack** through a narrow `Test`/`Untest` interface, so a
//! mature external SAT core could be substituted behind the same
//! boundary (Design Notes §9, "SAT integration").
//!
//! This implementation hand-rolls the core rather than linking an
//! external SAT crate: none of the example repos in this workspace's
//! lineage depend on one, and the search is explicitly specified as
//! sitting behind a narrow interface precisely so a fuller one can be
//! swapped in later without touching callers.

use crate::error::{self, Error, Result};
use crate::problem::{ResolutionProblem, Solution};
use olm_entity::{Constraint, LitMapping, VariableId, VariableKind};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome of a single `Test` call. This implementation always fully
/// propagates before returning, so it never reports `Unknown` — the
/// variant exists to keep the public shape of the narrow interface the
/// spec describes, for an external core that reports partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Satisfiable,
    Contradictory,
    Unknown,
}

/// Minimal DPLL-style boolean core: a clause database, a trail of
/// assigned literals, and a stack of trail marks — one per open `Test`
/// scope. `Untest` always pops back to the most recent mark.
struct SatCore {
    clauses: Vec<Vec<i32>>,
    assignment: Vec<Option<bool>>,
    trail: Vec<i32>,
    marks: Vec<usize>,
}

impl SatCore {
    fn new(num_vars: usize, clauses: Vec<Vec<i32>>) -> Self {
        Self {
            clauses,
            assignment: vec![None; num_vars],
            trail: Vec::new(),
            marks: Vec::new(),
        }
    }

    fn value_of(&self, lit: i32) -> Option<bool> {
        let idx = (lit.unsigned_abs() - 1) as usize;
        self.assignment[idx].map(|v| if lit > 0 { v } else { !v })
    }

    /// Assigns `lit` if unassigned. Returns `false` if `lit` conflicts
    /// with an existing assignment.
    fn assign(&mut self, lit: i32) -> bool {
        let idx = (lit.unsigned_abs() - 1) as usize;
        let want = lit > 0;
        match self.assignment[idx] {
            Some(v) => v == want,
            None => {
                self.assignment[idx] = Some(want);
                self.trail.push(lit);
                true
            }
        }
    }

    /// Unit propagation to a fixpoint. Returns `false` on conflict
    /// (some clause has every literal false).
    fn propagate(&mut self) -> bool {
        loop {
            let mut changed = false;
            for clause in &self.clauses {
                let mut satisfied = false;
                let mut unassigned_count = 0;
                let mut last_unassigned = 0;
                for &lit in clause {
                    match self.value_of(lit) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            unassigned_count += 1;
                            last_unassigned = lit;
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                if unassigned_count == 0 {
                    return false;
                }
                if unassigned_count == 1 {
                    if !self.assign(last_unassigned) {
                        return false;
                    }
                    changed = true;
                }
            }
            if !changed {
                return true;
            }
        }
    }

    /// Asserts a literal permanently, outside any `Test` scope. Used for
    /// `Mandatory`/`Prohibited` unit clauses, which hold unconditionally.
    fn assert_base(&mut self, lit: i32) -> bool {
        self.assign(lit)
    }

    fn test(&mut self, assumptions: &[i32]) -> TestOutcome {
        let mark = self.trail.len();
        let mut ok = true;
        for &lit in assumptions {
            if !self.assign(lit) {
                ok = false;
                break;
            }
        }
        if ok {
            ok = self.propagate();
        }
        if !ok {
            self.rollback_to(mark);
            return TestOutcome::Contradictory;
        }
        self.marks.push(mark);
        TestOutcome::Satisfiable
    }

    fn untest(&mut self) -> usize {
        if let Some(mark) = self.marks.pop() {
            self.rollback_to(mark);
        }
        self.marks.len()
    }

    fn rollback_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let lit = self.trail.pop().expect("trail longer than mark");
            let idx = (lit.unsigned_abs() - 1) as usize;
            self.assignment[idx] = None;
        }
    }

    fn depth(&self) -> usize {
        self.marks.len()
    }
}

fn combinations(items: &[i32], k: usize) -> Vec<Vec<i32>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out = Vec::new();
    for i in 0..=items.len() - k {
        for rest in combinations(&items[i + 1..], k - 1) {
            let mut combo = vec![items[i]];
            combo.extend(rest);
            out.push(combo);
        }
    }
    out
}

fn build_core(problem: &ResolutionProblem, lits: &LitMapping) -> Result<SatCore> {
    let mut base_units = Vec::new();
    let mut clauses = Vec::new();

    for v in problem.variables() {
        let vlit = lits.lit_of(v.id()).expect("every variable has a literal").0 as i32;
        for c in v.constraints() {
            match c {
                Constraint::Mandatory => base_units.push(vlit),
                Constraint::Prohibited => base_units.push(-vlit),
                Constraint::Dependency { of } => {
                    let mut clause = vec![-vlit];
                    for o in of {
                        if let Some(l) = lits.lit_of(o) {
                            clause.push(l.0 as i32);
                        }
                    }
                    clauses.push(clause);
                }
                Constraint::Conflict { with } => {
                    for w in with {
                        if let Some(l) = lits.lit_of(w) {
                            clauses.push(vec![-vlit, -(l.0 as i32)]);
                        }
                    }
                }
                Constraint::AtMost { of, max } => {
                    let of_lits: Vec<i32> = of.iter().filter_map(|o| lits.lit_of(o)).map(|l| l.0 as i32).collect();
                    if *max == 0 {
                        for l in &of_lits {
                            clauses.push(vec![-l]);
                        }
                    } else if *max < of_lits.len() {
                        for combo in combinations(&of_lits, max + 1) {
                            clauses.push(combo.iter().map(|l| -l).collect());
                        }
                    }
                }
            }
        }
    }

    let mut core = SatCore::new(lits.len(), clauses);
    for lit in base_units {
        if !core.assert_base(lit) {
            return error::MalformedConstraintSnafu {
                variable: lits.id_of(olm_entity::Lit(lit.unsigned_abs())).map(|id| id.to_string()).unwrap_or_default(),
                reason: "conflicting Mandatory/Prohibited base assertions".to_string(),
            }
            .fail()
            .map_err(Error::from);
        }
    }
    if !core.propagate() {
        return error::MalformedConstraintSnafu {
            variable: String::new(),
            reason: "base unit clauses are unsatisfiable".to_string(),
        }
        .fail()
        .map_err(Error::from);
    }
    Ok(core)
}

/// Dependency constraints still owed by the variables already assumed
/// true, flattened in the order their owning variables were processed.
type Frontier = Vec<Vec<VariableId>>;

fn dependency_frontier(problem: &ResolutionProblem, var_id: &VariableId) -> Frontier {
    problem
        .variable(var_id)
        .into_iter()
        .flat_map(|v| v.constraints().iter())
        .filter_map(|c| match c {
            Constraint::Dependency { of } => Some(of.clone()),
            _ => None,
        })
        .collect()
}

fn resolve_variable(
    core: &mut SatCore,
    var_id: &VariableId,
    problem: &ResolutionProblem,
    lits: &LitMapping,
    selected: &mut Vec<VariableId>,
    cancelled: &mut dyn FnMut() -> bool,
) -> bool {
    if cancelled() {
        return false;
    }
    let deps = dependency_frontier(problem, var_id);
    resolve_dependency_list(core, &deps, 0, problem, lits, selected, cancelled)
}

fn resolve_dependency_list(
    core: &mut SatCore,
    deps: &Frontier,
    idx: usize,
    problem: &ResolutionProblem,
    lits: &LitMapping,
    selected: &mut Vec<VariableId>,
    cancelled: &mut dyn FnMut() -> bool,
) -> bool {
    if idx == deps.len() {
        return true;
    }
    if cancelled() {
        return false;
    }
    for cand_id in &deps[idx] {
        let lit = match lits.lit_of(cand_id) {
            Some(l) => l.0 as i32,
            None => continue,
        };
        let depth_before = core.depth();
        let selected_len_before = selected.len();
        match core.test(&[lit]) {
            TestOutcome::Contradictory => continue,
            _ => {
                selected.push(cand_id.clone());
                if resolve_variable(core, cand_id, problem, lits, selected, cancelled)
                    && resolve_dependency_list(core, deps, idx + 1, problem, lits, selected, cancelled)
                {
                    return true;
                }
                while core.depth() > depth_before {
                    core.untest();
                }
                selected.truncate(selected_len_before);
            }
        }
    }
    false
}

/// Runs the search to completion. `cancel` resolves once the caller's
/// deadline passes; it's polled (never awaited) at every assume/backtrack
/// boundary, so this function itself stays synchronous.
pub fn solve<C>(problem: &ResolutionProblem, cancel: C) -> Result<Solution>
where
    C: Future<Output = ()> + Unpin,
{
    let lits = problem.lits();
    let mut core = build_core(problem, lits)?;

    let mut cancel = cancel;
    let waker = futures::task::noop_waker();
    let mut cancelled = move || {
        let mut cx = Context::from_waker(&waker);
        matches!(Pin::new(&mut cancel).poll(&mut cx), Poll::Ready(()))
    };

    let anchor_deps: Frontier = problem
        .anchors()
        .iter()
        .flat_map(|a| dependency_frontier(problem, a))
        .collect();

    let mut selected = Vec::new();
    let ok = resolve_dependency_list(&mut core, &anchor_deps, 0, problem, lits, &mut selected, &mut cancelled);

    debug_assert!(core.depth() <= anchor_deps.len() + selected.len());

    if !ok {
        while core.depth() > 0 {
            core.untest();
        }
        if cancelled() {
            return error::CancelledSnafu.fail().map_err(Error::from);
        }
        let core_ids: Vec<String> = anchor_deps.iter().flatten().map(|id| id.to_string()).collect();
        return error::UnsatisfiableSnafu { core: core_ids }.fail().map_err(Error::from);
    }

    let mut assignments = BTreeMap::new();
    for v in problem.variables() {
        if let Some(lit) = lits.lit_of(v.id()) {
            if let Some(value) = core.value_of(lit.0 as i32) {
                assignments.insert(v.id().clone(), value);
            }
        }
    }

    let selected_bundles = selected
        .into_iter()
        .filter(|id| matches!(problem.variable(id).map(|v| v.kind()), Some(VariableKind::Bundle)))
        .collect();

    while core.depth() > 0 {
        core.untest();
    }

    Ok(Solution::satisfiable(assignments, selected_bundles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Builder;
    use olm_entity::{Constraint, MutableVariable, VariableKind};
    use std::future::pending;

    fn bundle(id: &str) -> MutableVariable {
        MutableVariable::new(id, VariableKind::Bundle)
    }

    #[test]
    fn chooses_newest_when_dependency_order_prefers_it() {
        let mut b = Builder::new();
        let mut req = MutableVariable::new("required-package/p", VariableKind::RequiredPackage);
        req.add_constraint(Constraint::Mandatory);
        req.add_constraint(Constraint::Dependency {
            of: vec!["bundle/p@2.0.0".into(), "bundle/p@1.0.0".into()],
        });
        b.activate(req);
        b.activate(bundle("bundle/p@2.0.0"));
        b.activate(bundle("bundle/p@1.0.0"));
        let problem = b.build();

        let solution = solve(&problem, std::future::ready(())).unwrap();
        assert_eq!(solution.selected_bundles(), &["bundle/p@2.0.0".into()]);
    }

    #[test]
    fn backtracks_when_first_candidate_conflicts() {
        let mut b = Builder::new();
        let mut req = MutableVariable::new("required-package/p", VariableKind::RequiredPackage);
        req.add_constraint(Constraint::Mandatory);
        req.add_constraint(Constraint::Dependency {
            of: vec!["bundle/p@2.0.0".into(), "bundle/p@1.0.0".into()],
        });
        b.activate(req);
        let mut bad = bundle("bundle/p@2.0.0");
        bad.add_constraint(Constraint::Prohibited);
        b.activate(bad);
        b.activate(bundle("bundle/p@1.0.0"));
        let problem = b.build();

        let solution = solve(&problem, std::future::ready(())).unwrap();
        assert_eq!(solution.selected_bundles(), &["bundle/p@1.0.0".into()]);
    }

    #[test]
    fn gvk_uniqueness_conflict_is_unsatisfiable() {
        let mut b = Builder::new();

        let mut req1 = MutableVariable::new("required-package/p1", VariableKind::RequiredPackage);
        req1.add_constraint(Constraint::Mandatory);
        req1.add_constraint(Constraint::Dependency {
            of: vec!["bundle/b1".into()],
        });
        b.activate(req1);

        let mut req2 = MutableVariable::new("required-package/p2", VariableKind::RequiredPackage);
        req2.add_constraint(Constraint::Mandatory);
        req2.add_constraint(Constraint::Dependency {
            of: vec!["bundle/b2".into()],
        });
        b.activate(req2);

        b.activate(bundle("bundle/b1"));
        b.activate(bundle("bundle/b2"));

        let mut uniq = MutableVariable::new("gvk-uniqueness/g:v:K", VariableKind::GvkUniqueness);
        uniq.add_constraint(Constraint::AtMost {
            of: vec!["bundle/b1".into(), "bundle/b2".into()],
            max: 1,
        });
        b.activate(uniq);

        let problem = b.build();
        let err = solve(&problem, pending()).unwrap_err();
        assert!(err.unsatisfiable_core().is_some());
    }

    #[test]
    fn scope_depth_returns_to_zero_on_success_and_failure() {
        let mut b = Builder::new();
        let mut req = MutableVariable::new("required-package/p", VariableKind::RequiredPackage);
        req.add_constraint(Constraint::Mandatory);
        req.add_constraint(Constraint::Dependency {
            of: vec!["bundle/p@1.0.0".into()],
        });
        b.activate(req);
        b.activate(bundle("bundle/p@1.0.0"));
        let problem = b.build();
        let lits = problem.lits();
        let mut core = build_core(&problem, lits).unwrap();
        let mut cancelled = || false;
        let deps: Frontier = problem.anchors().iter().flat_map(|a| dependency_frontier(&problem, a)).collect();
        let mut selected = Vec::new();
        assert!(resolve_dependency_list(&mut core, &deps, 0, &problem, lits, &mut selected, &mut cancelled));
        while core.depth() > 0 {
            core.untest();
        }
        assert_eq!(core.depth(), 0);
    }
}
