//! The revision lifecycle state machine, per spec.md §4.6. Grounded on
//! `clusterextensionrevision_types.go`'s invariants (revision-number
//! immutability and monotonic sequencing, phases immutability once set,
//! Archived as a one-way terminal state) and on the resolved Open
//! Question in SPEC_FULL.md §9 about releasing object ownership on
//! archive.

use crate::crd::{
    Condition, ConditionStatus, LifecycleState, CONDITION_TYPE_AVAILABLE, CONDITION_TYPE_PROGRESSING,
    CONDITION_TYPE_SUCCEEDED, REASON_ARCHIVED, REASON_MIGRATED, REASON_PROGRESSING, REASON_ROLLOUT_SUCCESS,
};
use crate::crd::{ClusterExtensionRevisionSpec, ClusterExtensionRevisionStatus, RevisionObject, RevisionPhase};
use crate::error::{self, Result};
use snafu::ensure;
use std::collections::HashSet;

/// An identity for an embedded object, used to decide which objects a
/// successor revision has taken ownership of.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl From<&RevisionObject> for ObjectRef {
    fn from(o: &RevisionObject) -> Self {
        ObjectRef {
            api_version: o.api_version.clone(),
            kind: o.kind.clone(),
            namespace: o.namespace.clone(),
            name: o.name.clone(),
        }
    }
}

/// The next revision number to use, given the revision numbers already
/// present for a `ClusterExtension` — `1` for the first revision,
/// otherwise one past the current maximum. Does not itself mutate
/// anything; callers validate a newly-constructed spec's `revision`
/// field against this before creating it.
pub fn next_revision_number(existing: &[i64]) -> i64 {
    existing.iter().copied().max().map(|n| n + 1).unwrap_or(1)
}

/// Validates that `candidate` is the correct next revision number given
/// `existing`, per spec.md §4.6's monotonic-sequence invariant.
pub fn validate_revision_sequence(existing: &[i64], candidate: i64) -> Result<()> {
    let expected = next_revision_number(existing);
    ensure!(
        candidate == expected,
        error::InvalidRevisionSequenceSnafu { expected, got: candidate }
    );
    Ok(())
}

/// A live `ClusterExtensionRevision`'s spec and status, wrapped with the
/// lifecycle transitions spec.md §4.6 allows.
#[derive(Debug, Clone)]
pub struct Revision {
    pub spec: ClusterExtensionRevisionSpec,
    pub status: ClusterExtensionRevisionStatus,
}

impl Revision {
    pub fn new(revision: i64, phases: Vec<RevisionPhase>) -> Self {
        Revision {
            spec: ClusterExtensionRevisionSpec {
                lifecycle_state: LifecycleState::Active,
                revision,
                phases,
            },
            status: ClusterExtensionRevisionStatus::default(),
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self.spec.lifecycle_state, LifecycleState::Archived)
    }

    fn ensure_not_archived(&self, attempted: &str) -> Result<()> {
        ensure!(
            !self.is_archived(),
            error::ArchivedIsTerminalSnafu { revision: self.spec.revision, attempted: attempted.to_string() }
        );
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure_not_archived("Paused")?;
        self.spec.lifecycle_state = LifecycleState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_not_archived("Active")?;
        self.spec.lifecycle_state = LifecycleState::Active;
        Ok(())
    }

    /// Archives this revision and drops every embedded object that a
    /// successor revision has taken ownership of — `successor_owned`
    /// holds the `ObjectRef`s the new revision now owns. Objects not in
    /// that set are left in place, since they may still be live and
    /// unowned by anything else (collision protection on the next
    /// rollout is what actually reconciles them away, not this step).
    /// Archived is terminal: archiving an already-archived revision is
    /// a no-op, not an error, so repeated reconcile passes stay
    /// idempotent.
    pub fn archive_and_release(&mut self, successor_owned: &HashSet<ObjectRef>) {
        if self.is_archived() {
            return;
        }
        self.spec.lifecycle_state = LifecycleState::Archived;
        for phase in &mut self.spec.phases {
            phase.objects.retain(|o| !successor_owned.contains(&ObjectRef::from(o)));
        }
        self.set_condition(CONDITION_TYPE_AVAILABLE, ConditionStatus::False, REASON_ARCHIVED, None);
        self.set_condition(CONDITION_TYPE_PROGRESSING, ConditionStatus::False, REASON_ARCHIVED, None);
    }

    /// Marks this revision as migrated — its workload has been handed
    /// off to a successor revision while this one remains archived.
    pub fn mark_migrated(&mut self) {
        self.set_condition(
            CONDITION_TYPE_AVAILABLE,
            ConditionStatus::Unknown,
            REASON_MIGRATED,
            Some("ownership transferred to a successor revision".to_string()),
        );
    }

    /// Records a fully rolled-out revision: `Available=True`,
    /// `Succeeded=True`, `Progressing=False`.
    pub fn mark_rollout_succeeded(&mut self) {
        self.set_condition(CONDITION_TYPE_AVAILABLE, ConditionStatus::True, REASON_ROLLOUT_SUCCESS, None);
        self.set_condition(CONDITION_TYPE_SUCCEEDED, ConditionStatus::True, REASON_ROLLOUT_SUCCESS, None);
        self.set_condition(CONDITION_TYPE_PROGRESSING, ConditionStatus::False, REASON_ROLLOUT_SUCCESS, None);
    }

    /// Records a rollout still in progress: `Progressing=True`,
    /// `Succeeded=False`.
    pub fn mark_progressing(&mut self) {
        self.set_condition(CONDITION_TYPE_PROGRESSING, ConditionStatus::True, REASON_PROGRESSING, None);
        self.set_condition(CONDITION_TYPE_SUCCEEDED, ConditionStatus::False, REASON_PROGRESSING, None);
    }

    fn set_condition(&mut self, type_: &str, status: ConditionStatus, reason: &str, message: Option<String>) {
        let condition = Condition { type_: type_.to_string(), status, reason: reason.to_string(), message };
        match self.status.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => *existing = condition,
            None => self.status.conditions.push(condition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_revision_is_one() {
        assert_eq!(next_revision_number(&[]), 1);
    }

    #[test]
    fn next_revision_is_one_past_the_max() {
        assert_eq!(next_revision_number(&[1, 2, 3]), 4);
    }

    #[test]
    fn out_of_sequence_revision_is_rejected() {
        assert!(validate_revision_sequence(&[1, 2], 4).is_err());
        assert!(validate_revision_sequence(&[1, 2], 3).is_ok());
    }

    #[test]
    fn archived_revision_rejects_further_transitions() {
        let mut r = Revision::new(1, vec![]);
        r.archive_and_release(&HashSet::new());
        assert!(r.pause().is_err());
        assert!(r.resume().is_err());
    }

    #[test]
    fn archiving_releases_only_successor_owned_objects() {
        let kept = RevisionObject {
            api_version: "v1".into(),
            kind: "ConfigMap".into(),
            name: "kept".into(),
            namespace: Some("ns".into()),
            labels: Default::default(),
            annotations: Default::default(),
            raw: serde_json::json!({}),
            collision_protection: Default::default(),
        };
        let mut released = kept.clone();
        released.name = "released".into();

        let mut r = Revision::new(1, vec![RevisionPhase { name: crate::phase::PhaseName::new("deploy").unwrap(), objects: vec![kept, released.clone()] }]);

        let mut owned = HashSet::new();
        owned.insert(ObjectRef::from(&released));
        r.archive_and_release(&owned);

        let remaining: Vec<&str> = r.spec.phases[0].objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(remaining, vec!["kept"]);
    }

    #[test]
    fn archiving_twice_is_idempotent() {
        let mut r = Revision::new(1, vec![]);
        r.archive_and_release(&HashSet::new());
        r.archive_and_release(&HashSet::new());
        assert!(r.is_archived());
    }
}
