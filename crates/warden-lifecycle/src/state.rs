//! The fixed transition table, kept as static data so it stays auditable.

use warden_types::LifecycleState;

use LifecycleState::*;

/// Allowed next states for a project that has a current state.
/// A brand-new project (no state yet) may only enter `DatasetUploaded`.
pub fn allowed_next(state: Option<LifecycleState>) -> &'static [LifecycleState] {
    match state {
        None => &[DatasetUploaded],
        Some(DatasetUploaded) => &[DatasetProfiled],
        Some(DatasetProfiled) => &[DatasetValidated, DatasetUploaded],
        Some(DatasetValidated) => &[ConstraintsValidated],
        Some(ConstraintsValidated) => &[FeasibilityApproved, DatasetProfiled],
        Some(FeasibilityApproved) => &[CandidatesGenerated],
        Some(CandidatesGenerated) => &[ExecutionApproved, TrainingBlocked],
        Some(ExecutionApproved) => &[TrainingRunning],
        Some(TrainingRunning) => &[TrainingCompleted, TrainingKilled],
        Some(TrainingCompleted) => &[],
        Some(TrainingBlocked) => &[DatasetUploaded],
        Some(TrainingKilled) => &[DatasetUploaded],
    }
}

/// Whether `target` is reachable from `state` in one step.
pub fn can_transition(state: Option<LifecycleState>, target: LifecycleState) -> bool {
    allowed_next(state).contains(&target)
}

/// Terminal states have no outgoing edges.
pub fn is_terminal(state: LifecycleState) -> bool {
    allowed_next(Some(state)).is_empty()
}
