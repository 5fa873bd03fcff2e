//! The project aggregate: lifecycle state plus every artifact the workflow
//! attaches along the way. Transitions couple a state change with a typed
//! metadata payload, applied atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_types::{
    Constraints, DataProfile, LifecycleState, PipelineCandidate, Result, TrainingPlan,
    TrainingResult, ValidationIssue, WardenError,
};

use crate::state;

/// Typed payloads a transition may carry. Each variant stores into exactly
/// one project field; the variant must match the target state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionMetadata {
    Profile(DataProfile),
    ValidationErrors(Vec<ValidationIssue>),
    Constraints(Constraints),
    Candidates(Vec<PipelineCandidate>),
    SelectedPipeline(PipelineCandidate),
    TrainingPlan(TrainingPlan),
    TrainingResult(TrainingResult),
}

impl TransitionMetadata {
    fn variant_name(&self) -> &'static str {
        match self {
            TransitionMetadata::Profile(_) => "profile",
            TransitionMetadata::ValidationErrors(_) => "validation_errors",
            TransitionMetadata::Constraints(_) => "constraints",
            TransitionMetadata::Candidates(_) => "candidates",
            TransitionMetadata::SelectedPipeline(_) => "selected_pipeline",
            TransitionMetadata::TrainingPlan(_) => "training_plan",
            TransitionMetadata::TrainingResult(_) => "training_result",
        }
    }

    /// Which targets this payload may accompany.
    fn matches_target(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        match self {
            TransitionMetadata::Profile(_) => target == DatasetProfiled,
            TransitionMetadata::ValidationErrors(_) => {
                matches!(target, DatasetValidated | TrainingBlocked)
            }
            TransitionMetadata::Constraints(_) => target == ConstraintsValidated,
            TransitionMetadata::Candidates(_) => target == CandidatesGenerated,
            TransitionMetadata::SelectedPipeline(_) | TransitionMetadata::TrainingPlan(_) => {
                target == ExecutionApproved
            }
            TransitionMetadata::TrainingResult(_) => {
                matches!(target, TrainingCompleted | TrainingKilled)
            }
        }
    }
}

/// Result of a successful `transition_to` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state changed and any payload was stored.
    Applied,
    /// The target equals the current state; nothing was mutated.
    AlreadyCurrent,
}

/// The persisted project record. Serde round-trips losslessly so an external
/// storage collaborator can save and reload it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub id: Uuid,
    pub name: String,
    pub current_state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data_profile: Option<DataProfile>,
    pub validation_errors: Vec<ValidationIssue>,
    pub constraints: Option<Constraints>,
    pub candidates: Vec<PipelineCandidate>,
    pub selected_pipeline: Option<PipelineCandidate>,
    pub training_plan: Option<TrainingPlan>,
    pub training_result: Option<TrainingResult>,
}

impl ProjectState {
    /// A freshly created project starts in `DatasetUploaded`.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            current_state: LifecycleState::DatasetUploaded,
            created_at: now,
            updated_at: now,
            data_profile: None,
            validation_errors: Vec::new(),
            constraints: None,
            candidates: Vec::new(),
            selected_pipeline: None,
            training_plan: None,
            training_result: None,
        }
    }

    /// Pure pre-check used by page guards; never mutates.
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        state::can_transition(Some(self.current_state), target)
    }

    pub fn allowed_next_states(&self) -> &'static [LifecycleState] {
        state::allowed_next(Some(self.current_state))
    }

    /// Validation errors that block forward progress.
    pub fn blocking_errors(&self) -> Vec<&ValidationIssue> {
        self.validation_errors
            .iter()
            .filter(|e| e.is_blocking())
            .collect()
    }

    /// Move to `target`, storing `metadata` into the matching field.
    ///
    /// All checks run before any mutation: an invalid transition or a
    /// payload/target mismatch leaves the project bit-for-bit unchanged.
    /// Re-entering the current state succeeds without mutating; a payload on
    /// re-entry is rejected, since nothing would store it.
    pub fn transition_to(
        &mut self,
        target: LifecycleState,
        metadata: Option<TransitionMetadata>,
    ) -> Result<Transition> {
        if target == self.current_state {
            if let Some(payload) = metadata {
                return Err(WardenError::MetadataMismatch {
                    target,
                    payload: payload.variant_name().to_string(),
                });
            }
            return Ok(Transition::AlreadyCurrent);
        }
        if !self.can_transition_to(target) {
            return Err(WardenError::InvalidTransition {
                current: Some(self.current_state),
                target,
            });
        }
        if let Some(ref payload) = metadata {
            if !payload.matches_target(target) {
                return Err(WardenError::MetadataMismatch {
                    target,
                    payload: payload.variant_name().to_string(),
                });
            }
        }

        let from = self.current_state;
        self.current_state = target;
        self.updated_at = Utc::now();
        match metadata {
            Some(TransitionMetadata::Profile(profile)) => self.data_profile = Some(profile),
            Some(TransitionMetadata::ValidationErrors(errors)) => self.validation_errors = errors,
            Some(TransitionMetadata::Constraints(constraints)) => {
                self.constraints = Some(constraints)
            }
            Some(TransitionMetadata::Candidates(candidates)) => self.candidates = candidates,
            Some(TransitionMetadata::SelectedPipeline(pipeline)) => {
                self.selected_pipeline = Some(pipeline)
            }
            Some(TransitionMetadata::TrainingPlan(plan)) => self.training_plan = Some(plan),
            Some(TransitionMetadata::TrainingResult(result)) => {
                self.training_result = Some(result)
            }
            None => {}
        }
        tracing::info!(project = %self.id, %from, to = %target, "lifecycle transition");
        Ok(Transition::Applied)
    }
}
