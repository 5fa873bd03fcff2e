//! Page-access map: which lifecycle state a UI page requires. Purely
//! advisory; the state machine itself never consults this.

use serde::{Deserialize, Serialize};
use warden_types::LifecycleState;

use crate::project::ProjectState;

static PAGE_MAP: &[(&str, LifecycleState)] = &[
    ("/datasets/new", LifecycleState::DatasetUploaded),
    ("/datasets/profile", LifecycleState::DatasetProfiled),
    ("/datasets/validate", LifecycleState::DatasetValidated),
    ("/design/constraints", LifecycleState::ConstraintsValidated),
    ("/design/results", LifecycleState::CandidatesGenerated),
    ("/train/confirm", LifecycleState::ExecutionApproved),
    ("/train/running", LifecycleState::TrainingRunning),
    ("/train/result", LifecycleState::TrainingCompleted),
];

/// The state a page requires, or `None` for unmapped pages.
pub fn required_state(page: &str) -> Option<LifecycleState> {
    PAGE_MAP
        .iter()
        .find(|(p, _)| *p == page)
        .map(|(_, state)| *state)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAccess {
    pub allowed: bool,
    pub current_state: LifecycleState,
    pub required_state: Option<LifecycleState>,
}

/// A page is accessible when the project is already in the required state or
/// could transition into it next. Unmapped pages are always accessible.
pub fn check_page_access(project: &ProjectState, page: &str) -> PageAccess {
    let required = required_state(page);
    let allowed = match required {
        None => true,
        Some(state) => project.current_state == state || project.can_transition_to(state),
    };
    PageAccess {
        allowed,
        current_state: project.current_state,
        required_state: required,
    }
}
