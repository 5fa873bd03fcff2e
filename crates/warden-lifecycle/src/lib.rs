//! Lifecycle layer: the fixed transition table, the `ProjectState` aggregate
//! with atomic transition-plus-payload semantics, the registry seam, and the
//! advisory page-access map.

pub mod pages;
pub mod project;
pub mod registry;
pub mod state;

pub use pages::{check_page_access, required_state, PageAccess};
pub use project::{ProjectState, Transition, TransitionMetadata};
pub use registry::{InMemoryProjectRegistry, ProjectRegistry};
pub use state::{allowed_next, can_transition, is_terminal};
