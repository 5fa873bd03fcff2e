//! Feasibility layer: the static eligibility matrix, the policy engine that
//! decides which constraints bind hard, candidate generation, and the hard
//! constraint filter.
//!
//! The flow is `generate_policy` → `generate_candidates` → filter, with the
//! matrix consulted for eligibility and per-family resource estimates.

pub mod candidates;
pub mod filter;
pub mod matrix;
pub mod policy;

pub use candidates::{generate_candidates, DesignOutcome};
pub use filter::{check_candidate, filter_candidates, relaxation_suggestions};
pub use matrix::{
    catalog, components_for, eligible_families, estimate_resources, FamilyEstimate, ModelProfile,
};
pub use policy::{generate_policy, FeasibilityPolicy};
