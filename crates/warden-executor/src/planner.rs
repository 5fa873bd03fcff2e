//! Training planner: turns a row count, epoch budget, and model family into a
//! resource estimate and checks it against the project's stored constraints.

use warden_feasibility::matrix;
use warden_types::{
    Constraints, ModelFamily, ResourceEstimate, TrainingPlan, ValidationIssue,
};

/// Reference workload: estimates scale linearly above this row count.
const REFERENCE_ROWS: f64 = 10_000.0;

/// Estimate the footprint of training `family` for `epochs` over `rows`.
/// Deterministic: derived entirely from the static catalog.
pub fn estimate_training(rows: u64, epochs: u32, family: ModelFamily) -> ResourceEstimate {
    let profile = matrix::profile(family);
    let scale = (rows as f64 / REFERENCE_ROWS).max(1.0) * epochs.max(1) as f64;
    ResourceEstimate {
        cost_usd: profile.cost_per_run * scale,
        carbon_kg: profile.carbon_per_run * scale,
        duration_ms: (profile.latency_ms as f64 * scale) as u64,
        memory_mb: profile.model_size_mb as f64 * 2.0 + rows as f64 / 1_000.0,
    }
}

/// Build a plan and collect blocking violations against the constraints.
/// An empty violation list means the plan is approvable.
pub fn plan_training(
    rows: u64,
    epochs: u32,
    family: ModelFamily,
    constraints: &Constraints,
) -> (TrainingPlan, Vec<ValidationIssue>) {
    let estimate = estimate_training(rows, epochs, family);
    let mut violations = Vec::new();

    if estimate.cost_usd > constraints.max_cost_usd {
        violations.push(ValidationIssue {
            code: "BLOCK_COST".into(),
            message: format!(
                "estimated training cost ${:.2} exceeds budget ${:.2}",
                estimate.cost_usd, constraints.max_cost_usd
            ),
            action: "reduce epochs or rows, or raise max_cost_usd".into(),
        });
    }
    if estimate.carbon_kg > constraints.max_carbon_kg {
        violations.push(ValidationIssue {
            code: "BLOCK_CARBON".into(),
            message: format!(
                "estimated training carbon {:.3} kg exceeds budget {:.3} kg",
                estimate.carbon_kg, constraints.max_carbon_kg
            ),
            action: "reduce epochs or rows, or raise max_carbon_kg".into(),
        });
    }

    let plan = TrainingPlan {
        rows,
        epochs,
        model_family: family,
        estimate,
    };
    tracing::debug!(
        family = %family,
        rows,
        epochs,
        violations = violations.len(),
        "planned training run"
    );
    (plan, violations)
}
